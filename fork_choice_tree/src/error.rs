use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum Error {
    #[error("proto array is empty")]
    EmptyProtoArray,
    #[error("proto array has no node without a parent")]
    MissingAnchor,
    #[error("node {index} refers to parent {parent} outside of proto array of length {length}")]
    ParentIndexOutOfBounds {
        index: usize,
        parent: usize,
        length: usize,
    },
    #[error("node {index} is its own parent")]
    SelfParent { index: usize },
    #[error("node {index} has slot {slot:?} that is not a decimal integer")]
    InvalidSlot { index: usize, slot: String },
}
