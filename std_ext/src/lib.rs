use std::sync::Arc;

use easy_ext::ext;

#[ext(ArcExt)]
pub impl<T: ?Sized> Arc<T> {
    #[must_use]
    fn clone_arc(&self) -> Self {
        Self::clone(self)
    }
}

#[ext(DefaultExt)]
pub impl<T: PartialEq + Default> T {
    fn is_default(&self) -> bool {
        *self == T::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_arc_shares_allocation() {
        let original = Arc::new(5);
        let clone = original.clone_arc();

        assert!(Arc::ptr_eq(&original, &clone));
    }

    #[test]
    fn is_default() {
        assert!(0_usize.is_default());
        assert!(!1_usize.is_default());
        assert!(String::new().is_default());
    }
}
