use core::{error::Error as StdError, fmt::Display};

use itertools::Itertools as _;

pub trait ApiError: StdError + Sized + 'static {
    // `StdError::sources` is not stable yet.
    fn sources(&self) -> impl Iterator<Item = &dyn StdError> {
        let mut error: Option<&dyn StdError> = Some(self);

        core::iter::from_fn(move || {
            let source = error?.source();
            core::mem::replace(&mut error, source)
        })
    }

    // Messages generated by `thiserror` do not include sources, even with the alternate flag.
    fn format_sources(&self) -> impl Display + '_ {
        self.sources().format(": ")
    }
}
