use std::io;

/// Errors raised by [`crate::PrefixWriter`] itself. Failures of the
/// underlying writer are passed through untouched and never wrapped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The sink shared by a nesting chain was already borrowed, which
    /// only happens when a write re-enters the same chain.
    #[error("sink is already in use by another prefix writer of the same chain")]
    SinkBusy,
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::other(err)
    }
}
