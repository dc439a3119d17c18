use std::io;

use thiserror::Error;

/// Errors reported by [`Resource`] operations.
///
/// `InvalidState` is a local precondition violation (the resource holds no
/// descriptor, or was already closed) and is never worth retrying. The
/// remaining variants wrap the failing OS primitive and carry the platform
/// error code through their [`source`].
///
/// [`Resource`]: crate::Resource
/// [`source`]: std::error::Error::source
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The resource is empty (or already closed) and the operation needs a
    /// descriptor.
    #[error("resource holds no descriptor")]
    InvalidState,
    /// Creating the per-wait wakeup pipe failed.
    #[error("failed to create the wakeup pipe")]
    Pipe(#[source] io::Error),
    /// The underlying `poll(2)` call failed.
    #[error("poll failed")]
    Poll(#[source] io::Error),
    /// Releasing the descriptor failed.
    #[error("failed to close the descriptor")]
    Close(#[source] io::Error),
    /// Changing descriptor flags failed.
    #[error("fcntl failed")]
    Fcntl(#[source] io::Error),
}

impl Error {
    /// The raw platform error code of the failing primitive, when there is
    /// one. `InvalidState` has no OS-level cause and yields `None`.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::InvalidState => None,
            Error::Pipe(e) | Error::Poll(e) | Error::Close(e) | Error::Fcntl(e) => {
                e.raw_os_error()
            }
        }
    }
}

/// Shorthand for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;
