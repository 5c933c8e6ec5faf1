use std::io;

/// Errors reported by this crate.
///
/// Access violations are deliberately missing: reading or writing protected
/// memory in a way its protection forbids terminates the process instead of
/// returning an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller passed something that can never work, e.g. a salt of the
    /// wrong size or an unknown strength level.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Password derivation could not obtain its working memory.
    #[error("key derivation could not allocate its working memory")]
    ResourceExhausted,

    /// The OS could not provide guarded pages.
    #[error("cannot allocate guarded memory: {0}")]
    OutOfMemory(#[source] io::Error),

    /// The OS refused to change the protection of guarded pages.
    #[error("cannot change memory protection: {0}")]
    Protection(#[source] io::Error),

    /// The OS random number generator failed.
    #[error("random number generator failure: {0}")]
    Random(#[from] rand::Error),

    /// Authentication failed or a ciphertext has an impossible size.
    #[error("verification failed")]
    Verification,
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
