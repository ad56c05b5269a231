use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// No signing secret was provided at boot. Fatal: the process must not
    /// serve requests without one.
    #[error("signing secret is not configured")]
    MissingSigningSecret,

    #[error("signing secret must be at least {minimum} bytes")]
    WeakSigningSecret { minimum: usize },

    #[error("malformed QR payload: {0}")]
    MalformedQrPayload(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
