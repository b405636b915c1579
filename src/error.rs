use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification used to decide how a failure reaches the user:
/// validation and generation failures get a modal dialog, file operations
/// get a transient status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Service,
    Io,
    Validation,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Service(String),
    #[error("{0}")]
    Validation(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode/encode error: {0}")]
    Image(#[from] image::ImageError),
}

impl AppError {
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config(message.into())
    }

    pub fn service<T: Into<String>>(message: T) -> Self {
        Self::Service(message.into())
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Io,
            // Anything that went wrong talking to or decoding from the service.
            Self::Service(_)
            | Self::Http(_)
            | Self::Serde(_)
            | Self::Base64(_)
            | Self::Image(_) => ErrorKind::Service,
        }
    }
}
