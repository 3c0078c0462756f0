#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutnameError {
    #[error("unsupported hash algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("invalid digest encoding: {encoding}")]
    InvalidEncoding { encoding: String },

    #[error("no content available to resolve token '{token}'")]
    InvalidContent { token: String },

    #[error("invalid parameters: {message}")]
    InvalidParameters { message: String },
}

pub type Result<T> = std::result::Result<T, OutnameError>;
