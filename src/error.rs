use thiserror::Error as ThisError;

/// Main error type for the library.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Missing or unreadable input, empty point sets, or a logically invalid parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The file extension is not in the reader table.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Numerical degeneracy while fitting or evaluating an alignment.
    #[error("Registration error: {0}")]
    Registration(String),
    #[error("Parser error: {0}")]
    Parser(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a error with the kind `InvalidInput`.
    /// # Arguments
    /// * `msg` - The error message.
    pub fn invalid_input<T: ToString>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Create a error with the kind `Registration`.
    pub fn registration<T: ToString>(msg: T) -> Self {
        Error::Registration(msg.to_string())
    }

    pub fn parser<T: ToString>(msg: T) -> Self {
        Error::Parser(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
