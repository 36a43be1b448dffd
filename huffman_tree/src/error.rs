//! Error type of the library.

use thiserror::Error;

/// Failure of an encoding or decoding operation.
#[derive(Error, Debug)]
pub enum Error {
    /// An artifact cannot be opened, read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frequency table cannot be turned into a Huffman tree.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String
    },

    /// The input does not match the code table built for it.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the problem
        message: String
    },

    /// The encoded stream or the frequency artifact is malformed.
    #[error("Decoding error: {message}")]
    Decoding {
        /// Description of the problem
        message: String
    },
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding { message: message.into() }
    }

    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding { message: message.into() }
    }
}

/// Result of the library operations.
pub type Result<T> = std::result::Result<T, Error>;
