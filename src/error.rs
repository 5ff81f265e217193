use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("'{0}' is required and must not be empty.")]
    MissingField(&'static str),

    #[error("Invalid date format '{0}', expected YYYY-MM-DD.")]
    InvalidDateFormat(String),

    #[error("Invalid value '{value}' for query parameter '{name}'.")]
    InvalidQueryParameter { name: &'static str, value: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Post with id {0} not found.")]
    NotFound(u64),

    #[error("Post with id {0} not found.")]
    InvalidPostId(String),

    #[error("No post id left after {0}.")]
    IdsExhausted(u64),

    #[error("Error writing to the posts file {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BlogError>;
