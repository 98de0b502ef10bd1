#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid URI: {message}")]
    InvalidUri { message: String },

    #[error("not found: {uri}")]
    NotFound { uri: String },

    #[error("HTTP status {status} for {uri}")]
    Status { status: u16, uri: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("markup parse error: {message}")]
    Parse { message: String },

    #[error("not a directory: {uri}")]
    NotADirectory { uri: String },

    #[error("not a bundleable document: {uri}")]
    NotBundleable { uri: String },
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::InvalidUri {
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Transport {
            message: error.to_string(),
        }
    }
}
