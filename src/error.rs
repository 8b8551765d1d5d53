use std::fmt;

use thiserror::Error;

use crate::types::ChunkedUpload;

pub type Result<T> = std::result::Result<T, Error>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request failed : {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("decoding failed : {0}")]
    Decode(#[from] DecodeError),
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("invalid url : {0}")]
    Url(#[from] url::ParseError),
    /// The server rejected a chunk but still reported the upload state it
    /// expects, typically the offset to resume from.
    #[error("chunked upload rejected : {error}")]
    UploadOffsetMismatch {
        state: ChunkedUpload,
        error: ApiError,
    },
}

impl Error {
    /// The HTTP status reported by the API, if this error came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(e) | Error::UploadOffsetMismatch { error: e, .. } => Some(e.code),
            Error::Authorization(_) => Some(401),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// An error body returned by the API together with the HTTP status code.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[error("Dropbox API Error({code}): {message}")]
pub struct ApiError {
    #[serde(skip)]
    pub code: u16,
    #[serde(rename = "error", default)]
    pub message: String,
}

impl ApiError {
    pub fn new<T: Into<String>>(code: u16, message: T) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

/// Raised when the server answers `401 Unauthorized`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationError {
    /// The request path without its API version segment, e.g. `account/info`.
    pub context: String,
    pub cause: Option<String>,
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            Some(ref cause) => write!(f, "Authorization Error ({}): {}", self.context, cause),
            None => write!(f, "Authorization Error ({})", self.context),
        }
    }
}

/// Local precondition violations. These are usage errors, never network faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("session not authorized")]
    NotAuthorized,
    #[error("no request token")]
    NoRequestToken,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed json : {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp {0:?} : {1}")]
    Timestamp(String, chrono::ParseError),
    #[error("metadata header is not valid text : {0}")]
    Header(#[from] http::header::ToStrError),
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("response is not form encoded: {0}")]
    Malformed(#[from] serde_urlencoded::de::Error),
}
