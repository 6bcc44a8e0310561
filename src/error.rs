use thiserror::Error;

/// Engine-local error kinds (spec.md §7). Every variant is surfaced to the
/// Host as a `.error` op carrying [`Error::wire_message`]; none are retried
/// internally.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("no such object")]
    NoSuchObject,

    #[error("have state already")]
    HaveState,

    #[error("op is out of order")]
    OutOfOrder,

    #[error("base is unparseable")]
    BaseUnparseable,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("not implemented")]
    NotImplemented,
}

impl Error {
    /// Renders the short, newline-stripped message carried by a `.error`
    /// op (spec.md §7: "a short string (newline-stripped, <= 50 chars)").
    pub fn wire_message(&self) -> String {
        self.to_string().replace(['\n', '\r'], " ").chars().take(50).collect()
    }
}

impl From<crate::encoding::Error> for Error {
    fn from(e: crate::encoding::Error) -> Self {
        Error::Parse(e.0)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
