use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Low-level parse failure: a malformed spec token, a truncated scan
/// key, or similar. Carries a short human-readable message; callers that
/// need a typed reason match on [`crate::Error`] instead, which wraps this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Error(pub String);

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {}
