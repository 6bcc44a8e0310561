//! Parsing and rendering for the dotted spec grammar (spec.md §6): a spec
//! string is a concatenation of sigil-tagged tokens `{bare}[+ {ext}]`, where
//! the sigil is one of `/ # ! .`. An object's own key is the `/Type#Id`
//! prefix; everything after it is a record's key suffix.

use crate::encoding::Error as EncodingError;
use crate::version::Version;
use std::fmt;

pub const SIGIL_TYPE: char = '/';
pub const SIGIL_ID: char = '#';
pub const SIGIL_VERSION: char = '!';
pub const SIGIL_OP: char = '.';

fn is_sigil(c: char) -> bool {
    matches!(c, '/' | '#' | '!' | '.')
}

fn is_body_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '~'
}

/// One `{sigil}{bare}[+{ext}]` token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub sigil: char,
    pub bare: String,
    pub ext: Option<String>,
}

impl Token {
    pub fn render(&self) -> String {
        match &self.ext {
            Some(ext) => format!("{}{}+{}", self.sigil, self.bare, ext),
            None => format!("{}{}", self.sigil, self.bare),
        }
    }
}

/// A fully parsed spec string: an ordered sequence of tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spec {
    tokens: Vec<Token>,
}

impl Spec {
    pub fn parse(input: &str) -> Result<Self, EncodingError> {
        if input.is_empty() {
            return Ok(Spec::default());
        }
        if !input.starts_with(is_sigil) {
            return Err(EncodingError(format!("spec must start with a sigil: {input:?}")));
        }
        let mut bounds = vec![0usize];
        for (i, c) in input.char_indices() {
            if i > 0 && is_sigil(c) {
                bounds.push(i);
            }
        }
        bounds.push(input.len());

        let mut tokens = Vec::with_capacity(bounds.len() - 1);
        for w in bounds.windows(2) {
            tokens.push(Self::parse_token(&input[w[0]..w[1]])?);
        }
        Ok(Spec { tokens })
    }

    fn parse_token(chunk: &str) -> Result<Token, EncodingError> {
        let mut chars = chunk.chars();
        let sigil = chars.next().ok_or_else(|| EncodingError("empty token".into()))?;
        let body = &chunk[sigil.len_utf8()..];
        if body.is_empty() {
            return Err(EncodingError(format!("token {chunk:?} has an empty body")));
        }
        let (bare, ext) = match body.split_once('+') {
            Some((b, e)) => (b.to_string(), Some(e.to_string())),
            None => (body.to_string(), None),
        };
        if bare.is_empty() || !bare.chars().all(is_body_char) {
            return Err(EncodingError(format!("token {chunk:?} has an invalid body")));
        }
        if let Some(e) = &ext {
            if e.is_empty() || !e.chars().all(is_body_char) {
                return Err(EncodingError(format!("token {chunk:?} has an invalid source")));
            }
        }
        Ok(Token { sigil, bare, ext })
    }

    pub fn render(&self) -> String {
        self.tokens.iter().map(Token::render).collect()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The sub-spec containing only tokens with the given sigil, in order.
    pub fn filter(&self, sigil: char) -> Spec {
        Spec { tokens: self.tokens.iter().filter(|t| t.sigil == sigil).cloned().collect() }
    }

    pub fn token(&self, sigil: char) -> Option<&Token> {
        self.tokens.iter().find(|t| t.sigil == sigil)
    }

    pub fn ty(&self) -> Option<&str> {
        self.token(SIGIL_TYPE).map(|t| t.bare.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.token(SIGIL_ID).map(|t| t.bare.as_str())
    }

    pub fn op(&self) -> Option<&str> {
        self.token(SIGIL_OP).map(|t| t.bare.as_str())
    }

    pub fn version(&self) -> Option<Version> {
        self.token(SIGIL_VERSION).map(Version::from_token)
    }

    /// The replica that authored the first version token in this spec.
    pub fn source(&self) -> Option<&str> {
        self.token(SIGIL_VERSION).and_then(|t| t.ext.as_deref())
    }

    /// Alias for [`Spec::source`] used when reading state-snapshot specs,
    /// where the version token names the snapshot's author rather than a
    /// message sender.
    pub fn author(&self) -> Option<&str> {
        self.source()
    }

    pub fn object_prefix(&self) -> Option<String> {
        match (self.ty(), self.id()) {
            (Some(t), Some(i)) => Some(format!("/{t}#{i}")),
            _ => None,
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl PartialOrd for Spec {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Spec {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.render().cmp(&other.render())
    }
}
