//! Token kinds and the token value type
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword that turns a brace group into a fetch directive
pub const DIRECTIVE_KEYWORD: &str = "x-url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Raw lexical kinds
    Text,
    Whitespace,
    OpenDouble,
    CloseDouble,
    OpenTriple,
    CloseTriple,

    // Structural kinds, produced only by the parser
    ReferenceStart,
    ReferenceEnd,
    DirectiveStart,
    DirectiveEnd,
}

impl TokenKind {
    pub fn is_open(self) -> bool {
        matches!(self, Self::OpenDouble | Self::OpenTriple)
    }

    pub fn is_close(self) -> bool {
        matches!(self, Self::CloseDouble | Self::CloseTriple)
    }

    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::ReferenceStart | Self::ReferenceEnd | Self::DirectiveStart | Self::DirectiveEnd
        )
    }

    /// Starts a group that the evaluator must resolve
    pub fn is_group_start(self) -> bool {
        matches!(self, Self::ReferenceStart | Self::DirectiveStart)
    }

    pub fn is_group_end(self) -> bool {
        matches!(self, Self::ReferenceEnd | Self::DirectiveEnd)
    }

    /// The close delimiter that balances an open delimiter
    pub fn matching_close(self) -> Option<Self> {
        match self {
            Self::OpenDouble => Some(Self::CloseDouble),
            Self::OpenTriple => Some(Self::CloseTriple),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Whitespace => "whitespace",
            Self::OpenDouble => "'{{'",
            Self::CloseDouble => "'}}'",
            Self::OpenTriple => "'{{{'",
            Self::CloseTriple => "'}}}'",
            Self::ReferenceStart => "reference start",
            Self::ReferenceEnd => "reference end",
            Self::DirectiveStart => "directive start",
            Self::DirectiveEnd => "directive end",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token: its kind plus the exact text it stands for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, text)
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Whitespace, text)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// True for the literal-text token `x-url`
    pub fn is_directive_keyword(&self) -> bool {
        self.kind == TokenKind::Text && self.text == DIRECTIVE_KEYWORD
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.text)
    }
}
