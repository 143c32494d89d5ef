//! Token model for curly templates
//!
//! Tokens come in two layers. The lexer produces *raw* tokens: literal text,
//! whitespace runs and the four brace delimiters. The parser folds brace
//! groups into *structural* tokens: reference start/end and directive
//! start/end. Both layers share one [`TokenKind`] so a single
//! [`TokenStream`] can hold the parsed document in order.

pub mod token;
pub mod token_stream;

pub use token::{Token, TokenKind, DIRECTIVE_KEYWORD};
pub use token_stream::{SpannedToken, TokenStream};

pub use crate::utils::{Position, Span, Spanned};
