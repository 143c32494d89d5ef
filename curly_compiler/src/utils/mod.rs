//! Shared primitive types used across the lexer, parser and renderer

pub mod span;

pub use span::{Position, Span, Spanned};
