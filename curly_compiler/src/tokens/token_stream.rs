//! Ordered token storage
//!
//! Document order is meaning: the renderer walks the stream by index and
//! concatenates output in exactly this order.

use crate::tokens::token::{Token, TokenKind};
use crate::utils::{Span, Spanned};
use std::ops::Index;

/// A token with span information
pub type SpannedToken = Spanned<Token>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<SpannedToken>,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpannedToken> {
        self.tokens.get(index)
    }

    pub fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.value.kind)
    }

    pub fn push(&mut self, token: SpannedToken) {
        self.tokens.push(token);
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = SpannedToken>) {
        self.tokens.extend(tokens);
    }

    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpannedToken> {
        self.tokens.iter()
    }

    pub fn into_inner(self) -> Vec<SpannedToken> {
        self.tokens
    }

    /// Concatenation of every token's text
    pub fn concat_text(&self) -> String {
        self.tokens.iter().map(|t| t.value.text.as_str()).collect()
    }

    pub fn count_kind(&self, kind: TokenKind) -> usize {
        self.tokens.iter().filter(|t| t.value.kind == kind).count()
    }

    /// Index just past the group end that balances the group start at `start`.
    /// Returns `len()` when the group never closes.
    pub fn group_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(start) {
            let kind = token.value.kind;
            if kind.is_group_start() {
                depth += 1;
            } else if kind.is_group_end() {
                depth = depth.saturating_sub(1);
            }
            if depth == 0 {
                return index + 1;
            }
        }
        self.tokens.len()
    }

    /// Concatenated text of `tokens[start..end]`
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        self.tokens[start..end]
            .iter()
            .map(|t| t.value.text.as_str())
            .collect()
    }
}

impl Index<usize> for TokenStream {
    type Output = SpannedToken;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

impl FromIterator<SpannedToken> for TokenStream {
    fn from_iter<I: IntoIterator<Item = SpannedToken>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a SpannedToken;
    type IntoIter = std::slice::Iter<'a, SpannedToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
