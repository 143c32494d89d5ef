//! Substitution key names

/// Words that can never be used as substitution keys
pub const RESERVED_WORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "each", "repeat", "return", "then", "true", "until", "while",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCheck {
    Valid,
    Reserved,
    InvalidSyntax,
}

impl NameCheck {
    pub fn is_valid(self) -> bool {
        self == NameCheck::Valid
    }
}

/// Classify a bare key name.
///
/// Valid names are non-empty runs of ASCII letters, digits and underscores
/// that do not start with a digit and are not reserved.
pub fn validate_name(name: &str) -> NameCheck {
    let mut chars = name.chars();
    let well_formed = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !well_formed {
        NameCheck::InvalidSyntax
    } else if RESERVED_WORDS.contains(&name) {
        NameCheck::Reserved
    } else {
        NameCheck::Valid
    }
}
