//! Substitution data and reference resolution

pub mod data;
pub mod names;
pub mod resolver;

pub use data::{DataError, SubstitutionData};
pub use names::{validate_name, NameCheck, RESERVED_WORDS};
pub use resolver::{lookup, resolve, value_to_string, ResolveError};
