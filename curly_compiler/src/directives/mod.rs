//! `x-url` fetch directives: errors, fetchers and group evaluation

pub mod error;
pub mod evaluator;
pub mod fetch;

pub use error::DirectiveError;
pub use evaluator::{EvaluationStats, Evaluator};
pub use fetch::{build_client, FetchError, FetchResponse, Fetcher, HttpFetcher, StaticFetcher};
