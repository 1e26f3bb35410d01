pub mod codes;
pub mod config;
pub mod crosswalk;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod period;
pub mod pipeline;
pub mod reference;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use pipeline::{Pipeline, RunReport};
