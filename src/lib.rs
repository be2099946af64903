pub mod config;
pub mod error;
pub mod fetch_context;
pub mod fetcher;
pub mod layout;
pub mod models;
pub mod requests;
pub mod result_parser;
pub mod server;
mod text_manipulators;

pub use error::FetchError;
pub use fetch_context::FetchContext;
pub use fetcher::ResultFetcher;
pub use models::{CourseRecord, FetchResult, StudentInfo};
