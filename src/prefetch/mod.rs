pub mod cache;
pub mod fetcher;
pub mod http;

pub use cache::{CacheEntry, FetchFuture, ImagePrefetcher};
pub use fetcher::{FetchResult, ImageFetcher, Resource, ResourceUnavailable};
pub use http::HttpFetcher;
