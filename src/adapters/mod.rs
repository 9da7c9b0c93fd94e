// Adapters layer: concrete implementations for external systems (http, converters).

pub mod converter;
pub mod http;

pub use converter::{ExternalConverter, NativeConverter};
pub use http::HttpFetcher;
