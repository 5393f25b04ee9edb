//! Upload infrastructure adapters

mod http;

pub use http::HttpUploader;
