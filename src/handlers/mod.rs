//! HTTP request handlers outside the auth routes.

pub mod http;

pub use http::*;
