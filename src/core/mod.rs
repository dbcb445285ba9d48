//! Core application surfaces

pub mod http;

pub use http::*;
