//! Chart analysis front-end and request-forwarding service.
//!
//! A chart screenshot goes in, a CALL / PUT / NEUTRAL call with confidence
//! and reasoning comes out. Image understanding is delegated to hosted
//! multimodal providers; this crate owns the catalogs, input capture, the
//! dispatch seam, reply normalization, entry-time scheduling and the HTTP
//! surface around them.

pub mod capture;
pub mod catalog;
pub mod config;
pub mod core;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod presenter;
pub mod providers;
pub mod schedule;
pub mod services;
pub mod store;
