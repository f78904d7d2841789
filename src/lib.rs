//! # Online Evaluator
//!
//! A small web endpoint that runs submitted snippets through an external
//! interpreter under OS resource limits and returns the escaped output as
//! a preformatted HTML page.
//!
//! ## Layers
//!
//! - **server:** HTTP routes and request handling
//! - **sandbox:** spawn-with-limits runner capturing combined output
//! - **render:** HTML escaping and the output page template
//! - **audit:** append-only log of submissions

pub mod audit;
pub mod config;
pub mod error;
pub mod render;
pub mod sandbox;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
