#![doc = "funcli-core: resumable bulk directory import into Fundamento."]

//! This crate holds all import logic. The CLI crate only parses arguments,
//! builds the HTTP client and renders output.
//!
//! # Layout
//! - [`scanner`]: walk the import root, classify files
//! - [`manifest`]: checksum files into manifest entries
//! - [`session_store`]: local record that makes imports resumable
//! - [`upload`]: bounded pool of direct uploads
//! - [`poller`]: wait for server-side processing
//! - [`import`]: the session lifecycle operations
//! - [`contract`]: the Remote API seam and wire types

pub mod config;
pub mod contract;
pub mod error;
pub mod import;
pub mod manifest;
pub mod poller;
pub mod progress;
pub mod scanner;
pub mod session_store;
pub mod transfer;
pub mod upload;

pub use config::ImportOptions;
pub use error::{ImportError, ScanError};
pub use import::{ImportOutcome, ImportSessionManager, StartOptions};
