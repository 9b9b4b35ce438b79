//! bucketeer - object-storage transfer CLI
//!
//! Uploads and downloads files to/from S3-compatible buckets, choosing
//! between single-request and chunked (multipart/resumable) transfers based
//! on object size. Named targets come from a JSON configuration file.

pub mod archive;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod progress;
pub mod resume;
pub mod storage;
pub mod transfer;

pub use client::Transfers;
pub use config::Config;
pub use error::{Error, Result};
