//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - Create-only uploads of generated videos (`If-None-Match: *`)
//! - Public URL construction for stored objects
//! - Bucket connectivity checks for readiness probes

pub mod client;
pub mod error;
pub mod keys;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use keys::{public_url_for, validate_key};
