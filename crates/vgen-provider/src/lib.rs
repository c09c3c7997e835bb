//! Client for the Gemini API video generation operations.
//!
//! Jobs are submitted elsewhere; this crate only checks on the resulting
//! long-running operations and downloads finished videos.

pub mod client;
pub mod error;
pub mod types;

pub use client::{VeoClient, VeoConfig};
pub use error::{ProviderError, ProviderResult};
