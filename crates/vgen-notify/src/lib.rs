//! Transactional email for finished videos.

pub mod client;
pub mod error;
pub mod template;

pub use client::{EmailClient, EmailConfig};
pub use error::{NotifyError, NotifyResult};
pub use template::{completion_email, results_url, CompletionEmail};
