//! Repository for owner profiles.

use tracing::debug;

use vgen_models::OwnerId;

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::Document;

/// Collection holding one profile per owner.
pub const PROFILES_COLLECTION: &str = "profiles";

/// Read-only access to owner contact details.
#[derive(Clone)]
pub struct ProfileRepository {
    client: FirestoreClient,
}

impl ProfileRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Email address on the owner's profile, if any.
    pub async fn get_email(&self, owner_id: &OwnerId) -> FirestoreResult<Option<String>> {
        let doc = self
            .client
            .with_retry("get_profile", || {
                self.client.get_document(PROFILES_COLLECTION, owner_id.as_str())
            })
            .await?;

        let email = doc.as_ref().and_then(profile_email);
        if email.is_none() {
            debug!(owner_id = %owner_id, "No contact email on profile");
        }
        Ok(email)
    }
}

fn profile_email(doc: &Document) -> Option<String> {
    doc.get::<String>("email")
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}
