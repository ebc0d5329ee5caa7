//! Identity-gated profile mutation workflows
//!
//! `ProfileMutator` performs the two profile writes (display name, avatar)
//! plus the profile read backing the profile view. Every operation
//! validates its input first, then re-resolves identity freshly via the
//! provider rather than reusing stale state, so a since-expired session is
//! caught before anything is written. Validation failures never reach the
//! network.

use crate::models::error::{ProfileError, ValidationIssue};
use crate::models::{Identity, ProfileRecord, UploadCandidate};
use crate::profile::avatar::{cache_busted_url, storage_key, validate_candidate, AvatarPolicy};
use crate::providers::{AssetStore, ProviderError, RecordStore, SessionProvider};
use crate::refresh::ViewRefresher;
use crate::session::{resolve, SessionOutcome};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

/// Columns read when loading the profile view
const PROFILE_COLUMNS: &str = "email,full_name,avatar_url";

/// Result of a successful avatar upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    /// Stable per-user key the asset was stored under
    pub storage_key: String,
    /// Cache-busted public URL written to the profile record
    pub avatar_url: String,
}

/// Validated, idempotent writes to the profile record and avatar asset
pub struct ProfileMutator {
    provider: Arc<dyn SessionProvider>,
    records: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    refresher: Arc<dyn ViewRefresher>,
    policy: AvatarPolicy,
    profile_table: String,
}

impl ProfileMutator {
    /// Create a mutator over the given boundaries with default policy
    #[must_use]
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        records: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        refresher: Arc<dyn ViewRefresher>,
    ) -> Self {
        Self {
            provider,
            records,
            assets,
            refresher,
            policy: AvatarPolicy::default(),
            profile_table: "profiles".to_string(),
        }
    }

    /// Replace the avatar upload policy
    #[must_use]
    pub fn with_policy(mut self, policy: AvatarPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a different profile table name
    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.profile_table = table.to_string();
        self
    }

    /// Update the signed-in user's display name
    ///
    /// The name is trimmed before writing; re-submitting the same trimmed
    /// name is a no-op write on the remote side. On success, dependent
    /// views are signaled to re-read the record.
    ///
    /// # Errors
    /// - [`ProfileError::Validation`] if the trimmed name is empty
    /// - [`ProfileError::AuthRequired`] if no identity is resolvable
    /// - [`ProfileError::Persistence`] if the remote write is rejected
    pub async fn update_display_name(&self, raw_name: &str) -> Result<(), ProfileError> {
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(ValidationIssue::EmptyDisplayName.into());
        }

        let identity = self.require_identity().await?;
        self.records
            .update(
                &self.profile_table,
                "id",
                &identity.id,
                &json!({ "full_name": trimmed }),
            )
            .await
            .map_err(persistence)?;

        log::info!("Updated display name for {}", identity.id);
        self.refresher.refresh();
        Ok(())
    }

    /// Validate, store, and publish a new avatar for the signed-in user
    ///
    /// The asset is stored under the stable key `{id}/avatar.{ext}` with
    /// overwrite-on-conflict semantics, then referenced from the profile
    /// record through a cache-busted public URL.
    ///
    /// # Errors
    /// - [`ProfileError::Validation`] for a disallowed type or oversized file
    /// - [`ProfileError::AuthRequired`] if no identity is resolvable
    /// - [`ProfileError::Persistence`] if the asset store rejects the write,
    ///   specialized when the cause indicates a size limit
    /// - [`ProfileError::PartialSuccess`] if the asset was stored but the
    ///   record write failed; carries the stored URL for a record-only retry
    pub async fn upload_avatar(
        &self,
        candidate: &UploadCandidate,
    ) -> Result<AvatarUpload, ProfileError> {
        validate_candidate(candidate, &self.policy)?;
        let identity = self.require_identity().await?;

        let key = storage_key(
            &identity.id,
            candidate.file_name.as_deref(),
            &self.policy.fallback_extension,
        );
        // Validation guarantees the mime type is present at this point.
        let content_type = candidate.mime_type.clone().unwrap_or_default();

        self.assets
            .upload(
                &self.policy.bucket,
                &key,
                candidate.bytes.clone(),
                &content_type,
                true,
            )
            .await
            .map_err(persistence)?;

        let public_url = self.assets.get_public_url(&self.policy.bucket, &key);
        let avatar_url = cache_busted_url(&public_url, Utc::now().timestamp_millis());

        if let Err(error) = self
            .records
            .update(
                &self.profile_table,
                "id",
                &identity.id,
                &json!({ "avatar_url": avatar_url }),
            )
            .await
        {
            log::error!("Avatar stored but record update failed for {}: {error}", identity.id);
            return Err(ProfileError::PartialSuccess {
                avatar_url,
                message: error.message,
            });
        }

        log::info!("Updated avatar for {} at {key}", identity.id);
        self.refresher.refresh();
        Ok(AvatarUpload {
            storage_key: key,
            avatar_url,
        })
    }

    /// Load the signed-in user's profile record
    ///
    /// A missing row or a rejected read degrades to a record synthesized
    /// from the identity (empty name and avatar) with a logged warning,
    /// matching how the profile view falls back.
    ///
    /// # Errors
    /// Returns [`ProfileError::AuthRequired`] if no identity is resolvable.
    pub async fn load_profile(&self) -> Result<ProfileRecord, ProfileError> {
        let identity = self.require_identity().await?;

        let row = match self
            .records
            .select(&self.profile_table, PROFILE_COLUMNS, "id", &identity.id)
            .await
        {
            Ok(row) => row,
            Err(error) => {
                log::warn!("Profile read failed for {}: {error}", identity.id);
                None
            }
        };

        Ok(row.map_or_else(
            || synthesized_record(&identity),
            |row| record_from_row(&identity, &row),
        ))
    }

    /// Re-resolve identity freshly at the start of a mutating operation
    async fn require_identity(&self) -> Result<Identity, ProfileError> {
        match resolve(&self.provider.get_user().await) {
            SessionOutcome::Present(identity) => Ok(identity),
            SessionOutcome::Absent => Err(ProfileError::AuthRequired),
            SessionOutcome::Failed(error) => {
                log::warn!("Identity not resolvable for mutation: {error}");
                Err(ProfileError::AuthRequired)
            }
        }
    }
}

fn persistence(error: ProviderError) -> ProfileError {
    ProfileError::Persistence {
        size_limited: error.indicates_size_limit(),
        message: error.message,
    }
}

fn synthesized_record(identity: &Identity) -> ProfileRecord {
    ProfileRecord {
        id: identity.id.clone(),
        email: identity.email.clone(),
        full_name: String::new(),
        avatar_url: String::new(),
    }
}

fn record_from_row(identity: &Identity, row: &Value) -> ProfileRecord {
    let field = |name: &str| {
        row.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let email = row
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or(&identity.email)
        .to_string();
    ProfileRecord {
        id: identity.id.clone(),
        email,
        full_name: field("full_name"),
        avatar_url: field("avatar_url"),
    }
}
