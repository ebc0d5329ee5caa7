//! Avatar upload validation and storage-key derivation
//!
//! Uploads are validated entirely locally before any remote call, stored
//! under one stable key per user (so repeated uploads overwrite in place),
//! and served through a cache-busted public URL because the key itself
//! never changes.

use crate::models::error::ValidationIssue;
use crate::models::UploadCandidate;
use std::sync::atomic::{AtomicI64, Ordering};

/// Raster image types accepted for avatar uploads
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Extension used when the candidate file name carries none
pub const DEFAULT_AVATAR_EXTENSION: &str = "png";

/// Upload policy for avatar assets
#[derive(Debug, Clone)]
pub struct AvatarPolicy {
    /// Asset-store bucket holding avatar objects
    pub bucket: String,
    /// Maximum accepted upload size in bytes; 0 disables the local check
    pub max_size_bytes: usize,
    /// Extension used when the file name carries none
    pub fallback_extension: String,
}

impl Default for AvatarPolicy {
    fn default() -> Self {
        Self {
            bucket: "avatars".to_string(),
            max_size_bytes: 0,
            fallback_extension: DEFAULT_AVATAR_EXTENSION.to_string(),
        }
    }
}

/// Validate a pending upload against the allow-list and the size policy
///
/// # Errors
/// Returns a [`ValidationIssue`] when the mime type is missing or not an
/// allowed raster image type, or when the file exceeds the configured
/// maximum size.
pub fn validate_candidate(
    candidate: &UploadCandidate,
    policy: &AvatarPolicy,
) -> Result<(), ValidationIssue> {
    match candidate.mime_type.as_deref() {
        None | Some("") => return Err(ValidationIssue::UnsupportedFileType(None)),
        Some(mime) if !ALLOWED_IMAGE_TYPES.contains(&mime) => {
            return Err(ValidationIssue::UnsupportedFileType(Some(mime.to_string())));
        }
        Some(_) => {}
    }

    if policy.max_size_bytes > 0 && candidate.byte_size() > policy.max_size_bytes {
        return Err(ValidationIssue::FileTooLarge {
            size: candidate.byte_size(),
            max: policy.max_size_bytes,
        });
    }
    Ok(())
}

/// Derive the stable storage key for a user's avatar
///
/// `{identity_id}/avatar.{extension}` with the extension taken from the
/// candidate file name. The key never varies across uploads for the same
/// user, so overwrites replace in place and no orphaned assets accumulate.
#[must_use]
pub fn storage_key(identity_id: &str, file_name: Option<&str>, fallback_extension: &str) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(fallback_extension);
    format!("{identity_id}/avatar.{extension}")
}

/// Append a uniquifying query parameter to a public URL
///
/// The storage key is unchanged across uploads, so a naive cache would
/// keep serving the old bytes; the strictly increasing suffix makes every
/// upload a fresh URL.
#[must_use]
pub fn cache_busted_url(public_url: &str, now_millis: i64) -> String {
    format!("{public_url}?t={}", next_uniquifier(now_millis))
}

static LAST_UNIQUIFIER: AtomicI64 = AtomicI64::new(0);

/// Strictly increasing value seeded from the wall clock
///
/// Consecutive calls within the same millisecond still get distinct
/// values, so two back-to-back uploads never share a cache entry.
fn next_uniquifier(now_millis: i64) -> i64 {
    let mut observed = LAST_UNIQUIFIER.load(Ordering::Relaxed);
    loop {
        let next = now_millis.max(observed + 1);
        match LAST_UNIQUIFIER.compare_exchange(observed, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => observed = current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(mime: Option<&str>, size: usize) -> UploadCandidate {
        UploadCandidate::new(Some("avatar.png"), mime, vec![0; size])
    }

    #[test]
    fn allowed_raster_types_pass() {
        let policy = AvatarPolicy::default();
        for mime in ALLOWED_IMAGE_TYPES {
            assert!(validate_candidate(&candidate(Some(mime), 16), &policy).is_ok());
        }
    }

    #[test]
    fn non_image_types_are_rejected() {
        let policy = AvatarPolicy::default();
        for mime in ["text/plain", "application/pdf", "image/svg+xml", "video/mp4"] {
            assert_eq!(
                validate_candidate(&candidate(Some(mime), 16), &policy),
                Err(ValidationIssue::UnsupportedFileType(Some(mime.to_string())))
            );
        }
    }

    #[test]
    fn missing_or_empty_type_is_rejected() {
        let policy = AvatarPolicy::default();
        assert_eq!(
            validate_candidate(&candidate(None, 16), &policy),
            Err(ValidationIssue::UnsupportedFileType(None))
        );
        assert_eq!(
            validate_candidate(&candidate(Some(""), 16), &policy),
            Err(ValidationIssue::UnsupportedFileType(None))
        );
    }

    #[test]
    fn size_policy_zero_means_unlimited() {
        let policy = AvatarPolicy::default();
        assert!(validate_candidate(&candidate(Some("image/png"), 50_000_000), &policy).is_ok());
    }

    #[test]
    fn oversized_files_are_rejected_distinctly() {
        let policy = AvatarPolicy {
            max_size_bytes: 1024,
            ..AvatarPolicy::default()
        };
        assert_eq!(
            validate_candidate(&candidate(Some("image/png"), 2048), &policy),
            Err(ValidationIssue::FileTooLarge {
                size: 2048,
                max: 1024,
            })
        );
    }

    #[test]
    fn storage_key_uses_the_file_extension() {
        assert_eq!(
            storage_key("u1", Some("me.jpeg"), "png"),
            "u1/avatar.jpeg"
        );
        assert_eq!(
            storage_key("u1", Some("archive.tar.gz"), "png"),
            "u1/avatar.gz"
        );
    }

    #[test]
    fn storage_key_falls_back_without_an_extension() {
        assert_eq!(storage_key("u1", Some("avatar"), "png"), "u1/avatar.png");
        assert_eq!(storage_key("u1", Some("trailing."), "png"), "u1/avatar.png");
        assert_eq!(storage_key("u1", None, "png"), "u1/avatar.png");
    }

    #[test]
    fn storage_key_is_stable_per_user() {
        let first = storage_key("u1", Some("a.png"), "png");
        let second = storage_key("u1", Some("b.png"), "png");
        assert_eq!(first, second);
    }

    #[test]
    fn cache_busted_urls_differ_within_the_same_millisecond() {
        let now = 1_700_000_000_000;
        let first = cache_busted_url("https://cdn/avatars/u1/avatar.png", now);
        let second = cache_busted_url("https://cdn/avatars/u1/avatar.png", now);
        assert_ne!(first, second);
        assert!(first.starts_with("https://cdn/avatars/u1/avatar.png?t="));
    }
}
