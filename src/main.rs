#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, bail, Result};
use sessync::{
    format_display_name, resolve_identity_once, ProfileMutator, RefreshSignal, RestProvider,
    SessyncSettings, UploadCandidate,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings =
        SessyncSettings::load().map_err(|e| anyhow!("Failed to load settings: {e}"))?;

    let provider = Arc::new(RestProvider::from_settings(&settings));
    let mutator = ProfileMutator::new(
        Arc::clone(&provider) as Arc<dyn sessync::SessionProvider>,
        Arc::clone(&provider) as Arc<dyn sessync::RecordStore>,
        Arc::clone(&provider) as Arc<dyn sessync::AssetStore>,
        Arc::new(RefreshSignal::new()),
    )
    .with_policy(settings.avatar.policy())
    .with_table(&settings.profile.table);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "whoami" && rest.is_empty() => {
            whoami(&provider, &mutator).await
        }
        Some((command, rest)) if command == "sign-in" && rest.len() == 2 => {
            sign_in(&provider, &rest[0], &rest[1]).await
        }
        Some((command, rest)) if command == "set-name" && !rest.is_empty() => {
            set_name(&mutator, &rest.join(" ")).await
        }
        Some((command, rest)) if command == "upload-avatar" && rest.len() == 1 => {
            upload_avatar(&mutator, &rest[0]).await
        }
        _ => {
            eprintln!("sessync {}", sessync::VERSION);
            eprintln!("Usage: sessync <whoami | sign-in EMAIL PASSWORD | set-name NAME | upload-avatar PATH>");
            Ok(())
        }
    }
}

/// Resolve the current identity once and print its display name
async fn whoami(provider: &Arc<RestProvider>, mutator: &ProfileMutator) -> Result<()> {
    match resolve_identity_once(provider.as_ref()).await? {
        Some(identity) => {
            let profile = mutator.load_profile().await?;
            let label = format_display_name(Some(&profile.full_name), &identity.email);
            println!("{label} <{}>", identity.email);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn sign_in(provider: &Arc<RestProvider>, email: &str, password: &str) -> Result<()> {
    let lookup = provider.sign_in_with_password(email, password).await?;
    match lookup.user {
        Some(user) => println!("Signed in as {}", user.email),
        None => println!("Sign-in accepted; check {email} for a confirmation step"),
    }
    Ok(())
}

async fn set_name(mutator: &ProfileMutator, name: &str) -> Result<()> {
    mutator.update_display_name(name).await?;
    println!("Display name updated");
    Ok(())
}

async fn upload_avatar(mutator: &ProfileMutator, path: &str) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToString::to_string);
    let Some(mime_type) = guess_image_mime(file_name.as_deref()) else {
        bail!("Unsupported file type; use JPEG, PNG, GIF, or WebP");
    };

    let candidate = UploadCandidate::new(file_name.as_deref(), Some(mime_type), bytes);
    let upload = mutator.upload_avatar(&candidate).await?;
    println!("Avatar available at {}", upload.avatar_url);
    Ok(())
}

/// Map a file extension to its raster image mime type
fn guess_image_mime(file_name: Option<&str>) -> Option<&'static str> {
    let extension = file_name?.rsplit_once('.')?.1.to_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
