use crate::profile::avatar::{AvatarPolicy, DEFAULT_AVATAR_EXTENSION};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessyncSettings {
    pub provider: ProviderSettings,
    pub profile: ProfileSettings,
    pub avatar: AvatarSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the Supabase-compatible backend
    pub base_url: String,

    // Direct values (can be overridden by environment variables)
    pub api_key: Option<String>,
    pub access_token: Option<String>,

    // Environment variable names for overrides
    pub api_key_env: Option<String>,
    pub access_token_env: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            access_token: None,
            api_key_env: None,
            access_token_env: None,
        }
    }
}

impl ProviderSettings {
    /// Resolve the API key, preferring the configured environment variable
    #[must_use]
    pub fn resolved_api_key(&self) -> String {
        if let Some(env_var) = &self.api_key_env {
            if let Ok(value) = std::env::var(env_var) {
                return value;
            }
        }
        self.api_key.clone().unwrap_or_default()
    }

    /// Resolve the stored access token, preferring the configured
    /// environment variable; empty values count as absent
    #[must_use]
    pub fn resolved_access_token(&self) -> Option<String> {
        if let Some(env_var) = &self.access_token_env {
            if let Ok(value) = std::env::var(env_var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        self.access_token.clone().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Table holding profile records, keyed by identity id
    pub table: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            table: "profiles".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    /// Asset-store bucket for avatar objects
    pub bucket: String,
    /// Maximum accepted upload size in bytes; 0 disables the local check
    pub max_size_bytes: usize,
    /// Extension used when the file name carries none
    pub fallback_extension: String,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            bucket: "avatars".to_string(),
            max_size_bytes: 0,
            fallback_extension: DEFAULT_AVATAR_EXTENSION.to_string(),
        }
    }
}

impl AvatarSettings {
    /// Build the upload policy enforced by the mutator
    #[must_use]
    pub fn policy(&self) -> AvatarPolicy {
        AvatarPolicy {
            bucket: self.bucket.clone(),
            max_size_bytes: self.max_size_bytes,
            fallback_extension: self.fallback_extension.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SessyncSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment initialization fails
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // Initialize environment and logging
        Self::initialize_environment()?;

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment variables and logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SESSYNC_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            log::debug!("Loaded base settings from {}", default_config_path.display());
        }

        // A secrets directory takes priority over the working-directory file
        if let Ok(secrets_dir) = std::env::var("SESSYNC_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                log::debug!("Overriding settings from {}", secrets_path.display());
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_provider_env_overrides(&mut settings.provider);
        Self::apply_profile_env_overrides(&mut settings.profile);
        Self::apply_avatar_env_overrides(&mut settings.avatar);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    /// Apply environment overrides for provider settings
    pub fn apply_provider_env_overrides(provider_settings: &mut ProviderSettings) {
        if let Ok(base_url) = std::env::var("SESSYNC_BASE_URL") {
            provider_settings.base_url = base_url;
        }
        if let Ok(api_key) = std::env::var("SESSYNC_API_KEY") {
            if !api_key.is_empty() {
                provider_settings.api_key = Some(api_key);
            }
        }
        if let Ok(access_token) = std::env::var("SESSYNC_ACCESS_TOKEN") {
            if !access_token.is_empty() {
                provider_settings.access_token = Some(access_token);
            }
        }
    }

    /// Apply environment overrides for profile settings
    fn apply_profile_env_overrides(profile_settings: &mut ProfileSettings) {
        if let Ok(table) = std::env::var("SESSYNC_PROFILE_TABLE") {
            profile_settings.table = table;
        }
    }

    /// Apply environment overrides for avatar settings
    pub fn apply_avatar_env_overrides(avatar_settings: &mut AvatarSettings) {
        if let Ok(bucket) = std::env::var("SESSYNC_AVATAR_BUCKET") {
            avatar_settings.bucket = bucket;
        }
        if let Ok(max_str) = std::env::var("SESSYNC_AVATAR_MAX_SIZE_BYTES") {
            if let Ok(max) = max_str.parse::<usize>() {
                avatar_settings.max_size_bytes = max;
            }
        }
        if let Ok(extension) = std::env::var("SESSYNC_AVATAR_FALLBACK_EXTENSION") {
            avatar_settings.fallback_extension = extension;
        }
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
