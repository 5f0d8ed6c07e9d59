//! Profile management
//!
//! Profiles are named references to S3-compatible storage endpoints,
//! including connection details and credentials. They are stored in
//! TOML format at ~/.config/osc/profiles.toml.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Current profile file schema version
///
/// Bumping this version requires adding a migration in `ProfileStore::migrate`.
pub const SCHEMA_VERSION: u32 = 1;

/// Signing service name used in the credential scope
pub const SERVICE: &str = "s3";

/// A profile is a named S3-compatible storage endpoint with credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    /// Endpoint URL; when unset the standard AWS endpoint for the
    /// region is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Region used for signing
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Profile {
    /// Create a new profile with required fields
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
        }
    }

    /// Set a custom endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// The effective endpoint URL, with any trailing slash removed
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        };
        Ok(Url::parse(&raw)?)
    }

    /// Resolve this profile into the credentials a signed client needs
    pub fn credentials(&self) -> Result<Credentials> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::Config(format!(
                "Profile '{}' is missing an access key or secret key",
                self.name
            )));
        }
        Ok(Credentials {
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            region: self.region.clone(),
            service: SERVICE.to_string(),
            endpoint: self.endpoint_url()?,
        })
    }
}

/// Resolved credentials passed explicitly to the signer and transport.
/// There is no process-global credential state; everything a request
/// needs travels in this value.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub service: String,
    pub endpoint: Url,
}

/// On-disk profile file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesFile {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Configured profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Default for ProfilesFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            profiles: Vec::new(),
        }
    }
}

/// Handles loading, saving, and querying the profile file
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Create a ProfileStore at the default location.
    ///
    /// The OSC_CONFIG_DIR environment variable overrides the base
    /// directory, which the integration tests rely on.
    pub fn new() -> Result<Self> {
        let base = match std::env::var_os("OSC_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("osc"),
        };
        Ok(Self {
            path: base.join("profiles.toml"),
        })
    }

    /// Create a ProfileStore with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the profile file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the profile file from disk
    ///
    /// If the file doesn't exist, returns an empty default.
    pub fn load(&self) -> Result<ProfilesFile> {
        if !self.path.exists() {
            return Ok(ProfilesFile::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut file: ProfilesFile = toml::from_str(&content)?;
        debug!(path = %self.path.display(), profiles = file.profiles.len(), "loaded profile file");

        if file.schema_version < SCHEMA_VERSION {
            file = self.migrate(file)?;
        } else if file.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Profile file version {} is newer than supported version {}. Please upgrade osc.",
                file.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(file)
    }

    /// Save the profile file to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, file: &ProfilesFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(file)?;
        std::fs::write(&self.path, content)?;

        // Credentials live in this file, so keep it private on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }

    /// List all configured profiles
    pub fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.load()?.profiles)
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Result<Profile> {
        self.load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add or update a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        let mut file = self.load()?;
        file.profiles.retain(|p| p.name != profile.name);
        file.profiles.push(profile);
        self.save(&file)
    }

    /// Remove a profile
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut file = self.load()?;
        let original_len = file.profiles.len();

        file.profiles.retain(|p| p.name != name);

        if file.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.save(&file)
    }

    /// Check if a profile exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.profiles.iter().any(|p| p.name == name))
    }

    /// Migrate a profile file from an older schema version
    fn migrate(&self, file: ProfilesFile) -> Result<ProfilesFile> {
        let mut file = file;

        // Add migration logic here when the schema version is bumped

        file.schema_version = SCHEMA_VERSION;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (ProfileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profiles.toml");
        (ProfileStore::with_path(path), temp_dir)
    }

    #[test]
    fn test_profile_new_defaults() {
        let profile = Profile::new("test", "access", "secret");
        assert_eq!(profile.name, "test");
        assert_eq!(profile.region, "us-east-1");
        assert!(profile.endpoint.is_none());
    }

    #[test]
    fn test_endpoint_derived_from_region() {
        let profile = Profile::new("test", "a", "b").with_region("eu-west-2");
        assert_eq!(
            profile.endpoint_url().unwrap().as_str(),
            "https://s3.eu-west-2.amazonaws.com/"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_stripped() {
        let profile = Profile::new("test", "a", "b").with_endpoint("http://localhost:9000/");
        let url = profile.endpoint_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_credentials_resolution() {
        let profile = Profile::new("test", "AKID", "SECRET")
            .with_endpoint("http://localhost:9000")
            .with_region("us-west-1");
        let creds = profile.credentials().unwrap();
        assert_eq!(creds.access_key, "AKID");
        assert_eq!(creds.secret_key, "SECRET");
        assert_eq!(creds.region, "us-west-1");
        assert_eq!(creds.service, "s3");
        assert_eq!(creds.endpoint.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_credentials_require_keys() {
        let profile = Profile::new("test", "", "secret");
        assert!(profile.credentials().is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (store, _temp_dir) = temp_store();
        let file = store.load().unwrap();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert!(file.profiles.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let (store, _temp_dir) = temp_store();

        let profile =
            Profile::new("minio", "minioadmin", "minioadmin").with_endpoint("http://localhost:9000");
        store.set(profile).unwrap();

        let retrieved = store.get("minio").unwrap();
        assert_eq!(retrieved.name, "minio");
        assert_eq!(retrieved.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_set_replaces_existing() {
        let (store, _temp_dir) = temp_store();

        store
            .set(Profile::new("test", "a", "b").with_endpoint("http://old:9000"))
            .unwrap();
        store
            .set(Profile::new("test", "c", "d").with_endpoint("http://new:9000"))
            .unwrap();

        let profiles = store.list().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].endpoint.as_deref(), Some("http://new:9000"));
    }

    #[test]
    fn test_remove() {
        let (store, _temp_dir) = temp_store();

        store.set(Profile::new("test", "a", "b")).unwrap();
        assert!(store.exists("test").unwrap());

        store.remove("test").unwrap();
        assert!(!store.exists("test").unwrap());
    }

    #[test]
    fn test_remove_not_found() {
        let (store, _temp_dir) = temp_store();
        let result = store.remove("nonexistent");
        assert!(matches!(result.unwrap_err(), Error::ProfileNotFound(_)));
    }

    #[test]
    fn test_get_not_found() {
        let (store, _temp_dir) = temp_store();
        let result = store.get("nonexistent");
        assert!(matches!(result.unwrap_err(), Error::ProfileNotFound(_)));
    }

    #[test]
    fn test_schema_version_too_new() {
        let (store, _temp_dir) = temp_store();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(store.path(), content).unwrap();

        let result = store.load();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp_dir) = temp_store();
        store.set(Profile::new("test", "a", "b")).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
