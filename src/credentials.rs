// Persisted identity/token state and the stores that keep it.
//
// The record is tiny and rewritten in full after every change. There is no
// locking: two processes racing on the same file means last writer wins.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The operator's API key, OAuth request code and access token.
///
/// Fields are acquired in order `api_key` -> `user_code` -> `user_token`.
/// `None` and `""` both mean "not acquired yet".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_code: Option<String>,
    #[serde(default)]
    pub user_token: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

impl Credential {
    pub fn api_key(&self) -> Option<&str> {
        present(&self.api_key)
    }

    pub fn username(&self) -> Option<&str> {
        present(&self.username)
    }

    pub fn user_code(&self) -> Option<&str> {
        present(&self.user_code)
    }

    pub fn user_token(&self) -> Option<&str> {
        present(&self.user_token)
    }

    /// True once the whole handshake has completed.
    pub fn is_complete(&self) -> bool {
        self.api_key().is_some() && self.user_code().is_some() && self.user_token().is_some()
    }

    /// Drop any field that was set while an earlier one is missing, so the
    /// handshake restarts from the first missing step. A token without a
    /// username is dropped too; the token step returns both.
    pub fn normalized(mut self) -> Self {
        if self.api_key().is_none() {
            self.user_code = None;
        }
        if self.user_code().is_none() || self.username().is_none() {
            self.user_token = None;
        }
        if self.user_token().is_none() {
            self.username = None;
        }
        self
    }
}

/// Where the credential record lives between runs.
pub trait CredentialStore {
    /// Load the record, creating an empty one if there is none yet.
    fn load(&mut self) -> Result<Credential>;

    /// Overwrite the stored record.
    fn save(&mut self, credential: &Credential) -> Result<()>;
}

/// JSON file in the user's home directory (`~/.pocketrandom` by default).
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::CredentialIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&mut self) -> Result<Credential> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no credential file, creating an empty one");
                let empty = Credential::default();
                self.save(&empty)?;
                return Ok(empty);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        // Bad UTF-8 fails here too and takes the same reset path.
        match serde_json::from_slice::<Credential>(&raw) {
            Ok(credential) => Ok(credential.normalized()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential file is corrupt, starting over");
                let empty = Credential::default();
                self.save(&empty)?;
                Ok(empty)
            }
        }
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(credential).map_err(Error::CredentialEncode)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The file holds an access token; keep it private on Unix, also when
        // an older file with wider permissions is being overwritten.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        file.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}

/// In-memory store, mostly for tests. Counts how often it was written.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Option<Credential>,
    saves: usize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            saves: 0,
        }
    }

    /// The last saved (or initially supplied) record.
    pub fn credential(&self) -> Credential {
        self.credential.clone().unwrap_or_default()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&mut self) -> Result<Credential> {
        match &self.credential {
            Some(credential) => Ok(credential.clone().normalized()),
            None => {
                let empty = Credential::default();
                self.save(&empty)?;
                Ok(empty)
            }
        }
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        self.credential = Some(credential.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn complete() -> Credential {
        Credential {
            api_key: Some("key".into()),
            username: Some("ada".into()),
            user_code: Some("code".into()),
            user_token: Some("token".into()),
        }
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let credential = Credential {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(credential.api_key(), None);
        assert!(!credential.is_complete());
        assert!(complete().is_complete());
    }

    #[test]
    fn normalized_clears_fields_acquired_out_of_order() {
        let credential = Credential {
            api_key: None,
            username: Some("ada".into()),
            user_code: Some("code".into()),
            user_token: Some("token".into()),
        }
        .normalized();
        assert_eq!(credential, Credential::default());

        let credential = Credential {
            user_code: Some(String::new()),
            ..complete()
        }
        .normalized();
        assert_eq!(credential.api_key(), Some("key"));
        assert_eq!(credential.user_token(), None);
        assert_eq!(credential.username(), None);
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        let mut store = FileCredentialStore::new(&path);

        let credential = store.load().unwrap();

        assert_eq!(credential, Credential::default());
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        fs::write(&path, "{not json").unwrap();
        let mut store = FileCredentialStore::new(&path);

        let credential = store.load().unwrap();

        assert_eq!(credential, Credential::default());
        let rewritten: Credential = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, Credential::default());
    }

    #[test]
    fn token_without_username_is_dropped() {
        let credential = Credential {
            username: Some(String::new()),
            ..complete()
        }
        .normalized();
        assert_eq!(credential.user_code(), Some("code"));
        assert_eq!(credential.user_token(), None);
        assert_eq!(credential.username(), None);
    }

    #[test]
    fn file_with_invalid_utf8_is_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let credential = FileCredentialStore::new(&path).load().unwrap();

        assert_eq!(credential, Credential::default());
        let rewritten: Credential = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(rewritten, Credential::default());
    }

    #[test]
    fn save_then_load_keeps_every_field() {
        let dir = tempdir().unwrap();
        let mut store = FileCredentialStore::new(dir.path().join("nested").join("creds.json"));

        store.save(&complete()).unwrap();

        assert_eq!(store.load().unwrap(), complete());
    }

    #[test]
    fn reads_files_written_with_null_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        fs::write(
            &path,
            r#"{"api_key": "key", "username": null, "user_code": null, "user_token": null}"#,
        )
        .unwrap();

        let credential = FileCredentialStore::new(&path).load().unwrap();

        assert_eq!(credential.api_key(), Some("key"));
        assert_eq!(credential.user_code(), None);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        FileCredentialStore::new(&path).save(&complete()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn overwriting_a_world_readable_file_makes_it_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(".pocketrandom");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FileCredentialStore::new(&path).save(&complete()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(FileCredentialStore::new(&path).load().unwrap(), complete());
    }

    #[test]
    fn memory_store_counts_saves() {
        let mut store = MemoryCredentialStore::new();
        assert_eq!(store.load().unwrap(), Credential::default());
        assert_eq!(store.saves(), 1);

        let mut store = MemoryCredentialStore::with_credential(complete());
        assert_eq!(store.load().unwrap(), complete());
        assert_eq!(store.saves(), 0);
    }
}
