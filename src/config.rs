// Runtime settings: where the service lives and where credentials are kept.
//
// Values come from the environment with sensible defaults, so the binaries
// work out of the box and tests can point the client somewhere else.

use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://getpocket.com/v3/";
pub const AUTHORIZE_PAGE: &str = "https://getpocket.com/auth/authorize";
pub const DEVELOPER_PAGE: &str = "http://getpocket.com/developer/apps/";
pub const REDIRECT_URI: &str = "https://getpocket.com/connected_accounts";
pub const CREDENTIAL_FILE_NAME: &str = ".pocketrandom";

/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "POCKET_API_BASE";
/// Environment variable overriding the credential file location.
pub const CREDENTIALS_ENV: &str = "POCKET_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub authorize_page: String,
    pub developer_page: String,
    pub redirect_uri: String,
    pub credential_path: PathBuf,
}

impl Settings {
    /// Build settings from `POCKET_API_BASE` / `POCKET_CREDENTIALS`, falling
    /// back to the public Pocket endpoints and `~/.pocketrandom`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Same as [`Settings::from_env`] but with the environment and home
    /// directory supplied by the caller.
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = non_empty(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.into());
        let credential_path = match non_empty(CREDENTIALS_ENV) {
            Some(path) => PathBuf::from(path),
            None => home
                .ok_or(Error::HomeDirUnavailable)?
                .join(CREDENTIAL_FILE_NAME),
        };

        Ok(Settings {
            api_base,
            authorize_page: AUTHORIZE_PAGE.into(),
            developer_page: DEVELOPER_PAGE.into(),
            redirect_uri: REDIRECT_URI.into(),
            credential_path,
        })
    }
}
