//! Persisted client profile.
//!
//! Identity, display name, and theme preference survive restarts in a
//! small JSON file under the user config directory. Read once at startup,
//! written on change. A missing or corrupt file falls back to a fresh
//! profile; persistence problems are never fatal to the chat session.

use std::{fs, io, path::PathBuf};

use palaver_proto::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::Environment;

/// Errors from saving a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Filesystem failure.
    #[error("profile I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Serialization failure.
    #[error("profile serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// UI color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark palette.
    #[default]
    Dark,
    /// Light palette.
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Per-user persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable identity, generated once and reused across sessions.
    pub user_id: UserId,

    /// Display name attached to outgoing messages.
    pub nickname: String,

    /// UI theme preference.
    #[serde(default)]
    pub theme: Theme,
}

/// Disk-backed profile store.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profile: Profile,
}

impl ProfileStore {
    /// Default location: `<config dir>/palaver/profile.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("palaver")
            .join("profile.json")
    }

    /// Load the profile at `path`, generating a fresh one on first run or
    /// when the file is unreadable.
    pub fn load_or_create<E: Environment>(env: &E, path: PathBuf) -> Self {
        let profile = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_else(|| Self::fresh(env));
        Self { path, profile }
    }

    /// Generate a first-run profile: random identity, `User<n>` nickname.
    fn fresh<E: Environment>(env: &E) -> Profile {
        let mut bytes = [0u8; 16];
        env.random_bytes(&mut bytes);
        let user_id = UserId::from_random_bytes(bytes);

        let mut tail = [0u8; 2];
        env.random_bytes(&mut tail);
        let n = u16::from_be_bytes(tail) % 1000;

        Profile { user_id, nickname: format!("User{n}"), theme: Theme::default() }
    }

    /// The loaded profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Update the display name and persist.
    pub fn set_nickname(&mut self, nickname: impl Into<String>) -> Result<(), ProfileError> {
        self.profile.nickname = nickname.into();
        self.save()
    }

    /// Update the theme preference and persist.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ProfileError> {
        self.profile.theme = theme;
        self.save()
    }

    /// Write the profile to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.profile)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct CountingEnv;

    impl Environment for CountingEnv {
        type Instant = std::time::Instant;

        fn now(&self) -> Self::Instant {
            std::time::Instant::now()
        }

        fn unix_time(&self) -> u64 {
            0
        }

        fn sleep(
            &self,
            _duration: std::time::Duration,
        ) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0x5A);
        }
    }

    #[test]
    fn first_run_generates_identity_and_nickname() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::load_or_create(&CountingEnv, dir.path().join("profile.json"));
        assert!(store.profile().nickname.starts_with("User"));
        let n: u32 = store.profile().nickname[4..].parse().unwrap();
        assert!(n < 1000);
        assert_eq!(store.profile().theme, Theme::Dark);
    }

    #[test]
    fn profile_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");

        let mut store = ProfileStore::load_or_create(&CountingEnv, path.clone());
        store.set_nickname("alice").unwrap();
        store.set_theme(Theme::Light).unwrap();
        let saved = store.profile().clone();

        let reloaded = ProfileStore::load_or_create(&CountingEnv, path);
        assert_eq!(*reloaded.profile(), saved);
    }

    #[test]
    fn corrupt_file_falls_back_to_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ProfileStore::load_or_create(&CountingEnv, path);
        assert!(store.profile().nickname.starts_with("User"));
    }

    #[test]
    fn theme_toggles_both_ways() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
