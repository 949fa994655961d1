//! API key and folder settings (made by FontLab https://www.fontlab.com/)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "GOOGLE_FONTS_API_KEY";
pub const SETTINGS_FILE: &str = "appsettings.json";

/// Contents of `appsettings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "APIKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Where `appsettings.json` is looked for: the working directory, then
    /// the directory holding the executable.
    pub fn search_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Ok(cwd) = env::current_dir() {
            dirs.push(cwd);
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if !dirs.contains(&exe_dir) {
                dirs.push(exe_dir);
            }
        }
        dirs
    }

    /// First readable settings file among `dirs`; unreadable or missing
    /// files are skipped.
    pub fn discover(dirs: &[PathBuf]) -> Option<Self> {
        dirs.iter()
            .map(|dir| dir.join(SETTINGS_FILE))
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load_from(&path) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    debug!("ignoring {}: {err}", path.display());
                    None
                }
            })
    }
}

/// Resolve the API key from the environment or a settings file. `None`
/// means the caller has to ask the user.
pub fn resolve_api_key() -> Option<String> {
    resolve_api_key_from(env::var(API_KEY_ENV).ok(), &Settings::search_dirs())
}

pub fn resolve_api_key_from(env_value: Option<String>, dirs: &[PathBuf]) -> Option<String> {
    non_empty(env_value).or_else(|| {
        let key = Settings::discover(dirs).and_then(|s| non_empty(s.api_key));
        if key.is_none() {
            debug!("no API key in {API_KEY_ENV} or {SETTINGS_FILE}");
        }
        key
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `<Desktop>/GoogleFonts`, falling back to the home directory and then the
/// working directory.
pub fn default_destination() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("GoogleFonts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn environment_value_wins() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join(SETTINGS_FILE), r#"{"APIKey": "from-file"}"#).expect("write");

        let key = resolve_api_key_from(Some("from-env".into()), &[tmp.path().to_path_buf()]);
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn falls_back_to_first_settings_file() {
        let first = tempdir().expect("tempdir");
        let second = tempdir().expect("tempdir");
        fs::write(second.path().join(SETTINGS_FILE), r#"{"APIKey": " abc "}"#).expect("write");

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(resolve_api_key_from(Some("  ".into()), &dirs).as_deref(), Some("abc"));
    }

    #[test]
    fn missing_or_broken_settings_are_not_fatal() {
        let tmp = tempdir().expect("tempdir");
        assert_eq!(resolve_api_key_from(None, &[tmp.path().to_path_buf()]), None);

        fs::write(tmp.path().join(SETTINGS_FILE), "{broken").expect("write");
        assert_eq!(resolve_api_key_from(None, &[tmp.path().to_path_buf()]), None);

        fs::write(tmp.path().join(SETTINGS_FILE), r#"{"Other": 1}"#).expect("write");
        assert_eq!(resolve_api_key_from(None, &[tmp.path().to_path_buf()]), None);
    }

    #[test]
    fn default_destination_ends_in_google_fonts() {
        assert!(default_destination().ends_with("GoogleFonts"));
    }
}
