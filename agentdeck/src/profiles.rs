//! Feed profiles: load/save a JSON mapping of profile name -> { source, refresh_secs }
//! Stored under XDG config dir: $XDG_CONFIG_HOME/agentdeck/profiles.json (fallback ~/.config/agentdeck/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    /// Snapshot file path, or "demo".
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("agentdeck")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentdeck")
    }
}

/// Where the log file goes: $XDG_STATE_HOME/agentdeck, else the config dir.
pub fn state_dir() -> PathBuf {
    match std::env::var_os("XDG_STATE_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("agentdeck"),
        _ => config_dir(),
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable profiles file");
            ProfilesFile::default()
        }),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> std::io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(path, data)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (not persisted yet).
    Direct(ProfileEntry),
    /// Loaded from an existing profile entry
    Loaded(ProfileEntry),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// No profile could be resolved (e.g., missing arguments)
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub source: Option<String>,
    pub refresh_secs: Option<u64>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        match (self.profile_name, self.source) {
            // Only profile name given -> try load
            (Some(name), None) => match pf.profiles.get(&name) {
                Some(entry) => {
                    let mut entry = entry.clone();
                    if self.refresh_secs.is_some() {
                        entry.refresh_secs = self.refresh_secs;
                    }
                    ResolveProfile::Loaded(entry)
                }
                None => ResolveProfile::PromptCreate(name),
            },
            // Source provided -> direct (maybe later saved by caller)
            (_, Some(source)) => ResolveProfile::Direct(ProfileEntry {
                source,
                refresh_secs: self.refresh_secs,
            }),
            // Nothing provided -> maybe prompt select if profiles exist
            (None, None) => {
                if pf.profiles.is_empty() {
                    ResolveProfile::None
                } else {
                    ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(name: &str, source: &str) -> ProfilesFile {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            name.into(),
            ProfileEntry {
                source: source.into(),
                refresh_secs: Some(5),
            },
        );
        pf
    }

    fn req(name: Option<&str>, source: Option<&str>) -> ProfileRequest {
        ProfileRequest {
            profile_name: name.map(str::to_string),
            source: source.map(str::to_string),
            refresh_secs: None,
        }
    }

    #[test]
    fn name_only_loads_or_prompts_create() {
        let pf = file_with("prod", "/srv/fleet.json");
        match req(Some("prod"), None).resolve(&pf) {
            ResolveProfile::Loaded(e) => {
                assert_eq!(e.source, "/srv/fleet.json");
                assert_eq!(e.refresh_secs, Some(5));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            req(Some("dev"), None).resolve(&pf),
            ResolveProfile::PromptCreate("dev".into())
        );
    }

    #[test]
    fn source_wins_and_nothing_prompts_select() {
        let pf = file_with("prod", "/srv/fleet.json");
        assert!(matches!(
            req(Some("prod"), Some("/tmp/x.json")).resolve(&pf),
            ResolveProfile::Direct(ProfileEntry { ref source, .. }) if source == "/tmp/x.json"
        ));
        assert_eq!(
            req(None, None).resolve(&pf),
            ResolveProfile::PromptSelect(vec!["prod".into()])
        );
        assert_eq!(req(None, None).resolve(&ProfilesFile::default()), ResolveProfile::None);
    }
}
