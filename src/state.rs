use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, IoContext, Result};

/// The lock file: what is installed per project and what the user skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    pub projects: BTreeMap<String, ProjectState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Version ids the user declined with "skip", oldest decision first.
    #[serde(default)]
    pub skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<InstalledVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledVersion {
    pub version_id: String,
    pub file_hashes: BTreeSet<String>,
}

impl ProjectState {
    pub fn installed_id(&self) -> Option<&str> {
        self.installed.as_ref().map(|i| i.version_id.as_str())
    }

    pub fn is_skipped(&self, version_id: &str) -> bool {
        self.skipped.iter().any(|s| s == version_id)
    }
}

impl State {
    /// Reads the lock file, or starts empty when there is none yet.
    pub fn load(path: &Path) -> Result<State> {
        if !path.is_file() {
            debug!("No state file at {}, starting fresh", path.display());
            return Ok(State::default());
        }
        let text = std::fs::read_to_string(path).at(path)?;
        serde_json::from_str(&text).map_err(|source| Error::State {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replaces the lock file in one step so an interrupted write never
    /// leaves a truncated file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).at(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n").at(file.path())?;
        file.persist(path)?;
        debug!("Saved state for {} projects", self.projects.len());
        Ok(())
    }

    #[cfg(test)]
    pub fn get(&self, project_id: &str) -> Option<&ProjectState> {
        self.projects.get(project_id)
    }

    /// Drops every entry not visited this run, and every ignored entry.
    pub fn prune(&mut self, checked: &HashSet<String>, ignored: &[String]) {
        self.projects
            .retain(|id, _| checked.contains(id) && !ignored.contains(id));
    }

    pub fn installed_hashes(&self) -> BTreeSet<String> {
        self.projects
            .values()
            .filter_map(|p| p.installed.as_ref())
            .flat_map(|i| i.file_hashes.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> State {
        let mut state = State::default();
        state.projects.insert(
            "AANobbMI".into(),
            ProjectState {
                skipped: vec!["old1".into()],
                installed: Some(InstalledVersion {
                    version_id: "v2".into(),
                    file_hashes: ["h2".to_string(), "h1".to_string()].into(),
                }),
            },
        );
        state.projects.insert(
            "P7dR8mSH".into(),
            ProjectState {
                skipped: vec!["x".into()],
                installed: None,
            },
        );
        state
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("modsync.lock.json")).unwrap();
        assert!(state.projects.is_empty());
    }

    #[test]
    fn save_writes_camel_case_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modsync.lock.json");
        sample().save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["AANobbMI"]["installed"]["versionId"], "v2");
        assert_eq!(
            value["AANobbMI"]["installed"]["fileHashes"],
            serde_json::json!(["h1", "h2"])
        );
        assert_eq!(value["P7dR8mSH"]["skipped"], serde_json::json!(["x"]));
        assert!(value["P7dR8mSH"].get("installed").is_none());

        assert_eq!(State::load(&path).unwrap(), sample());
    }

    #[test]
    fn saving_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modsync.lock.json");
        sample().save(&path).unwrap();
        let first = std::fs::read(&path).unwrap();
        State::load(&path).unwrap().save(&path).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
    }

    #[test]
    fn malformed_state_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modsync.lock.json");
        std::fs::write(&path, "{\"a\": {\"skipped\": 3}}").unwrap();
        assert!(matches!(State::load(&path), Err(Error::State { .. })));
    }

    #[test]
    fn prune_keeps_only_checked_and_unignored() {
        let mut state = sample();
        state.projects.insert("gone".into(), ProjectState::default());
        let checked: HashSet<String> = ["AANobbMI", "P7dR8mSH"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        state.prune(&checked, &["P7dR8mSH".to_string()]);
        assert_eq!(state.projects.keys().collect::<Vec<_>>(), vec!["AANobbMI"]);
    }

    #[test]
    fn installed_hashes_unions_every_project() {
        let hashes = sample().installed_hashes();
        assert_eq!(hashes.into_iter().collect::<Vec<_>>(), vec!["h1", "h2"]);
    }
}
