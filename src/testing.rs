//! In-memory stand-ins for the mod host and the terminal.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::ModHost;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Dependency, DependencyType, FileHashes, Project, Version, VersionFile};
use crate::prompt::Prompter;

pub fn version(project: &str, id: &str, loaders: &[&str], games: &[&str], day: i64) -> Version {
    Version {
        id: id.to_string(),
        project_id: project.to_string(),
        version_number: format!("{}-{}", project, id),
        changelog: None,
        loaders: loaders.iter().map(|s| s.to_string()).collect(),
        game_versions: games.iter().map(|s| s.to_string()).collect(),
        date_published: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(day),
        dependencies: Vec::new(),
        files: vec![file(&format!("{}.jar", id), &format!("hash-{}", id), true)],
    }
}

pub fn file(name: &str, hash: &str, primary: bool) -> VersionFile {
    VersionFile {
        url: format!("https://cdn.example/{}", name),
        filename: name.to_string(),
        primary,
        hashes: FileHashes {
            sha512: hash.to_string(),
            sha1: None,
        },
    }
}

pub fn config(mods: &[&str]) -> Config {
    let mut config = Config::default();
    config.loaders = vec!["fabric".to_string()];
    config.game_versions = vec!["1.20.1".to_string()];
    config.mods = mods.iter().map(|s| s.to_string()).collect();
    config
}

pub fn requires(project_id: &str) -> Dependency {
    Dependency {
        version_id: None,
        project_id: Some(project_id.to_string()),
        dependency_type: DependencyType::Required,
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub projects: HashMap<String, Project>,
    pub versions: HashMap<String, Version>,
    pub contents: HashMap<String, Vec<u8>>,
    pub version_calls: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn with_version(mut self, version: Version) -> Self {
        self.projects
            .entry(version.project_id.clone())
            .or_insert_with(|| Project {
                id: version.project_id.clone(),
                title: format!("Project {}", version.project_id),
            });
        self.versions.insert(version.id.clone(), version);
        self
    }

    pub fn with_content(mut self, url: &str, bytes: &[u8]) -> Self {
        self.contents.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// How often `get_versions` was asked about `project_id`.
    pub fn lookups(&self, project_id: &str) -> usize {
        self.version_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == project_id)
            .count()
    }
}

#[async_trait]
impl ModHost for FakeHost {
    async fn get_project(&self, id: &str) -> Result<Project> {
        self.projects.get(id).cloned().ok_or_else(|| Error::Api {
            code: "not_found".into(),
            description: format!("no project {}", id),
        })
    }

    async fn get_versions(
        &self,
        project_id: &str,
        loaders: &[String],
        game_versions: &[String],
    ) -> Result<Vec<Version>> {
        self.version_calls.lock().unwrap().push(project_id.to_string());
        Ok(self
            .versions
            .values()
            .filter(|v| v.project_id == project_id)
            .filter(|v| v.loaders.iter().any(|l| loaders.contains(l)))
            .filter(|v| v.game_versions.iter().any(|g| game_versions.contains(g)))
            .cloned()
            .collect())
    }

    async fn get_version(&self, version_id: &str) -> Result<Version> {
        self.versions.get(version_id).cloned().ok_or_else(|| Error::Api {
            code: "not_found".into(),
            description: format!("no version {}", version_id),
        })
    }

    async fn download(&self, file: &VersionFile) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(file.filename.clone());
        self.contents.get(&file.url).cloned().ok_or_else(|| Error::Status {
            url: file.url.clone(),
            status: 404,
        })
    }
}

/// Answers prompts from a fixed script and records what was asked.
/// Running out of answers behaves like a closed stdin.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::Input("input stream closed".into()))
    }
}
