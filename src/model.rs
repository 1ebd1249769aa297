use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub project_id: String,
    pub version_number: String,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    pub date_published: DateTime<Utc>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

impl Version {
    /// SHA-512 digests of every file this version ships.
    pub fn file_hashes(&self) -> BTreeSet<String> {
        self.files.iter().map(|f| f.hashes.sha512.clone()).collect()
    }

    pub fn required_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.dependency_type == DependencyType::Required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub dependency_type: DependencyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
    pub hashes: FileHashes,
}

impl VersionFile {
    pub fn hash(&self) -> &str {
        &self.hashes.sha512
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    pub sha512: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// The kinds of content modsync manages. Each kind maps to a fixed loader
/// set and an install directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectType {
    Mod,
    Datapack,
    Resourcepack,
    Shaderpack,
}

const SHADER_LOADERS: [&str; 4] = ["iris", "optifine", "canvas", "vanilla"];

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Mod,
        ProjectType::Datapack,
        ProjectType::Resourcepack,
        ProjectType::Shaderpack,
    ];

    pub fn loaders(self, config: &Config) -> Vec<String> {
        match self {
            ProjectType::Mod => config.loaders.clone(),
            ProjectType::Datapack => vec!["datapack".to_string()],
            ProjectType::Resourcepack => vec!["minecraft".to_string()],
            ProjectType::Shaderpack => SHADER_LOADERS.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ProjectType::Mod => "mods",
            ProjectType::Datapack => "datapacks",
            ProjectType::Resourcepack => "resourcepacks",
            ProjectType::Shaderpack => "shaderpacks",
        }
    }

    /// Best-effort guess of where a downloaded file belongs. The lock file
    /// carries no type information, so this looks at the file extension
    /// first and the version's loaders second.
    pub fn infer(file: &VersionFile, version: &Version) -> ProjectType {
        let has_loader = |name: &str| version.loaders.iter().any(|l| l == name);
        if file.filename.to_ascii_lowercase().ends_with(".jar") {
            ProjectType::Mod
        } else if has_loader("minecraft") {
            ProjectType::Resourcepack
        } else if has_loader("datapack") {
            ProjectType::Datapack
        } else {
            ProjectType::Shaderpack
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProjectType::Mod => write!(f, "mod"),
            ProjectType::Datapack => write!(f, "datapack"),
            ProjectType::Resourcepack => write!(f, "resourcepack"),
            ProjectType::Shaderpack => write!(f, "shaderpack"),
        }
    }
}
