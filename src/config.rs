use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, IoContext, Result};
use crate::model::ProjectType;

pub const DEFAULT_CONFIG_FILE: &str = "modsync.json";
const LOCK_FILE: &str = "modsync.lock.json";

/// The user's project list. Read once per run and never written back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub mods: Vec<String>,
    #[serde(default)]
    pub datapacks: Vec<String>,
    #[serde(default)]
    pub resourcepacks: Vec<String>,
    #[serde(default)]
    pub shaderpacks: Vec<String>,
    /// Project ids never resolved, installed, or kept in the lock file.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// File names in the install directories the installer must not touch.
    #[serde(default)]
    pub manual: Vec<String>,
    #[serde(default)]
    pub directories: Directories,

    #[serde(skip)]
    root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Directories {
    pub mods: String,
    pub datapacks: String,
    pub resourcepacks: String,
    pub shaderpacks: String,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            mods: ProjectType::Mod.plural().to_string(),
            datapacks: ProjectType::Datapack.plural().to_string(),
            resourcepacks: ProjectType::Resourcepack.plural().to_string(),
            shaderpacks: ProjectType::Shaderpack.plural().to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        debug!("Reading config from {}", path.display());
        let text = std::fs::read_to_string(path).at(path)?;
        let mut config = Config::parse(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Config, json5::Error> {
        json5::from_str(text)
    }

    /// Rebases relative directories onto `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn roots(&self, kind: ProjectType) -> &[String] {
        match kind {
            ProjectType::Mod => &self.mods,
            ProjectType::Datapack => &self.datapacks,
            ProjectType::Resourcepack => &self.resourcepacks,
            ProjectType::Shaderpack => &self.shaderpacks,
        }
    }

    pub fn is_ignored(&self, project_id: &str) -> bool {
        self.ignore.iter().any(|i| i == project_id)
    }

    pub fn is_manual(&self, file_name: &str) -> bool {
        self.manual.iter().any(|m| m == file_name)
    }

    pub fn directory(&self, kind: ProjectType) -> PathBuf {
        let dir = match kind {
            ProjectType::Mod => &self.directories.mods,
            ProjectType::Datapack => &self.directories.datapacks,
            ProjectType::Resourcepack => &self.directories.resourcepacks,
            ProjectType::Shaderpack => &self.directories.shaderpacks,
        };
        match (dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => self.root.join(dir),
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn create_directories(&self) -> Result<()> {
        for kind in ProjectType::ALL {
            let dir = self.directory(kind);
            if !dir.is_dir() {
                info!("Creating {} directory {}", kind, dir.display());
                std::fs::create_dir_all(&dir).at(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commented_config_with_trailing_commas() {
        let text = r#"{
            // mod loaders in preference order
            loaders: ["quilt", "fabric"],
            gameVersions: ["1.20.1", "1.20"],
            mods: ["AANobbMI", "P7dR8mSH",],
            shaderpacks: ["HVnmMxH1"],
            ignore: ["P7dR8mSH"],
            manual: ["local-only.jar"],
            directories: { mods: "client/mods" },
        }"#;
        let config = Config::parse(text).unwrap().with_root("/game");

        assert_eq!(config.loaders, vec!["quilt", "fabric"]);
        assert_eq!(config.roots(ProjectType::Mod).len(), 2);
        assert!(config.roots(ProjectType::Datapack).is_empty());
        assert!(config.is_ignored("P7dR8mSH"));
        assert!(config.is_manual("local-only.jar"));
        assert_eq!(
            config.directory(ProjectType::Mod),
            PathBuf::from("/game/client/mods")
        );
        assert_eq!(
            config.directory(ProjectType::Shaderpack),
            PathBuf::from("/game/shaderpacks")
        );
        assert_eq!(config.lock_path(), PathBuf::from("/game/modsync.lock.json"));
    }

    #[test]
    fn load_reports_path_on_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ loaders: [").unwrap();
        match Config::load(&path) {
            Err(Error::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn create_directories_makes_every_type_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_root(dir.path());
        config.create_directories().unwrap();
        for kind in ProjectType::ALL {
            assert!(dir.path().join(kind.plural()).is_dir());
        }
    }
}
