use std::collections::{BTreeSet, HashSet};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::*;
use sha2::{Digest, Sha512};
use tracing::{debug, info, warn};
use tracing_unwrap::OptionExt;

use crate::api::{ModHost, Modrinth};
use crate::config::Config;
use crate::error::{Error, IoContext};
use crate::model::{ProjectType, VersionFile};
use crate::state::State;
use crate::Result as CrateResult;

/// Result of hashing everything in the install directories.
#[derive(Debug, Default)]
pub struct Scan {
    /// Expected hashes already on disk.
    pub present: HashSet<String>,
    /// Files whose content nothing in the lock file accounts for.
    pub stale: Vec<PathBuf>,
}

pub fn hash_file(path: &Path) -> CrateResult<String> {
    let mut file = std::fs::File::open(path).at(path)?;
    let mut hasher = Sha512::new();
    std::io::copy(&mut file, &mut hasher).at(path)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn scan(config: &Config, expected: &BTreeSet<String>) -> CrateResult<Scan> {
    let mut result = Scan::default();
    for kind in ProjectType::ALL {
        let dir = config.directory(kind);
        if !dir.is_dir() {
            continue;
        }
        debug!("Scanning {}", dir.display());
        for entry in std::fs::read_dir(&dir).at(&dir)? {
            let path = entry.at(&dir)?.path();
            if !path.is_file() {
                continue;
            }
            let name = path
                .file_name()
                .expect_or_log("Path is invalid!")
                .to_string_lossy();
            if config.is_manual(&name) {
                debug!("Leaving manual file {}", name);
                continue;
            }

            let hash = hash_file(&path)?;
            if expected.contains(&hash) {
                result.present.insert(hash);
            } else if kind == ProjectType::Shaderpack
                && path.extension().map_or(false, |ext| ext == "txt")
            {
                // shader settings written by the game
                debug!("Leaving {}", name);
            } else {
                result.stale.push(path);
            }
        }
    }
    Ok(result)
}

/// Makes the install directories hold exactly the files the lock file
/// names: stale files go to the trash, missing ones are downloaded.
pub async fn reconcile<H: ModHost>(host: &H, state: &State, config: &Config) -> CrateResult<()> {
    let expected = state.installed_hashes();
    let Scan { mut present, stale } = scan(config, &expected)?;

    for path in &stale {
        info!("Removing {}", path.display());
        trash::delete(path).map_err(|source| Error::Trash {
            path: path.clone(),
            source,
        })?;
    }

    if present.len() == expected.len() {
        if stale.is_empty() {
            println!("{}", "Everything is up to date".green().bold());
        } else {
            println!("Removed {} files", stale.len().to_string().red().bold());
        }
        return Ok(());
    }

    let mut downloaded = 0;
    for (project_id, project) in &state.projects {
        let Some(installed) = &project.installed else {
            continue;
        };
        if installed.file_hashes.iter().all(|h| present.contains(h)) {
            continue;
        }
        debug!("Fetching version {} of {}", installed.version_id, project_id);
        let version = host.get_version(&installed.version_id).await?;
        let shipped = version.file_hashes();
        for hash in installed.file_hashes.difference(&shipped) {
            warn!(
                "Version {} of {} no longer ships file {}, run update to pick again",
                installed.version_id, project_id, hash
            );
        }
        for file in &version.files {
            if !installed.file_hashes.contains(file.hash()) || present.contains(file.hash()) {
                continue;
            }
            let name = target_name(file)?;
            if config.is_manual(&name.to_string_lossy()) {
                warn!(
                    "Not replacing manual file {}",
                    name.to_string_lossy().yellow()
                );
                continue;
            }
            let dest = config
                .directory(ProjectType::infer(file, &version))
                .join(name);
            fetch(host, file, &dest).await?;
            println!("Installed {}", dest.display().to_string().blue().bold());
            present.insert(file.hash().to_string());
            downloaded += 1;
        }
    }

    println!(
        "Removed {} and downloaded {} files",
        stale.len().to_string().red().bold(),
        downloaded.to_string().green().bold()
    );
    Ok(())
}

/// Name a download is stored under: the last component of the host's file
/// name, never a path.
fn target_name(file: &VersionFile) -> CrateResult<&OsStr> {
    Path::new(&file.filename)
        .file_name()
        .ok_or_else(|| Error::InvalidFileName(file.filename.clone()))
}

/// Downloads `file` to `dest`, checking its SHA-512 before it lands there.
async fn fetch<H: ModHost>(host: &H, file: &VersionFile, dest: &Path) -> CrateResult<()> {
    info!("Downloading {}", file.filename);
    let bytes = host.download(file).await?;

    let actual = hex::encode(Sha512::digest(&bytes));
    if actual != file.hash() {
        return Err(Error::HashMismatch {
            file: file.filename.clone(),
            expected: file.hash().to_string(),
            actual,
        });
    }

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir).at(dir)?;
    temp.write_all(&bytes).at(temp.path())?;
    temp.persist(dest)?;
    Ok(())
}

pub async fn install(config: &Config) -> CrateResult<()> {
    config.create_directories()?;
    let state = State::load(&config.lock_path())?;
    let host = Modrinth::new()?;
    reconcile(&host, &state, config).await
}
