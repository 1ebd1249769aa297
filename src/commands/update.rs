use std::collections::{BTreeSet, HashMap, HashSet};

use colored::*;
use futures::future::{FutureExt, LocalBoxFuture};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::api::{ModHost, Modrinth};
use crate::config::Config;
use crate::model::{Dependency, Project, ProjectType, Version};
use crate::prompt::{Answer, InquirePrompter, Prompter};
use crate::select::select;
use crate::state::{InstalledVersion, ProjectState, State};
use crate::Result as CrateResult;

/// Walks the configured projects and their required dependencies, asking
/// which versions to install and recording the answers in a new `State`.
pub struct Updater<'a, H, P> {
    host: &'a H,
    prompter: &'a mut P,
    config: &'a Config,
    show_changelog: bool,
    state: State,
    checked: HashSet<String>,
    /// Required dependencies of each checked project's installed version.
    dependencies: HashMap<String, Vec<Dependency>>,
}

impl<'a, H: ModHost, P: Prompter> Updater<'a, H, P> {
    pub fn new(host: &'a H, prompter: &'a mut P, config: &'a Config, state: State) -> Self {
        Self {
            host,
            prompter,
            config,
            show_changelog: false,
            state,
            checked: HashSet::new(),
            dependencies: HashMap::new(),
        }
    }

    pub fn show_changelog(mut self, show: bool) -> Self {
        self.show_changelog = show;
        self
    }

    pub async fn run(mut self) -> CrateResult<State> {
        let config = self.config;
        for kind in ProjectType::ALL {
            for project_id in config.roots(kind) {
                self.visit(project_id.clone(), kind, false).await?;
            }
        }
        let mut state = self.state;
        state.prune(&self.checked, &config.ignore);
        Ok(state)
    }

    fn visit(
        &mut self,
        project_id: String,
        kind: ProjectType,
        dependency: bool,
    ) -> LocalBoxFuture<'_, CrateResult<()>> {
        async move {
            if self.checked.contains(&project_id) {
                return self.revisit(&project_id, kind).await;
            }
            self.checked.insert(project_id.clone());

            if self.config.is_ignored(&project_id) {
                info!("Ignoring {}", project_id);
                return Ok(());
            }

            let project = self.host.get_project(&project_id).await?;
            debug!("Checking {} {} ({})", kind, project.title, project.id);
            let mut entry = self.state.projects.remove(&project_id).unwrap_or_default();

            let loaders = kind.loaders(self.config);
            let game_versions = &self.config.game_versions;
            let available = self
                .host
                .get_versions(&project_id, &loaders, game_versions)
                .await?;
            let candidates: Vec<Version> = select(available, &loaders, game_versions)
                .into_iter()
                .filter(|v| !entry.is_skipped(&v.id))
                .collect();

            if candidates.is_empty() {
                warn!("No compatible versions of {} found", project.title);
            } else {
                self.decide(&project, &candidates, &mut entry, dependency)?;
            }

            let dependencies: Vec<Dependency> = match entry.installed_id().map(str::to_string) {
                Some(version_id) => match candidates.iter().find(|v| v.id == version_id) {
                    Some(version) => version.required_dependencies().cloned().collect(),
                    None => self
                        .host
                        .get_version(&version_id)
                        .await?
                        .required_dependencies()
                        .cloned()
                        .collect(),
                },
                None => Vec::new(),
            };
            self.state.projects.insert(project_id.clone(), entry);
            self.dependencies
                .insert(project_id.clone(), dependencies.clone());

            for dependency in dependencies {
                match self.host.dependency_project_id(&dependency).await? {
                    Some(dependency_id) => self.visit(dependency_id, kind, true).await?,
                    None => warn!("Dependency of {} names no project or version", project.title),
                }
            }
            Ok(())
        }
        .boxed_local()
    }

    /// A project reached a second time is not decided again, but any of its
    /// dependencies not yet checked still get their turn.
    async fn revisit(&mut self, project_id: &str, kind: ProjectType) -> CrateResult<()> {
        let Some(dependencies) = self.dependencies.get(project_id).cloned() else {
            return Ok(());
        };
        for dependency in dependencies {
            if let Some(dependency_id) = self.host.dependency_project_id(&dependency).await? {
                if !self.checked.contains(&dependency_id) {
                    self.visit(dependency_id, kind, true).await?;
                }
            }
        }
        Ok(())
    }

    fn decide(
        &mut self,
        project: &Project,
        candidates: &[Version],
        entry: &mut ProjectState,
        dependency: bool,
    ) -> CrateResult<()> {
        let latest = &candidates[0];
        if let Some(installed) = &entry.installed {
            if installed.version_id == latest.id {
                if installed.file_hashes.is_subset(&latest.file_hashes()) {
                    debug!("{} is up to date", project.title);
                    return Ok(());
                }
                warn!(
                    "Files of installed {} {} changed upstream",
                    project.title, latest.version_number
                );
                entry.installed = None;
            }
        }

        if self.show_changelog {
            print_changelogs(project, candidates, entry.installed_id());
        }

        let mut skipped = Vec::new();
        for version in candidates {
            let question = format!(
                "Install {}{} {}{} for {}? [y/N/s]",
                if dependency { "dependency " } else { "" },
                project.title.bold(),
                version.version_number.blue(),
                if entry.installed_id() == Some(version.id.as_str()) {
                    " (installed)"
                } else {
                    ""
                },
                version.game_versions.join(", "),
            );
            match Answer::parse(&self.prompter.read_line(&question)?) {
                Answer::Install => {
                    let file_hashes = self.choose_files(version)?;
                    if file_hashes.is_empty() {
                        warn!(
                            "Nothing selected from {} {}",
                            project.title, version.version_number
                        );
                        continue;
                    }
                    info!("Selected {} {}", project.title, version.version_number);
                    entry.installed = Some(InstalledVersion {
                        version_id: version.id.clone(),
                        file_hashes,
                    });
                    entry.skipped = skipped;
                    return Ok(());
                }
                Answer::Skip => skipped.push(version.id.clone()),
                Answer::Decline => {}
            }
        }

        let installed = entry.installed_id().map(str::to_string);
        entry.skipped = std::mem::take(&mut entry.skipped)
            .into_iter()
            .chain(skipped)
            .filter(|id| Some(id) != installed.as_ref())
            .unique()
            .collect();
        Ok(())
    }

    /// Hashes of the files to install from `version`. Multi-file versions
    /// ask per file, primary file first.
    fn choose_files(&mut self, version: &Version) -> CrateResult<BTreeSet<String>> {
        match version.files.as_slice() {
            [] => {
                warn!("Version {} has no files", version.version_number);
                Ok(BTreeSet::new())
            }
            [only] => Ok(BTreeSet::from([only.hash().to_string()])),
            files => {
                let mut chosen = BTreeSet::new();
                for file in files.iter().sorted_by_key(|f| !f.primary) {
                    let question = format!(
                        "Install file {}{}? [y/N]",
                        file.filename.bold(),
                        if file.primary { " (primary)" } else { "" }
                    );
                    if Answer::parse(&self.prompter.read_line(&question)?) == Answer::Install {
                        chosen.insert(file.hash().to_string());
                    }
                }
                Ok(chosen)
            }
        }
    }
}

/// Candidates newer than the installed version. Candidates are newest
/// first, so this stops at the installed id.
fn changelog_versions<'v>(
    candidates: &'v [Version],
    installed: Option<&'v str>,
) -> impl Iterator<Item = &'v Version> {
    candidates
        .iter()
        .take_while(move |v| Some(v.id.as_str()) != installed)
}

fn print_changelogs(project: &Project, candidates: &[Version], installed: Option<&str>) {
    for version in changelog_versions(candidates, installed) {
        println!("{} {}", project.title.bold(), version.version_number.blue().bold());
        match version.changelog.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => println!("{}", text),
            _ => println!("{}", "No changelog".dimmed()),
        }
        println!();
    }
}

pub async fn update(config: &Config, show_changelog: bool) -> CrateResult<()> {
    config.create_directories()?;
    let lock_path = config.lock_path();
    let previous = State::load(&lock_path)?;

    let host = Modrinth::new()?;
    let mut prompter = InquirePrompter;
    let state = Updater::new(&host, &mut prompter, config, previous)
        .show_changelog(show_changelog)
        .run()
        .await?;

    info!("Saving state to {}", lock_path.display());
    state.save(&lock_path)?;
    super::install::reconcile(&host, &state, config).await
}
