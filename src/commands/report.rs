use std::collections::{BTreeMap, HashMap, HashSet};

use colored::*;
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{debug, info, warn};

use crate::api::{ModHost, Modrinth};
use crate::config::Config;
use crate::model::{Dependency, ProjectType};
use crate::select::select;
use crate::Result as CrateResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub id: String,
    pub title: String,
    pub kind: ProjectType,
    /// Only reached as someone's required dependency.
    pub dependency: bool,
    pub compatible: bool,
    pub ignored: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub pass: usize,
    pub fail: usize,
}

impl Tally {
    fn add(&mut self, compatible: bool) {
        if compatible {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub by_kind: BTreeMap<ProjectType, Tally>,
    pub dependencies: Tally,
    pub total: Tally,
}

#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for entry in self.entries.iter().filter(|e| !e.ignored) {
            summary
                .by_kind
                .entry(entry.kind)
                .or_default()
                .add(entry.compatible);
            if entry.dependency {
                summary.dependencies.add(entry.compatible);
            }
            summary.total.add(entry.compatible);
        }
        summary
    }
}

/// Checks whether every configured project (and its required dependencies)
/// has a build for the given game versions. Reads nothing from and writes
/// nothing to the lock file.
pub struct Reporter<'a, H> {
    host: &'a H,
    config: &'a Config,
    game_versions: &'a [String],
    checked: HashSet<String>,
    dependencies: HashMap<String, Vec<Dependency>>,
    report: Report,
}

impl<'a, H: ModHost> Reporter<'a, H> {
    pub fn new(host: &'a H, config: &'a Config, game_versions: &'a [String]) -> Self {
        Self {
            host,
            config,
            game_versions,
            checked: HashSet::new(),
            dependencies: HashMap::new(),
            report: Report::default(),
        }
    }

    pub async fn run(mut self) -> CrateResult<Report> {
        let config = self.config;
        for kind in ProjectType::ALL {
            for project_id in config.roots(kind) {
                self.visit(project_id.clone(), kind, false).await?;
            }
        }
        Ok(self.report)
    }

    fn visit(
        &mut self,
        project_id: String,
        kind: ProjectType,
        dependency: bool,
    ) -> LocalBoxFuture<'_, CrateResult<()>> {
        async move {
            if !self.checked.insert(project_id.clone()) {
                let dependencies = self
                    .dependencies
                    .get(&project_id)
                    .cloned()
                    .unwrap_or_default();
                for dependency in dependencies {
                    if let Some(id) = self.host.dependency_project_id(&dependency).await? {
                        if !self.checked.contains(&id) {
                            self.visit(id, kind, true).await?;
                        }
                    }
                }
                return Ok(());
            }

            if self.config.is_ignored(&project_id) {
                info!("Ignoring {}", project_id);
                self.report.entries.push(ReportEntry {
                    title: project_id.clone(),
                    id: project_id,
                    kind,
                    dependency,
                    compatible: false,
                    ignored: true,
                });
                return Ok(());
            }

            let project = self.host.get_project(&project_id).await?;
            let loaders = kind.loaders(self.config);
            let available = self
                .host
                .get_versions(&project_id, &loaders, self.game_versions)
                .await?;
            let candidates = select(available, &loaders, self.game_versions);
            debug!("{} has {} compatible versions", project.title, candidates.len());

            self.report.entries.push(ReportEntry {
                id: project.id.clone(),
                title: project.title.clone(),
                kind,
                dependency,
                compatible: !candidates.is_empty(),
                ignored: false,
            });

            let dependencies: Vec<Dependency> = candidates
                .first()
                .map(|v| v.required_dependencies().cloned().collect())
                .unwrap_or_default();
            self.dependencies
                .insert(project_id.clone(), dependencies.clone());

            for dependency in dependencies {
                match self.host.dependency_project_id(&dependency).await? {
                    Some(id) => self.visit(id, kind, true).await?,
                    None => warn!("Dependency of {} names no project or version", project.title),
                }
            }
            Ok(())
        }
        .boxed_local()
    }
}

fn print_report(report: &Report, game_versions: &[String]) {
    let title_corner = boxy::Char::upper_left(boxy::Weight::Thick);
    let title_side_h = boxy::Char::horizontal(boxy::Weight::Thick).to_string();
    let title_side_v = boxy::Char::vertical(boxy::Weight::Thick);
    let title_branch = boxy::Char::right_tee(boxy::Weight::Thick).down(boxy::Weight::Normal);
    let left_branch_more_str = boxy::Char::right_tee(boxy::Weight::Normal).to_string();
    let left_branch_done_str = boxy::Char::lower_left(boxy::Weight::Normal).to_string();
    let left_node = boxy::Char::left_half(boxy::Weight::Normal);

    for kind in ProjectType::ALL {
        let entries: Vec<_> = report.entries.iter().filter(|e| e.kind == kind).collect();
        if entries.is_empty() {
            continue;
        }
        let heading = kind.plural();
        println!(
            "{}{}{}",
            title_corner,
            title_side_h.repeat(heading.len() + 2),
            title_corner.rotate_cw(1)
        );
        println!("{} {} {}", title_side_v, heading.bold(), title_side_v);
        println!(
            "{}{}{}",
            title_branch,
            title_side_h.repeat(heading.len() + 2),
            title_corner.rotate_cw(2)
        );

        let mut entries = entries.into_iter().peekable();
        while let Some(entry) = entries.next() {
            let status = if entry.ignored {
                "ignored".dimmed()
            } else if entry.compatible {
                "ok".green().bold()
            } else {
                "missing".red().bold()
            };
            println!(
                "{}{}{} [{}]{}",
                if entries.peek().is_some() {
                    &left_branch_more_str
                } else {
                    &left_branch_done_str
                },
                left_node,
                entry.title,
                status,
                if entry.dependency { " (dependency)" } else { "" }
            );
        }
    }

    let summary = report.summary();
    println!();
    println!("Compatibility with {}:", game_versions.join(", ").bold());
    for (kind, tally) in &summary.by_kind {
        println!(
            "  {:<14} {} ok, {} missing",
            kind.plural(),
            tally.pass.to_string().green(),
            tally.fail.to_string().red()
        );
    }
    println!(
        "  {:<14} {} ok, {} missing",
        "dependencies",
        summary.dependencies.pass.to_string().green(),
        summary.dependencies.fail.to_string().red()
    );
    println!(
        "  {:<14} {} ok, {} missing",
        "total".bold(),
        summary.total.pass.to_string().green().bold(),
        summary.total.fail.to_string().red().bold()
    );
}

pub async fn report(config: &Config, game_versions: Vec<String>) -> CrateResult<()> {
    let host = Modrinth::new()?;
    let report = Reporter::new(&host, config, &game_versions).run().await?;
    print_report(&report, &game_versions);
    Ok(())
}
