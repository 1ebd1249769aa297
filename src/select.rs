use tracing::debug;

use crate::model::Version;

/// Orders `versions` by preference: loader order first, then game version
/// order, newest first within each (loader, game version) group. Versions
/// matching none of the requested pairs are dropped, and a version that
/// matches several pairs is only kept in the first group it lands in.
pub fn select(versions: Vec<Version>, loaders: &[String], game_versions: &[String]) -> Vec<Version> {
    let mut pool = versions;
    let mut selected = Vec::with_capacity(pool.len());

    for loader in loaders {
        for game_version in game_versions {
            let (mut group, rest): (Vec<_>, Vec<_>) = pool.into_iter().partition(|v| {
                v.loaders.contains(loader) && v.game_versions.contains(game_version)
            });
            pool = rest;

            if group.is_empty() && selected.is_empty() {
                debug!("No versions for loader {} on {}", loader, game_version);
            }

            group.sort_by(|a, b| b.date_published.cmp(&a.date_published));
            selected.append(&mut group);
        }
    }
    selected
}
