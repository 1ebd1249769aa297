use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::model::{Dependency, Project, Version, VersionFile};

const API_BASE: &str = "https://api.modrinth.com/v2/";
const APP_USER_AGENT: &str = concat!("modsync/", env!("CARGO_PKG_VERSION"));

/// Once this few requests remain in the window, wait for it to reset.
const RATE_LIMIT_THRESHOLD: u64 = 2;

/// Read-only queries against the mod host, plus file download.
#[async_trait]
pub trait ModHost: Send + Sync {
    async fn get_project(&self, id: &str) -> Result<Project>;

    async fn get_versions(
        &self,
        project_id: &str,
        loaders: &[String],
        game_versions: &[String],
    ) -> Result<Vec<Version>>;

    async fn get_version(&self, version_id: &str) -> Result<Version>;

    async fn download(&self, file: &VersionFile) -> Result<Vec<u8>>;

    /// The project a dependency points at. Dependencies that only name a
    /// version need a lookup of that version.
    async fn dependency_project_id(&self, dependency: &Dependency) -> Result<Option<String>> {
        if let Some(project_id) = &dependency.project_id {
            return Ok(Some(project_id.clone()));
        }
        match &dependency.version_id {
            Some(version_id) => Ok(Some(self.get_version(version_id).await?.project_id)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    description: String,
}

/// Client for the Modrinth v2 API.
pub struct Modrinth {
    client: Client,
    base: Url,
}

impl Modrinth {
    pub fn new() -> Result<Self> {
        Self::with_base(API_BASE)
    }

    pub fn with_base(base: &str) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            client,
            base: Url::parse(base)?,
        })
    }

    async fn send(&self, url: Url) -> Result<Response> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(e) => Error::Api {
                    code: e.error,
                    description: e.description,
                },
                Err(_) => Error::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
            });
        }
        if let Some(wait) = rate_limit_wait(response.headers()) {
            warn!("Rate limit nearly exhausted, waiting {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        Ok(self.send(url).await?.json().await?)
    }
}

/// How long to pause before the next request, judging by the rate limit
/// headers of the last response.
fn rate_limit_wait(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &str| -> Option<u64> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };
    let remaining = header("x-ratelimit-remaining")?;
    if remaining > RATE_LIMIT_THRESHOLD {
        return None;
    }
    header("x-ratelimit-reset").map(Duration::from_secs)
}

fn json_list(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

#[async_trait]
impl ModHost for Modrinth {
    async fn get_project(&self, id: &str) -> Result<Project> {
        let url = self.base.join(&format!("project/{}", id))?;
        self.get_json(url).await
    }

    async fn get_versions(
        &self,
        project_id: &str,
        loaders: &[String],
        game_versions: &[String],
    ) -> Result<Vec<Version>> {
        let mut url = self.base.join(&format!("project/{}/version", project_id))?;
        url.query_pairs_mut()
            .append_pair("loaders", &json_list(loaders)?)
            .append_pair("game_versions", &json_list(game_versions)?);
        self.get_json(url).await
    }

    async fn get_version(&self, version_id: &str) -> Result<Version> {
        let url = self.base.join(&format!("version/{}", version_id))?;
        self.get_json(url).await
    }

    async fn download(&self, file: &VersionFile) -> Result<Vec<u8>> {
        let url = Url::parse(&file.url)?;
        let bytes = self.send(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
