use anyhow::{Context, Result};
use async_trait::async_trait;
use parley::model::DirectoryEntry;

/// Looks people up by name or email so there is an id to call.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<DirectoryEntry>>;
}

/// Directory served over HTTP as `GET {base}/users?search=...`.
///
/// `ureq` blocks, so each request runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn search(&self, query: &str) -> Result<Vec<DirectoryEntry>> {
        let url = self.users_url();
        let query = query.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut response = ureq::get(&url)
                .query("search", &query)
                .call()
                .with_context(|| format!("Directory request to {} failed", url))?;
            response
                .body_mut()
                .read_json::<Vec<DirectoryEntry>>()
                .context("Directory returned an unexpected body")
        })
        .await?
    }
}
