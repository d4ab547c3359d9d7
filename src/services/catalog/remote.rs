use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::CatalogSource;
use crate::models::CatalogData;

pub struct RemoteCatalog {
    client: reqwest::Client,
    url: String,
}

impl RemoteCatalog {
    pub fn new(url: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build catalog HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    async fn fetch(&self) -> anyhow::Result<CatalogData> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("catalog request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("catalog source returned {status}: {text}");
        }

        let data: CatalogData = resp.json().await.context("invalid catalog payload")?;
        Ok(data)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
