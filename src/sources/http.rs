//! reqwest implementation of [`PackageSource`]

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{
    ARCHITECTURE_CHECK, ArchitectureReport, DIRECTORY_SEARCH, DIRECTORY_SNAPSHOT, DirectoryEntry,
    DirectorySnapshot, PackageSource, RELEASE_LIST, ReleaseList, parse_library_list,
};
use crate::config::{Config, SourceConfig};
use crate::error::{Error, Result, SourceError};

/// Fetches every source over HTTP with a shared client
///
/// The client carries the configured request and connect timeouts, so no
/// call can hang indefinitely.
#[derive(Clone, Debug)]
pub struct HttpPackageSource {
    client: Client,
    endpoints: SourceConfig,
}

#[derive(Serialize)]
struct ArchitectureCheckRequest<'a> {
    packages: &'a [String],
}

impl HttpPackageSource {
    /// Build the HTTP client from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http.request_timeout)
            .connect_timeout(config.http.connect_timeout)
            .user_agent(config.sources.user_agent.as_str())
            .build()
            .map_err(|e| Error::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints: config.sources.clone(),
        })
    }

    /// Endpoints this source talks to
    pub fn endpoints(&self) -> &SourceConfig {
        &self.endpoints
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        source_name: &'static str,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, source_name))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                source_name,
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response)
    }

    async fn read_json(
        response: reqwest::Response,
        source_name: &'static str,
    ) -> Result<serde_json::Value> {
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, source_name))?;

        serde_json::from_slice(&body)
            .map_err(|e| SourceError::malformed(source_name, format!("not valid JSON: {e}")).into())
    }
}

/// Timeouts become [`SourceError::Timeout`]; other transport failures stay
/// [`Error::Network`] so retry classification can inspect them.
fn transport_error(error: reqwest::Error, source_name: &'static str) -> Error {
    if error.is_timeout() {
        SourceError::Timeout { source_name }.into()
    } else {
        Error::Network(error)
    }
}

#[async_trait]
impl PackageSource for HttpPackageSource {
    async fn directory_snapshot(&self) -> Result<DirectorySnapshot> {
        let request = self.client.get(&self.endpoints.directory_data_url);
        let response = self.send(request, DIRECTORY_SNAPSHOT).await?;
        let payload = Self::read_json(response, DIRECTORY_SNAPSHOT).await?;

        let entries = parse_library_list(&payload, DIRECTORY_SNAPSHOT)?;
        tracing::debug!(source = DIRECTORY_SNAPSHOT, count = entries.len(), "snapshot fetched");
        Ok(DirectorySnapshot::from_entries(entries))
    }

    async fn release_versions(&self) -> Result<ReleaseList> {
        let request = self.client.get(&self.endpoints.release_list_url);
        let response = self.send(request, RELEASE_LIST).await?;
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, RELEASE_LIST))?;

        let releases = ReleaseList::parse(&text);
        tracing::debug!(
            source = RELEASE_LIST,
            count = releases.versions().len(),
            latest = releases.latest().unwrap_or("none"),
            "release list fetched"
        );
        Ok(releases)
    }

    async fn architecture_check(&self, names: &[String]) -> Result<ArchitectureReport> {
        if names.is_empty() {
            return Ok(ArchitectureReport::default());
        }

        let request = self
            .client
            .post(&self.endpoints.architecture_check_url)
            .json(&ArchitectureCheckRequest { packages: names });
        let response = self.send(request, ARCHITECTURE_CHECK).await?;
        let payload = Self::read_json(response, ARCHITECTURE_CHECK).await?;

        let report = ArchitectureReport::parse(&payload, ARCHITECTURE_CHECK)?;
        tracing::debug!(
            source = ARCHITECTURE_CHECK,
            requested = names.len(),
            count = report.len(),
            "architecture check answered"
        );
        Ok(report)
    }

    async fn search_directory(&self, name: &str) -> Result<Vec<DirectoryEntry>> {
        let request = self
            .client
            .get(&self.endpoints.directory_search_url)
            .query(&[("search", name)]);
        let response = self.send(request, DIRECTORY_SEARCH).await?;
        let payload = Self::read_json(response, DIRECTORY_SEARCH).await?;

        parse_library_list(&payload, DIRECTORY_SEARCH)
    }
}
