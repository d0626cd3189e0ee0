//! REST implementation of the storage backend.

use crate::opts::StorageClientOpts;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::path::Path;
use storage_sink::{
    CreateTableOptions, Result, StorageBackend, StorageError, TableDetail, TokenInfo,
    WriteTableOptions,
};

const TOKEN_HEADER: &str = "X-StorageApi-Token";
const USER_AGENT: &str = concat!("storage-writer/", env!("CARGO_PKG_VERSION"));

/// Error document returned by the service on failure.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

/// Storage service client bound to a single token.
pub struct StorageClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl StorageClient {
    pub fn new(opts: &StorageClientOpts) -> Result<Self> {
        let http = Client::builder()
            .timeout(opts.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StorageError::Transport(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(&opts.url).map_err(|e| {
            StorageError::Transport(format!("Invalid storage URL \"{}\": {e}", opts.url))
        })?;

        Ok(Self {
            http,
            base_url,
            token: opts.token.clone(),
        })
    }

    /// Build `<base>/v2/storage/<segments>`, percent-encoding every segment
    /// so ids cannot change the request path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::Transport(format!("Invalid storage URL \"{}\"", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v2", "storage"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<Response> {
        let response = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| StorageError::Transport(format!("{url}: {e}")))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn csv_part(data: &Path) -> Result<Part> {
        let contents = tokio::fs::read(data).await?;
        let file_name = data
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data.csv".to_string());

        Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| StorageError::Transport(e.to_string()))
    }
}

#[async_trait::async_trait]
impl StorageBackend for StorageClient {
    async fn verify_token(&self) -> Result<TokenInfo> {
        let url = self.endpoint(&["tokens", "verify"])?;
        tracing::debug!("Verifying token at {url}");

        let response = self.send(self.http.get(url.clone()), &url).await?;
        response
            .json::<TokenInfo>()
            .await
            .map_err(|e| StorageError::Transport(format!("Invalid token info from {url}: {e}")))
    }

    async fn describe_table(&self, table_id: &str) -> Result<TableDetail> {
        let url = self.endpoint(&["tables", table_id])?;
        tracing::debug!("Describing table {table_id}");

        let response = self.send(self.http.get(url.clone()), &url).await?;
        response
            .json::<TableDetail>()
            .await
            .map_err(|e| StorageError::Transport(format!("Invalid table detail from {url}: {e}")))
    }

    async fn drop_table(&self, table_id: &str) -> Result<()> {
        let url = self.endpoint(&["tables", table_id])?;
        tracing::debug!("Dropping table {table_id}");

        self.send(self.http.delete(url.clone()), &url).await?;
        Ok(())
    }

    async fn create_table(
        &self,
        bucket_id: &str,
        name: &str,
        data: &Path,
        options: &CreateTableOptions,
    ) -> Result<String> {
        let url = self.endpoint(&["buckets", bucket_id, "tables"])?;
        tracing::debug!(
            "Creating table {name} in {bucket_id} with primary key {:?}",
            options.primary_key
        );

        let form = Form::new()
            .text("name", name.to_string())
            .text("primaryKey", options.primary_key.join(","))
            .part("data", Self::csv_part(data).await?);

        let response = self
            .send(self.http.post(url.clone()).multipart(form), &url)
            .await?;
        match response.json::<TableDetail>().await {
            Ok(created) if !created.id.is_empty() => Ok(created.id),
            Ok(_) => Ok(format!("{bucket_id}.{name}")),
            Err(e) => {
                tracing::debug!("Unexpected create response from {url}: {e}");
                Ok(format!("{bucket_id}.{name}"))
            }
        }
    }

    async fn write_table(
        &self,
        table_id: &str,
        data: &Path,
        options: &WriteTableOptions,
    ) -> Result<()> {
        let url = self.endpoint(&["tables", table_id, "import"])?;
        tracing::debug!(
            "Loading data into {table_id} (incremental: {})",
            options.incremental
        );

        let incremental = if options.incremental { "1" } else { "0" };
        let form = Form::new()
            .text("incremental", incremental)
            .part("data", Self::csv_part(data).await?);

        self.send(self.http.post(url.clone()).multipart(form), &url).await?;
        Ok(())
    }
}

/// Map a non-success response onto the storage error kinds.
async fn error_from_response(response: Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

    let message = parsed
        .error
        .or(parsed.message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Storage API returned status {status}"));

    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound(message),
        StatusCode::UNAUTHORIZED => StorageError::Unauthorized(message),
        _ => StorageError::Api {
            status: status.as_u16(),
            code: parsed.code,
            message,
        },
    }
}
