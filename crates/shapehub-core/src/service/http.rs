//! Catalog service over HTTP

use async_trait::async_trait;
use shapehub_domain::{Payload, ShapeId, ShapeRecord};
use url::Url;

use super::{CatalogService, StencilFile};
use crate::config::BrowseConfig;
use crate::error::CatalogError;
use crate::http::{HttpClient, HttpError, HttpResponse};

pub struct HttpCatalogService {
    client: HttpClient,
    base_url: Url,
}

impl HttpCatalogService {
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self, CatalogError> {
        // Url::join drops the last path segment unless it ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|_| HttpError::InvalidUrl {
            url: base_url.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Build a client from configuration
    pub fn from_config(config: &BrowseConfig) -> Result<Self, CatalogError> {
        let client = HttpClient::new(&config.user_agent, config.timeout())?;
        Self::new(client, &config.base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url.join(path).map_err(|_| {
            CatalogError::Http(HttpError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
            })
        })
    }
}

fn ensure_success<B>(response: &HttpResponse<B>, url: &Url) -> Result<(), CatalogError> {
    match response.status {
        200..=299 => Ok(()),
        404 => Err(CatalogError::NotFound(url.path().to_string())),
        status => Err(CatalogError::Http(HttpError::Status {
            status,
            url: url.to_string(),
        })),
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    #[tracing::instrument(skip(self))]
    async fn list_shapes(&self, sort: Option<&str>) -> Result<Vec<ShapeRecord>, CatalogError> {
        let url = self.endpoint("get_shapes")?;
        let response = match sort {
            Some(sort) => self.client.get_with_params(url.as_str(), &[("sort", sort)]).await?,
            None => self.client.get(url.as_str()).await?,
        };
        ensure_success(&response, &url)?;

        let shapes: Vec<ShapeRecord> = serde_json::from_str(&response.body)?;
        tracing::debug!(count = shapes.len(), "Decoded catalog listing");
        Ok(shapes)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_payload(&self, id: ShapeId) -> Result<Payload, CatalogError> {
        let url = self.endpoint(&format!("get_shape/{}", id))?;
        let response = self.client.get(url.as_str()).await?;
        ensure_success(&response, &url)?;
        Ok(Payload::from(response.body))
    }

    #[tracing::instrument(skip(self))]
    async fn download_stencil(&self, stencil_id: u64) -> Result<StencilFile, CatalogError> {
        let url = self.endpoint(&format!("download_stencil/{}", stencil_id))?;
        let response = self.client.get_bytes(url.as_str()).await?;
        ensure_success(&response, &url)?;

        let file_name = response
            .header("Content-Disposition")
            .and_then(attachment_file_name)
            .unwrap_or_else(|| format!("stencil-{}", stencil_id));

        Ok(StencilFile {
            file_name,
            bytes: response.body,
        })
    }
}

/// Extract the file name from a `Content-Disposition` header.
///
/// Prefers the RFC 5987 `filename*=UTF-8''...` form over plain `filename=`.
pub fn attachment_file_name(header: &str) -> Option<String> {
    let mut plain = None;

    for part in header.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let value = encoded
                .split_once("''")
                .map(|(_, v)| v)
                .unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(value) {
                if !decoded.is_empty() {
                    return Some(decoded.into_owned());
                }
            }
        } else if let Some(value) = part.strip_prefix("filename=") {
            let value = value.trim_matches('"');
            if !value.is_empty() {
                plain = Some(value.to_string());
            }
        }
    }

    plain
}
