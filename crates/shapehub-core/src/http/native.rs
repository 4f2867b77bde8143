//! Native HTTP client using reqwest

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Client;

use super::{HttpError, HttpResponse};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let body = response.text().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }

    /// GET returning the raw body, for file downloads
    pub async fn get_bytes(&self, url: &str) -> Result<HttpResponse<Vec<u8>>, HttpError> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let body = response.bytes().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
            headers,
        })
    }

    pub async fn get_with_params(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        let url =
            reqwest::Url::parse_with_params(url, params).map_err(|_| HttpError::InvalidUrl {
                url: url.to_string(),
            })?;

        self.get(url.as_str()).await
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, HttpError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::RequestFailed {
                        message: e.to_string(),
                    }
                }
            })?;

        if response.status().as_u16() == 429 {
            return Err(HttpError::RateLimited);
        }

        Ok(response)
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect()
}
