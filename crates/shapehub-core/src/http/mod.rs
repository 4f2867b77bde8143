//! HTTP client abstraction for the catalog service

pub mod native;

pub use native::*;

use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
    #[error("Timeout")]
    Timeout,
    #[error("Rate limited")]
    RateLimited,
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Parse error: {message}")]
    ParseError { message: String },
}

#[derive(Clone, Debug)]
pub struct HttpResponse<B = String> {
    pub status: u16,
    pub body: B,
    pub headers: HashMap<String, String>,
}

impl<B> HttpResponse<B> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("content-disposition".to_string(), "attachment".to_string());
        let response = HttpResponse {
            status: 200,
            body: String::new(),
            headers,
        };
        assert_eq!(response.header("Content-Disposition"), Some("attachment"));
        assert!(response.is_success());
    }
}
