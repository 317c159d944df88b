//! Outbound HTTP requests to the upstream bibliographic services
//!
//! Requests are described as plain values first so they can be dumped for
//! diagnostics (and inspected in tests) before anything is sent.

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use thiserror::Error;
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Failure while talking to an upstream service
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },
}

/// A fully-formed outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    /// Form-encoded body, present only for POST requests
    pub form_body: Option<String>,
}

/// Raw upstream response (status is always 2xx)
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            form_body: None,
        }
    }

    /// POST with an `application/x-www-form-urlencoded` body built from `pairs`
    pub fn post_form<K, V>(url: Url, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }

        Self {
            method: Method::POST,
            url,
            form_body: Some(serializer.finish()),
        }
    }

    /// Text dump in HTTP/1.1 wire layout
    pub fn dump(&self) -> String {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }

        let mut host = self.url.host_str().unwrap_or_default().to_string();
        if let Some(port) = self.url.port() {
            host.push_str(&format!(":{port}"));
        }

        let mut dump = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", self.method, target, host);
        if let Some(body) = &self.form_body {
            dump.push_str(&format!("Content-Type: {FORM_CONTENT_TYPE}\r\n\r\n{body}"));
        }
        dump
    }

    /// Send the request, returning the body of a 2xx response
    pub async fn send(&self, client: &reqwest::Client) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = client.request(self.method.clone(), self.url.clone());
        if let Some(body) = &self.form_body {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout(error.to_string())
    } else {
        UpstreamError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_get_request() {
        let url = Url::parse("http://bobcat.example.edu/pnxs?inst=NYU&q=isbn%2Cexact%2C1").unwrap();
        let request = UpstreamRequest::get(url);
        assert_eq!(
            request.dump(),
            "GET /pnxs?inst=NYU&q=isbn%2Cexact%2C1 HTTP/1.1\r\nHost: bobcat.example.edu\r\n"
        );
    }

    #[test]
    fn test_dump_post_form_request() {
        let url = Url::parse("http://localhost:8181/sfxlcl41").unwrap();
        let request = UpstreamRequest::post_form(url, &[("a", "1 & 2"), ("b", "<x>")]);

        assert_eq!(request.form_body.as_deref(), Some("a=1+%26+2&b=%3Cx%3E"));
        assert_eq!(
            request.dump(),
            "POST /sfxlcl41 HTTP/1.1\r\nHost: localhost:8181\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\r\na=1+%26+2&b=%3Cx%3E"
        );
    }
}
