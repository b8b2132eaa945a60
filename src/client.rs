use crate::config::ApiKeyPair;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Method, Url};
use tracing::debug;

const UA: &str = concat!("shipctl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Auth {
    Basic(ApiKeyPair),
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Auth) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let parsed = Url::parse(&base).context("parsing base URL")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static(UA))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            auth,
        })
    }

    /// Single GET. Non-2xx answers are returned as data since both vendors
    /// report failures in the body.
    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ResponseData> {
        let normalized = path.trim_start_matches('/');
        let url = self
            .base_url
            .join(normalized)
            .with_context(|| format!("joining path `{}` to base URL", path))?;
        debug!("GET {}", url);

        let mut request = self
            .http
            .request(Method::GET, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        request = match &self.auth {
            Auth::Basic(keys) => request.basic_auth(&keys.id, Some(&keys.secret)),
            Auth::Bearer(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
        };

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().context("sending request")?;
        let status = response.status().as_u16();
        debug!("response status {}", status);
        let body = response.bytes().context("reading response body")?.to_vec();

        Ok(ResponseData { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn keys() -> ApiKeyPair {
        ApiKeyPair {
            id: "id".into(),
            secret: "secret".into(),
        }
    }

    #[test]
    fn sends_basic_auth_and_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/private-locations")
                .query_param("workspaceId", "12")
                .query_param("limit", "0")
                .header("Authorization", "Basic aWQ6c2VjcmV0")
                .header("Accept", "application/json");
            then.status(200)
                .json_body(json!({"error": null, "result": []}));
        });

        let base = format!("{}/api/v4", server.base_url());
        let client = ApiClient::new(&base, Auth::Basic(keys())).unwrap();
        let response = client
            .get(
                "/private-locations",
                &[("workspaceId", "12".to_string()), ("limit", "0".to_string())],
            )
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        let parsed: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(parsed["result"], json!([]));
    }

    #[test]
    fn sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/teams/T1/agents")
                .header("Authorization", "Bearer tok");
            then.status(200).body(r#"{"meta":{"status":"success"},"data":[]}"#);
        });

        let client = ApiClient::new(&server.base_url(), Auth::Bearer("tok".into())).unwrap();
        let response = client.get("v1/teams/T1/agents", &[]).unwrap();

        mock.assert();
        assert_eq!(
            response.body,
            br#"{"meta":{"status":"success"},"data":[]}"#.to_vec()
        );
    }

    #[test]
    fn passes_error_status_bodies_through() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/private-locations");
            then.status(401)
                .body(r#"{"error":{"code":401,"message":"Unauthorized"}}"#);
        });

        let client = ApiClient::new(&server.base_url(), Auth::Basic(keys())).unwrap();
        let response = client.get("/private-locations", &[]).unwrap();

        assert_eq!(response.status, 401);
        assert!(String::from_utf8_lossy(&response.body).contains("Unauthorized"));
    }

    #[test]
    fn connection_failure_is_an_error() {
        let client = ApiClient::new("http://127.0.0.1:1", Auth::Bearer("tok".into())).unwrap();
        let err = client.get("/v1/teams/T1/agents", &[]).unwrap_err();
        assert!(err.to_string().contains("sending request"));
    }
}
