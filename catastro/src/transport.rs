//! Transport HTTP bloquant

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::CatastroConfig;
use crate::CatastroError;

/// Réponse brute d'un service
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,

    /// URL finale, après redirections
    pub url: String,

    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport utilisé par le client: une requête GET avec paramètres de query
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse, CatastroError>;
}

/// Transport par défaut basé sur reqwest (bloquant, sans retry)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &CatastroConfig) -> Result<Self, CatastroError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CatastroError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse, CatastroError> {
        debug!(url, params = ?params, "GET");

        let transport_error = |source: reqwest::Error| CatastroError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.bytes().map_err(transport_error)?.to_vec();

        debug!(status, bytes = body.len(), "Response");

        Ok(HttpResponse {
            status,
            url: final_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_get_sends_query_and_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/json/Consulta_DNPRC")
                .query_param("RefCat", "1541506VK4714B0002PK");
            then.status(200).body("{}");
        });

        let transport = HttpTransport::new(&CatastroConfig::default()).unwrap();
        let response = transport
            .get(
                &server.url("/json/Consulta_DNPRC"),
                &[("RefCat", "1541506VK4714B0002PK")],
            )
            .unwrap();

        mock.assert();
        assert!(response.is_success());
        assert_eq!(response.body, b"{}");
        assert!(response.url.contains("RefCat=1541506VK4714B0002PK"));
    }

    #[test]
    fn test_non_success_status_is_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let transport = HttpTransport::new(&CatastroConfig::default()).unwrap();
        let response = transport.get(&server.url("/missing"), &[]).unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.body.is_empty());
    }
}
