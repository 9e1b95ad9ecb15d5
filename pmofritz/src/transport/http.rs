use super::digest_auth::{authorization_header, parse_www_authenticate};
use super::{Credentials, Transport};
use crate::error::{FritzError, Result};
use crate::soap::SOAP_CONTENT_TYPE;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport HTTP basé sur `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

/// Builder pour [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: true,
        }
    }
}

impl HttpTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accepte le certificat auto-signé de la box (mode `secure`)
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;
        Ok(HttpTransport { client })
    }
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        request.send().await.map_err(|e| map_send_error(e, url))
    }

    /// Lit le corps d'une réponse dont le statut doit être 2xx
    async fn success_body(response: Response, url: &str) -> Result<String> {
        let status = response.status();
        debug!(%status, url, "HTTP response");

        if !status.is_success() {
            warn!(%status, url, "HTTP request failed");
            return Err(FritzError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    fn soap_request(&self, url: &str, soap_action: &str, body: &str) -> RequestBuilder {
        self.client
            .post(url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", soap_action)
            .body(body.to_string())
    }
}

fn map_send_error(error: reqwest::Error, url: &str) -> FritzError {
    if error.is_connect() || error.is_timeout() {
        warn!(url, "device unreachable: {}", error);
        FritzError::DeviceUnreachable(url.to_string())
    } else {
        FritzError::Http(error)
    }
}

/// Partie `uri` du digest : chemin et requête de l'URL
fn digest_uri(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    Ok(match parsed.query() {
        Some(query) => format!("{}?{}", parsed.path(), query),
        None => parsed.path().to_string(),
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self.send(self.client.get(url), url).await?;
        Self::success_body(response, url).await
    }

    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<String> {
        debug!(url, fields = fields.len(), "POST form");
        let response = self.send(self.client.post(url).form(fields), url).await?;
        Self::success_body(response, url).await
    }

    async fn post_soap(
        &self,
        url: &str,
        soap_action: &str,
        body: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        debug!(url, soap_action, "POST SOAP");
        let mut response = self
            .send(self.soap_request(url, soap_action, body), url)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            if let (Some(challenge), Some(credentials)) = (challenge, credentials) {
                debug!(url, "answering digest challenge");
                let challenge = parse_www_authenticate(&challenge)?;
                let authorization =
                    authorization_header(&challenge, credentials, "POST", &digest_uri(url)?);
                response = self
                    .send(
                        self.soap_request(url, soap_action, body)
                            .header(AUTHORIZATION, authorization),
                        url,
                    )
                    .await?;
            }
        }

        let status = response.status();
        debug!(%status, url, "SOAP response");
        if status == StatusCode::UNAUTHORIZED {
            warn!(url, "SOAP request not authorized");
            return Err(FritzError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
