use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, redirect};

use crate::{config::PortalConfig, error::FetchError};

/// One cookie-carrying conversation with the portal.
///
/// The token handed out by the login page is only valid together with the
/// session cookies set on that same response, so both steps of a lookup must
/// go through the same session.
#[async_trait]
pub trait PortalSession: Send + Sync {
    async fn fetch_login_page(&self) -> Result<String, FetchError>;

    async fn submit_result_lookup(
        &self,
        token: &str,
        registration_number: &str,
    ) -> Result<String, FetchError>;
}

/// Opens a fresh session per lookup. Nothing is shared between lookups.
pub trait PortalConnector: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn PortalSession>, FetchError>;
}

pub struct HttpConnector {
    config: PortalConfig,
}

impl HttpConnector {
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }
}

impl PortalConnector for HttpConnector {
    fn open_session(&self) -> Result<Box<dyn PortalSession>, FetchError> {
        Ok(Box::new(HttpSession::new(&self.config)?))
    }
}

/// A reqwest client with its own cookie jar and connection pool.
/// Dropping it closes the connections it opened.
pub struct HttpSession {
    client: Client,
    login_url: String,
    result_url: String,
}

impl HttpSession {
    pub fn new(config: &PortalConfig) -> Result<Self, FetchError> {
        // The portal's certificate chain does not validate.
        let client = ClientBuilder::new()
            .danger_accept_invalid_certs(true)
            .cookie_store(true)
            .redirect(redirect::Policy::limited(10))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            login_url: config.login_url.clone(),
            result_url: config.result_url.clone(),
        })
    }
}

#[async_trait]
impl PortalSession for HttpSession {
    async fn fetch_login_page(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.login_url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }

    async fn submit_result_lookup(
        &self,
        token: &str,
        registration_number: &str,
    ) -> Result<String, FetchError> {
        let form = [("token", token), ("Register", registration_number)];
        let response = self
            .client
            .post(&self.result_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }
}
