use std::time::Duration;

use async_trait::async_trait;
use exit_panel_core::config::{FRIENDLY_NAMES_PATH, LOGIN_PATH, SET_MODE_PATH, STATUS_PATH};
use exit_panel_core::{
    Credentials, ModeCommand, PanelConfig, PanelError, PanelTransport, Resource, StatusPayload,
    TransportError, is_login_location,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP transport holding the session cookie between requests.
#[derive(Debug, Clone)]
pub struct ReqwestPanelTransport {
    client: reqwest::Client,
    config: PanelConfig,
}

impl ReqwestPanelTransport {
    pub fn new(config: &PanelConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TransportError::network)?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Form login. The backend answers bad credentials with 401 and a good
    /// login with a redirect away from the login page.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.config.endpoint(LOGIN_PATH))
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(TransportError::network)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        tracing::info!(username = %credentials.username, "logged in");
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let response = self
            .client
            .get(self.config.endpoint(path))
            .send()
            .await
            .map_err(TransportError::network)?;
        let raw = read_success_body(response).await?;
        serde_json::from_str(&raw).map_err(TransportError::decode)
    }
}

#[async_trait(?Send)]
impl PanelTransport for ReqwestPanelTransport {
    async fn fetch_friendly_names(&self) -> Result<Map<String, Value>, PanelError> {
        self.get_json(FRIENDLY_NAMES_PATH)
            .await
            .map_err(|source| PanelError::ResourceLoad {
                resource: Resource::FriendlyNames,
                source,
            })
    }

    async fn fetch_status(&self) -> Result<StatusPayload, PanelError> {
        self.get_json(STATUS_PATH)
            .await
            .map_err(|source| PanelError::ResourceLoad {
                resource: Resource::Status,
                source,
            })
    }

    async fn send_mode(&self, command: &ModeCommand) -> Result<(), PanelError> {
        let command_error = |source| PanelError::Command {
            mode: command.mode.to_string(),
            source,
        };
        let response = self
            .client
            .post(self.config.endpoint(SET_MODE_PATH))
            .query(&command.query_pairs())
            .send()
            .await
            .map_err(TransportError::network)
            .map_err(command_error)?;
        read_success_body(response).await.map_err(command_error)?;
        Ok(())
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, TransportError> {
    if is_login_location(response.url().as_str()) {
        return Err(TransportError::SessionExpired);
    }
    let status = response.status();
    let raw = response.text().await.map_err(TransportError::network)?;
    if !status.is_success() {
        return Err(TransportError::from_status(status.as_u16(), raw));
    }
    Ok(raw)
}
