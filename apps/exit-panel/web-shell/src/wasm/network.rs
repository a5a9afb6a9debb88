use super::*;

/// Same-origin transport over `fetch`. The session cookie rides along with
/// every request.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct GlooPanelTransport;

#[async_trait(?Send)]
impl PanelTransport for GlooPanelTransport {
    async fn fetch_friendly_names(&self) -> Result<Map<String, Value>, PanelError> {
        get_json(FRIENDLY_NAMES_PATH)
            .await
            .map_err(|source| PanelError::ResourceLoad {
                resource: Resource::FriendlyNames,
                source,
            })
    }

    async fn fetch_status(&self) -> Result<StatusPayload, PanelError> {
        get_json(STATUS_PATH)
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
        let pairs = command.query_pairs();
        let response = Request::post(SET_MODE_PATH)
            .query(pairs.iter().map(|(name, value)| (*name, value.as_str())))
            .send()
            .await
            .map_err(map_network_error)
            .map_err(command_error)?;
        read_success_body(response).await.map_err(command_error)?;
        Ok(())
    }
}

pub(super) async fn get_json<T: for<'de> serde::Deserialize<'de>>(
    path: &str,
) -> Result<T, TransportError> {
    let response = Request::get(path)
        .send()
        .await
        .map_err(map_network_error)?;
    let raw = read_success_body(response).await?;
    serde_json::from_str::<T>(&raw).map_err(TransportError::decode)
}

/// Returns the body of a 2xx response. A response that was redirected to the
/// login page means the session is gone, whatever its status.
pub(super) async fn read_success_body(
    response: gloo_net::http::Response,
) -> Result<String, TransportError> {
    if response.redirected() && is_login_location(&response.url()) {
        return Err(TransportError::SessionExpired);
    }
    let status = response.status();
    let raw = response.text().await.map_err(map_network_error)?;
    if !(200..=299).contains(&status) {
        return Err(TransportError::from_status(status, raw));
    }
    Ok(raw)
}

pub(super) fn map_network_error(error: gloo_net::Error) -> TransportError {
    TransportError::network(error)
}
