use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::PanelError;
use crate::mode::ModeCommand;
use crate::status::StatusPayload;

/// Control endpoint seam. Implementations map transport failures into
/// [`PanelError::ResourceLoad`] for reads and [`PanelError::Command`] for
/// mode switches.
///
/// Futures are not `Send`: the browser implementation wraps JS promises.
#[async_trait(?Send)]
pub trait PanelTransport {
    /// `GET /friendly-names.json`
    async fn fetch_friendly_names(&self) -> Result<Map<String, Value>, PanelError>;

    /// `GET /status`
    async fn fetch_status(&self) -> Result<StatusPayload, PanelError>;

    /// `POST /set-mode?mode=<mode>[&node=<raw>]`
    async fn send_mode(&self, command: &ModeCommand) -> Result<(), PanelError>;
}
