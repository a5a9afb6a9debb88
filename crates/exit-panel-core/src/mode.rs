use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;
use crate::names::NameResolver;
use crate::transport::PanelTransport;

pub const MODE_SWITCH_FAILED_MESSAGE: &str = "Error switching mode";

/// Routing modes understood by `POST /set-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMode {
    /// Traffic leaves through the local uplink.
    Direct,
    /// Traffic leaves through a tailnet exit node.
    Tailscale,
}

impl SwitchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Tailscale => "tailscale",
        }
    }
}

impl fmt::Display for SwitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode switch request. `node` is only sent for [`SwitchMode::Tailscale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCommand {
    pub mode: SwitchMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl ModeCommand {
    pub fn new(mode: SwitchMode, node: Option<String>) -> Self {
        let node = match mode {
            SwitchMode::Tailscale => node,
            SwitchMode::Direct => None,
        };
        Self { mode, node }
    }

    pub fn direct() -> Self {
        Self::new(SwitchMode::Direct, None)
    }

    pub fn exit_node(raw: impl Into<String>) -> Self {
        Self::new(SwitchMode::Tailscale, Some(raw.into()))
    }

    /// Query parameters for `/set-mode`, unencoded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("mode", self.mode.as_str().to_string())];
        if self.mode == SwitchMode::Tailscale {
            pairs.push(("node", self.node.clone().unwrap_or_default()));
        }
        pairs
    }

    fn target_node(&self) -> Option<&str> {
        self.node.as_deref().filter(|node| !node.is_empty())
    }
}

/// What a mode switch produced for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSwitchOutcome {
    pub command: ModeCommand,
    pub notification: String,
    pub result: Result<(), PanelError>,
}

impl ModeSwitchOutcome {
    /// A successful switch must be followed by exactly one status refresh.
    pub fn refresh_requested(&self) -> bool {
        self.result.is_ok()
    }

    /// The backend bounced the command to its login page.
    pub fn session_expired(&self) -> bool {
        self.result
            .as_ref()
            .is_err_and(PanelError::is_session_expired)
    }
}

/// Issues mode switches and phrases their outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeController;

impl ModeController {
    pub fn new() -> Self {
        Self
    }

    pub fn success_message(command: &ModeCommand, resolver: &NameResolver) -> String {
        match command.target_node() {
            Some(node) => format!(
                "Switched to {} ({})",
                command.mode,
                resolver.resolve_optional(Some(node))
            ),
            None => format!("Switched to {}", command.mode),
        }
    }

    /// Turns a command result into the notification and refresh decision.
    pub fn settle(
        &self,
        command: ModeCommand,
        result: Result<(), PanelError>,
        resolver: &NameResolver,
    ) -> ModeSwitchOutcome {
        let notification = match &result {
            Ok(()) => {
                tracing::info!(mode = %command.mode, node = ?command.node, "mode switched");
                Self::success_message(&command, resolver)
            }
            Err(error) => {
                tracing::error!(mode = %command.mode, node = ?command.node, error = %error, "mode switch failed");
                MODE_SWITCH_FAILED_MESSAGE.to_string()
            }
        };
        ModeSwitchOutcome {
            command,
            notification,
            result,
        }
    }

    pub async fn switch_mode<T: PanelTransport + ?Sized>(
        &self,
        transport: &T,
        resolver: &NameResolver,
        command: ModeCommand,
    ) -> ModeSwitchOutcome {
        let result = transport.send_mode(&command).await;
        self.settle(command, result, resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn resolver() -> NameResolver {
        NameResolver::new(
            [("se-sto-wg-001.mullvad.ts.net", "Stockholm")]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn direct_mode_drops_node_parameter() {
        let command = ModeCommand::new(SwitchMode::Direct, Some("ignored".to_string()));
        assert_eq!(command, ModeCommand::direct());
        assert_eq!(command.query_pairs(), vec![("mode", "direct".to_string())]);
    }

    #[test]
    fn exit_node_mode_carries_raw_node() {
        let command = ModeCommand::exit_node("se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)");
        assert_eq!(
            command.query_pairs(),
            vec![
                ("mode", "tailscale".to_string()),
                (
                    "node",
                    "se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)".to_string()
                ),
            ]
        );
    }

    #[test]
    fn success_message_uses_friendly_name() {
        let outcome = ModeController::new().settle(
            ModeCommand::exit_node("SE-STO-WG-001.mullvad.ts.net (Sweden, Stockholm)"),
            Ok(()),
            &resolver(),
        );
        assert_eq!(outcome.notification, "Switched to tailscale (Stockholm)");
        assert!(outcome.refresh_requested());
    }

    #[test]
    fn success_message_omits_empty_node() {
        let resolver = resolver();
        assert_eq!(
            ModeController::success_message(&ModeCommand::direct(), &resolver),
            "Switched to direct"
        );
        assert_eq!(
            ModeController::success_message(&ModeCommand::exit_node(""), &resolver),
            "Switched to tailscale"
        );
    }

    #[test]
    fn failure_is_generic_and_skips_refresh() {
        let outcome = ModeController::new().settle(
            ModeCommand::exit_node("nodeX"),
            Err(PanelError::Command {
                mode: "tailscale".to_string(),
                source: TransportError::from_status(500, "exit node not found"),
            }),
            &resolver(),
        );
        assert_eq!(outcome.notification, MODE_SWITCH_FAILED_MESSAGE);
        assert!(!outcome.refresh_requested());
    }

    #[test]
    fn login_bounce_marks_outcome_session_expired() {
        let controller = ModeController::new();
        let bounced = controller.settle(
            ModeCommand::direct(),
            Err(PanelError::Command {
                mode: "direct".to_string(),
                source: TransportError::SessionExpired,
            }),
            &resolver(),
        );
        assert!(bounced.session_expired());
        assert!(!bounced.refresh_requested());

        let rejected = controller.settle(
            ModeCommand::direct(),
            Err(PanelError::Command {
                mode: "direct".to_string(),
                source: TransportError::from_status(500, "boom"),
            }),
            &resolver(),
        );
        assert!(!rejected.session_expired());
        assert!(!controller.settle(ModeCommand::direct(), Ok(()), &resolver()).session_expired());
    }
}
