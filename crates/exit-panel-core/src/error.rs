use std::fmt;

/// Remote resources the panel reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    FriendlyNames,
    Status,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FriendlyNames => f.write_str("friendly names"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// Failure of a single HTTP exchange with the control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network request failed: {message}")]
    Network { message: String },
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },
    #[error("session expired; login required")]
    SessionExpired,
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

impl TransportError {
    pub fn network(error: impl fmt::Display) -> Self {
        Self::Network {
            message: error.to_string(),
        }
    }

    pub fn decode(error: impl fmt::Display) -> Self {
        Self::Decode {
            message: error.to_string(),
        }
    }

    /// Maps a non-success status to an error; 401 means the session is gone.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 401 {
            Self::SessionExpired
        } else {
            Self::Status {
                status,
                body: body.into(),
            }
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// Panel-level failures. Neither variant is fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Dictionary or status fetch failed; recovered by keeping an empty or
    /// previous dataset.
    #[error("failed to load {resource}: {source}")]
    ResourceLoad {
        resource: Resource,
        #[source]
        source: TransportError,
    },
    /// Mode switch rejected or unreachable; surfaced as a generic notification.
    #[error("mode switch to {mode} failed: {source}")]
    Command {
        mode: String,
        #[source]
        source: TransportError,
    },
}

impl PanelError {
    pub fn transport(&self) -> &TransportError {
        match self {
            Self::ResourceLoad { source, .. } | Self::Command { source, .. } => source,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.transport().is_session_expired()
    }
}
