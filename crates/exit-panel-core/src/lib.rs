//! Core of the exit-node control panel.
//!
//! The pipeline runs leaves first: [`names`] normalizes and resolves node
//! identifiers, [`status`] reconciles `/status` payloads into a categorized
//! [`ViewModel`], [`pagination`] slices it into pages, and [`mode`] issues
//! mode switches. [`panel`] composes them behind a [`PanelTransport`] and
//! produces a plain [`PanelView`] for render adapters.

pub mod config;
pub mod error;
pub mod mode;
pub mod names;
pub mod notification;
pub mod pagination;
pub mod panel;
pub mod status;
pub mod transport;
pub mod view;

pub use config::{ConfigError, Credentials, PanelConfig, is_login_location};
pub use error::{PanelError, Resource, TransportError};
pub use mode::{
    MODE_SWITCH_FAILED_MESSAGE, ModeCommand, ModeController, ModeSwitchOutcome, SwitchMode,
};
pub use names::{FriendlyNameTable, NameResolver, NormalizedKey, UNKNOWN_NODE_NAME, normalize};
pub use notification::{Notification, NotificationCenter, NotificationPhase, NotificationTicket};
pub use pagination::{ITEMS_PER_PAGE, Page, Paginator};
pub use panel::{Dispatch, Panel, PanelCommand, PanelState};
pub use status::{
    CurrentMode, ExitNodeDetails, NodeCategory, NodeEntry, ProviderMarker, Reconciliation,
    StatusPayload, StatusReconciler, ViewItem, ViewModel,
};
pub use transport::PanelTransport;
pub use view::PanelView;
