use serde_json::{Map, Value};

use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::mode::{ModeCommand, ModeController, ModeSwitchOutcome};
use crate::names::NameResolver;
use crate::notification::{NotificationCenter, NotificationTicket};
use crate::pagination::Paginator;
use crate::status::{CurrentMode, Reconciliation, StatusPayload, StatusReconciler};
use crate::transport::PanelTransport;
use crate::view::PanelView;

/// User intents. Every interactive control maps to exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    SelectNode(String),
    SelectDirect,
    NextPage,
    PrevPage,
}

/// What a dispatched command still needs from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// State changed synchronously; re-render.
    Rendered,
    /// Nothing to do (boundary page move, click on the active node).
    Ignored,
    /// Send this command, then hand the result to [`PanelState::settle_mode`].
    SwitchMode(ModeCommand),
}

/// Owned state of one panel. Every method is synchronous so an async caller
/// can fetch without holding a borrow and apply results as they resolve.
#[derive(Debug, Clone)]
pub struct PanelState {
    resolver: NameResolver,
    reconciler: StatusReconciler,
    modes: ModeController,
    paginator: Paginator,
    notifications: NotificationCenter,
    current_mode: Option<CurrentMode>,
    session_expired: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(&PanelConfig::default())
    }
}

impl PanelState {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            resolver: NameResolver::default(),
            reconciler: StatusReconciler::from_config(config),
            modes: ModeController::new(),
            paginator: Paginator::new(),
            notifications: NotificationCenter::from_config(config),
            current_mode: None,
            session_expired: false,
        }
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn current_mode(&self) -> Option<&CurrentMode> {
        self.current_mode.as_ref()
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    pub fn install_names(&mut self, fetched: Result<Map<String, Value>, PanelError>) {
        self.resolver.install(fetched);
    }

    /// Applies a status fetch result. A failure keeps the previous view;
    /// success replaces the view-model and rewinds to page 1. Returns whether
    /// the view changed.
    pub fn apply_status(&mut self, fetched: Result<StatusPayload, PanelError>) -> bool {
        let settled = self.reconciler.settle(fetched, &self.resolver);
        self.apply_settled(settled).is_ok()
    }

    pub fn apply_reconciliation(&mut self, reconciliation: Reconciliation) {
        self.session_expired = false;
        self.current_mode = Some(reconciliation.current_mode);
        self.paginator.set_view_model(reconciliation.view_model);
    }

    fn apply_settled(
        &mut self,
        settled: Result<Reconciliation, PanelError>,
    ) -> Result<(), PanelError> {
        match settled {
            Ok(reconciliation) => {
                self.apply_reconciliation(reconciliation);
                Ok(())
            }
            Err(error) => {
                if error.is_session_expired() {
                    self.session_expired = true;
                }
                Err(error)
            }
        }
    }

    pub fn dispatch(&mut self, command: PanelCommand) -> Dispatch {
        match command {
            PanelCommand::NextPage => {
                let before = self.paginator.current_page();
                if self.paginator.next().page_number == before {
                    Dispatch::Ignored
                } else {
                    Dispatch::Rendered
                }
            }
            PanelCommand::PrevPage => {
                let before = self.paginator.current_page();
                if self.paginator.prev().page_number == before {
                    Dispatch::Ignored
                } else {
                    Dispatch::Rendered
                }
            }
            PanelCommand::SelectDirect => Dispatch::SwitchMode(ModeCommand::direct()),
            PanelCommand::SelectNode(raw) => {
                let already_active = self
                    .paginator
                    .view_model()
                    .active_entry()
                    .is_some_and(|entry| entry.raw == raw);
                if already_active {
                    Dispatch::Ignored
                } else {
                    Dispatch::SwitchMode(ModeCommand::exit_node(raw))
                }
            }
        }
    }

    /// Records a mode switch result and shows its notification. The caller
    /// refreshes status when [`ModeSwitchOutcome::refresh_requested`] holds.
    pub fn settle_mode(
        &mut self,
        command: ModeCommand,
        result: Result<(), PanelError>,
    ) -> (ModeSwitchOutcome, NotificationTicket) {
        let outcome = self.modes.settle(command, result, &self.resolver);
        let ticket = self.announce(&outcome);
        (outcome, ticket)
    }

    fn announce(&mut self, outcome: &ModeSwitchOutcome) -> NotificationTicket {
        self.notifications.show(outcome.notification.clone())
    }

    pub fn view(&self) -> PanelView {
        PanelView::assemble(
            self.current_mode.as_ref().map(|mode| mode.label.clone()),
            &self.paginator.page(),
            self.notifications.current().cloned(),
            self.session_expired,
        )
    }
}

/// A panel bound to a transport, for callers that can hold `&mut` across
/// awaits.
#[derive(Debug)]
pub struct Panel<T> {
    transport: T,
    state: PanelState,
}

impl<T: PanelTransport> Panel<T> {
    pub fn new(transport: T, config: &PanelConfig) -> Self {
        Self {
            transport,
            state: PanelState::new(config),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn view(&self) -> PanelView {
        self.state.view()
    }

    /// Loads the name table, then performs the first status refresh.
    pub async fn start(&mut self) -> Result<(), PanelError> {
        self.load_names().await;
        self.refresh().await
    }

    pub async fn load_names(&mut self) {
        self.state.resolver.load_table(&self.transport).await;
    }

    /// Fetches and applies status. The error is returned for callers that
    /// want to report it; the panel itself has already recovered.
    pub async fn refresh(&mut self) -> Result<(), PanelError> {
        let settled = self
            .state
            .reconciler
            .refresh(&self.transport, &self.state.resolver)
            .await;
        self.state.apply_settled(settled)
    }

    pub async fn switch_mode(&mut self, command: ModeCommand) -> ModeSwitchOutcome {
        let outcome = self
            .state
            .modes
            .switch_mode(&self.transport, &self.state.resolver, command)
            .await;
        self.state.announce(&outcome);
        if outcome.refresh_requested() && self.refresh().await.is_err() {
            tracing::debug!("status refresh after mode switch failed; view unchanged");
        }
        outcome
    }

    /// Dispatches a command, performing any mode switch it implies.
    pub async fn dispatch(&mut self, command: PanelCommand) -> Option<ModeSwitchOutcome> {
        match self.state.dispatch(command) {
            Dispatch::Rendered | Dispatch::Ignored => None,
            Dispatch::SwitchMode(command) => Some(self.switch_mode(command).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Resource, TransportError};

    fn loaded_state(nodes: usize) -> PanelState {
        let mut payload = StatusPayload::new("tailscale:node-00");
        for index in 0..nodes {
            payload = payload.with_node(format!("node-{index:02}"), true);
        }
        let mut state = PanelState::default();
        assert!(state.apply_status(Ok(payload)));
        state
    }

    #[test]
    fn page_commands_report_boundaries() {
        let mut state = loaded_state(12);
        assert_eq!(state.dispatch(PanelCommand::PrevPage), Dispatch::Ignored);
        assert_eq!(state.dispatch(PanelCommand::NextPage), Dispatch::Rendered);
        assert_eq!(state.dispatch(PanelCommand::NextPage), Dispatch::Ignored);
        let view = state.view();
        assert_eq!(view.page_info, "Page 2 of 2");
        assert!(view.prev_enabled);
        assert!(!view.next_enabled);
    }

    #[test]
    fn selecting_active_node_is_ignored() {
        let mut state = loaded_state(3);
        assert_eq!(
            state.dispatch(PanelCommand::SelectNode("node-00".to_string())),
            Dispatch::Ignored
        );
        assert_eq!(
            state.dispatch(PanelCommand::SelectNode("node-01".to_string())),
            Dispatch::SwitchMode(ModeCommand::exit_node("node-01"))
        );
        assert_eq!(
            state.dispatch(PanelCommand::SelectDirect),
            Dispatch::SwitchMode(ModeCommand::direct())
        );
    }

    #[test]
    fn failed_refresh_keeps_view_and_page() {
        let mut state = loaded_state(12);
        state.dispatch(PanelCommand::NextPage);
        let before = state.view();

        let changed = state.apply_status(Err(PanelError::ResourceLoad {
            resource: Resource::Status,
            source: TransportError::network("offline"),
        }));

        assert!(!changed);
        assert_eq!(state.view(), before);
    }

    #[test]
    fn session_expiry_is_flagged_until_next_success() {
        let mut state = loaded_state(1);
        state.apply_status(Err(PanelError::ResourceLoad {
            resource: Resource::Status,
            source: TransportError::SessionExpired,
        }));
        assert!(state.view().session_expired);

        state.apply_status(Ok(StatusPayload::new("direct")));
        assert!(!state.view().session_expired);
    }

    #[test]
    fn settled_mode_switch_shows_notification() {
        let mut state = loaded_state(2);
        let (outcome, ticket) = state.settle_mode(ModeCommand::exit_node("node-01"), Ok(()));
        assert!(outcome.refresh_requested());
        assert_eq!(
            state.view().notification.map(|n| n.message),
            Some("Switched to tailscale (node-01)".to_string())
        );
        assert!(state.notifications_mut().begin_fade(ticket));
    }
}
