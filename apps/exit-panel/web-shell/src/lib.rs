#[cfg(any(target_arch = "wasm32", test))]
mod render_plan;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};

    use web_time::Instant;

    use async_trait::async_trait;
    use exit_panel_core::config::{
        FRIENDLY_NAMES_PATH, LOGIN_PATH, LOGOUT_PATH, SET_MODE_PATH, STATUS_PATH,
    };
    use exit_panel_core::{
        Dispatch, ModeCommand, NotificationTicket, PanelCommand, PanelConfig, PanelError,
        PanelState, PanelTransport, Resource, StatusPayload, TransportError, is_login_location,
    };
    use gloo_net::http::Request;
    use gloo_timers::future::sleep;
    use serde_json::{Map, Value};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{HtmlButtonElement, HtmlElement};

    use crate::render_plan::{NodeRow, RenderPlan, SEPARATOR_CLASS};
    use crate::wasm_constants::*;
    use crate::wasm_state::ShellDiagnostics;

    mod dom;
    mod lifecycle;
    mod network;

    use dom::*;
    use lifecycle::*;
    use network::*;

    thread_local! {
        static PANEL_STATE: RefCell<PanelState> = RefCell::new(PanelState::default());
        static DIAGNOSTICS: RefCell<ShellDiagnostics> = RefCell::new(ShellDiagnostics::default());
        static POLL_LOOP_ACTIVE: Cell<bool> = const { Cell::new(false) };
        static NODE_LIST_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static PREV_PAGE_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static NEXT_PAGE_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static DIRECT_MODE_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static LOGOUT_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        install_console_tracing();
        set_boot_phase("booting", "initializing exit panel");
        spawn_local(async {
            if let Err(error) = boot().await {
                set_boot_error(&error);
            }
        });
    }

    #[wasm_bindgen]
    pub fn boot_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn panel_state_json() -> String {
        PANEL_STATE.with(|state| {
            serde_json::to_string(&state.borrow().view()).unwrap_or_else(|_| "{}".to_string())
        })
    }

    #[wasm_bindgen]
    pub fn select_exit_node(raw: String) {
        dispatch_command(PanelCommand::SelectNode(raw));
    }

    #[wasm_bindgen]
    pub fn select_direct() {
        dispatch_command(PanelCommand::SelectDirect);
    }

    #[wasm_bindgen]
    pub fn next_page() {
        dispatch_command(PanelCommand::NextPage);
    }

    #[wasm_bindgen]
    pub fn prev_page() {
        dispatch_command(PanelCommand::PrevPage);
    }

    #[wasm_bindgen]
    pub fn refresh_status() {
        spawn_local(refresh_status_now());
    }

    #[wasm_bindgen]
    pub fn logout() {
        navigate_to(LOGOUT_PATH);
    }

    async fn boot() -> Result<(), String> {
        let boot_started_at = Instant::now();
        let config = load_browser_config()?;
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.boot_started_at_unix_ms = Some(now_unix_ms());
            state.boot_total_latency_ms = None;
            state.poll_interval_ms = config
                .poll_interval
                .map(|interval| u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        });
        PANEL_STATE.with(|state| *state.borrow_mut() = PanelState::new(&config));

        ensure_panel_dom()?;
        install_panel_handlers();
        render_panel_dom();

        set_boot_phase("booting", "loading friendly names");
        let names = GlooPanelTransport.fetch_friendly_names().await;
        let names_loaded = names.is_ok();
        PANEL_STATE.with(|state| state.borrow_mut().install_names(names));
        DIAGNOSTICS.with(|state| state.borrow_mut().names_loaded = names_loaded);

        set_boot_phase("booting", "fetching status");
        refresh_status_now().await;

        if let Some(interval) = config.poll_interval {
            start_status_poll_loop(interval);
        }

        let boot_total_latency_ms =
            u64::try_from(boot_started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        DIAGNOSTICS.with(|state| {
            state.borrow_mut().boot_total_latency_ms = Some(boot_total_latency_ms);
        });
        set_boot_phase("ready", "exit panel ready");
        Ok(())
    }

    fn dispatch_command(command: PanelCommand) {
        let dispatch = PANEL_STATE.with(|state| state.borrow_mut().dispatch(command));
        match dispatch {
            Dispatch::Rendered => render_panel_dom(),
            Dispatch::Ignored => {}
            Dispatch::SwitchMode(command) => spawn_local(run_mode_switch(command)),
        }
    }

    async fn run_mode_switch(command: ModeCommand) {
        let result = GlooPanelTransport.send_mode(&command).await;
        let (outcome, ticket) =
            PANEL_STATE.with(|state| state.borrow_mut().settle_mode(command, result));
        render_panel_dom();
        schedule_notification_timers(ticket);
        if outcome.session_expired() {
            navigate_to(LOGIN_PATH);
        } else if outcome.refresh_requested() {
            refresh_status_now().await;
        }
    }

    /// Applies whatever `/status` answers. Overlapping refreshes are not
    /// serialized; the last one to resolve wins.
    async fn refresh_status_now() {
        let fetched = GlooPanelTransport.fetch_status().await;
        let session_expired = fetched
            .as_ref()
            .err()
            .is_some_and(PanelError::is_session_expired);
        let applied = PANEL_STATE.with(|state| state.borrow_mut().apply_status(fetched));
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.status_refreshes += 1;
            if applied {
                state.last_status_at_unix_ms = Some(now_unix_ms());
            } else {
                state.status_failures += 1;
            }
        });
        render_panel_dom();
        if session_expired {
            navigate_to(LOGIN_PATH);
        }
    }

    fn schedule_notification_timers(ticket: NotificationTicket) {
        let (display, fade) = PANEL_STATE.with(|state| {
            let state = state.borrow();
            (
                state.notifications().display_duration(),
                state.notifications().fade_duration(),
            )
        });
        spawn_local(async move {
            sleep(display).await;
            if !PANEL_STATE.with(|state| state.borrow_mut().notifications_mut().begin_fade(ticket)) {
                return;
            }
            render_panel_dom();
            sleep(fade).await;
            if PANEL_STATE.with(|state| state.borrow_mut().notifications_mut().remove(ticket)) {
                render_panel_dom();
            }
        });
    }

    fn start_status_poll_loop(interval: std::time::Duration) {
        if POLL_LOOP_ACTIVE.with(Cell::get) {
            return;
        }
        POLL_LOOP_ACTIVE.with(|active| active.set(true));
        spawn_local(async move {
            loop {
                sleep(interval).await;
                refresh_status_now().await;
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{boot_diagnostics_json, panel_state_json};

#[cfg(not(target_arch = "wasm32"))]
pub fn boot_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"exit panel diagnostics only available on wasm\"}".to_string()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn panel_state_json() -> String {
    "{}".to_string()
}
