use super::*;

use std::io;

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

    pub(super) fn set_boot_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = phase.to_string();
            state.detail = detail.to_string();
            if phase != "error" {
                state.last_error = None;
            }
        });
        tracing::debug!(phase, detail, "boot phase");
    }

    pub(super) fn set_boot_error(message: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = "error".to_string();
            state.detail = "startup failed".to_string();
            state.last_error = Some(message.to_string());
        });
        tracing::error!(error = message, "exit panel failed to start");
    }

    /// Reads overrides from `window.__EXIT_PANEL_CONFIG__`, an optional plain
    /// object keyed like the CLI's environment variables.
    pub(super) fn load_browser_config() -> Result<PanelConfig, String> {
        let Some(window) = web_sys::window() else {
            return Err("window is unavailable".to_string());
        };
        let overrides = js_sys::Reflect::get(&window, &JsValue::from_str(BROWSER_CONFIG_GLOBAL))
            .ok()
            .filter(|value| value.is_object());
        let Some(overrides) = overrides else {
            return Ok(PanelConfig::default());
        };
        PanelConfig::from_lookup(|key| {
            let value = js_sys::Reflect::get(&overrides, &JsValue::from_str(key)).ok()?;
            value
                .as_string()
                .or_else(|| value.as_f64().map(|number| number.to_string()))
        })
        .map_err(|error| format!("invalid {BROWSER_CONFIG_GLOBAL}: {error}"))
    }

    pub(super) fn navigate_to(path: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(error) = window.location().set_href(path) {
            tracing::warn!(path, error = ?error, "navigation failed");
        }
    }

    pub(super) fn now_unix_ms() -> u64 {
        let now = js_sys::Date::now();
        if !now.is_finite() || now.is_sign_negative() {
            return 0;
        }
        now.floor().min(u64::MAX as f64) as u64
    }

    pub(super) fn install_console_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(Level::INFO)
            .with_writer(ConsoleMakeWriter)
            .try_init();
    }

    /// Routes formatted events to the matching `console` method.
    pub(super) struct ConsoleMakeWriter;

    pub(super) struct ConsoleWriter {
        level: Level,
        buffer: Vec<u8>,
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buffer: Vec::new(),
            }
        }
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.buffer.is_empty() {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&self.buffer);
            let line = JsValue::from_str(line.trim_end());
            match self.level {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                Level::INFO => web_sys::console::info_1(&line),
                _ => web_sys::console::debug_1(&line),
            }
            self.buffer.clear();
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let _ = io::Write::flush(self);
        }
    }
