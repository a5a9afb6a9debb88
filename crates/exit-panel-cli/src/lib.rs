#![allow(clippy::print_stdout)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use exit_panel_core::config::normalize_base_url;
use exit_panel_core::{
    ModeSwitchOutcome, NodeEntry, Panel, PanelCommand, PanelConfig, PanelError, PanelView,
    ViewItem, ViewModel, normalize,
};
use tracing_subscriber::EnvFilter;

mod transport;

pub use transport::ReqwestPanelTransport;

#[derive(Parser)]
#[command(name = "exit-panel")]
#[command(about = "Inspect and switch the router's exit node")]
pub struct ExitPanelCli {
    /// Control endpoint origin; overrides EXIT_PANEL_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Print the panel view as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current mode and one page of online exit nodes
    Status {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        page: u16,
    },
    /// Route through an exit node, given by raw identifier or friendly name
    Use { node: String },
    /// Route directly, without an exit node
    Direct,
}

pub async fn run() -> Result<()> {
    let cli = ExitPanelCli::parse();
    init_tracing();

    let mut config = PanelConfig::from_env().context("invalid EXIT_PANEL_* configuration")?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = normalize_base_url(base_url).context("invalid --base-url")?;
    }

    let transport =
        ReqwestPanelTransport::new(&config).context("failed to build HTTP client")?;
    if let Some(credentials) = config.credentials.as_ref() {
        transport
            .login(credentials)
            .await
            .with_context(|| format!("login as {} failed", credentials.username))?;
    }

    let mut panel = Panel::new(transport, &config);
    panel.load_names().await;
    panel.refresh().await.map_err(explain_panel_error)?;

    match cli.command {
        Commands::Status { page } => {
            ensure_page_in_range(&panel.view(), page)?;
            for _ in 1..page {
                panel.dispatch(PanelCommand::NextPage).await;
            }
        }
        Commands::Use { node } => {
            let raw = find_node(panel.state().paginator().view_model(), &node)
                .map_or(node, |entry| entry.raw.clone());
            let outcome = panel.dispatch(PanelCommand::SelectNode(raw.clone())).await;
            report_switch(outcome, &format!("already using {raw}"))?;
        }
        Commands::Direct => {
            let outcome = panel.dispatch(PanelCommand::SelectDirect).await;
            report_switch(outcome, "already direct")?;
        }
    }

    let view = panel.view();
    if cli.json {
        let rendered =
            serde_json::to_string_pretty(&view).context("failed to render JSON output")?;
        println!("{rendered}");
    } else {
        println!("{}", render_view(&view));
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn explain_panel_error(error: PanelError) -> anyhow::Error {
    if error.is_session_expired() {
        anyhow::Error::new(error)
            .context("not logged in; set EXIT_PANEL_USERNAME and EXIT_PANEL_PASSWORD")
    } else {
        anyhow::Error::new(error)
    }
}

fn report_switch(outcome: Option<ModeSwitchOutcome>, unchanged: &str) -> Result<()> {
    let Some(outcome) = outcome else {
        println!("{unchanged}");
        return Ok(());
    };
    println!("{}", outcome.notification);
    match outcome.result {
        Ok(()) => Ok(()),
        Err(error) => Err(explain_panel_error(error)),
    }
}

/// Matches a user-supplied node against the listed entries: exact raw
/// identifier first, then normalized key, then friendly name.
pub fn find_node<'a>(view_model: &'a ViewModel, query: &str) -> Option<&'a NodeEntry> {
    let key = normalize(query);
    let query = query.trim();
    view_model
        .entries()
        .find(|entry| entry.raw == query)
        .or_else(|| view_model.entries().find(|entry| entry.key == key))
        .or_else(|| {
            view_model
                .entries()
                .find(|entry| entry.display_name.eq_ignore_ascii_case(query))
        })
}

/// Plain-text rendering of one page of the panel.
pub fn render_view(view: &PanelView) -> String {
    let mut lines = vec![format!(
        "Current mode: {}",
        view.current_mode.as_deref().unwrap_or("unknown")
    )];
    for item in &view.items {
        match item {
            ViewItem::Separator => lines.push("  ----".to_string()),
            ViewItem::Node(entry) => {
                let marker = if entry.active { '*' } else { ' ' };
                let mut line = format!("{marker} {}", entry.display_name);
                if entry.display_name != entry.raw {
                    line.push_str(&format!("  [{}]", entry.raw));
                }
                lines.push(line);
            }
        }
    }
    lines.push(view.page_info.clone());
    if let Some(notification) = view.notification.as_ref() {
        lines.push(notification.message.clone());
    }
    lines.join("\n")
}

pub fn ensure_page_in_range(view: &PanelView, requested: u16) -> Result<()> {
    if usize::from(requested) > view.page_count.max(1) {
        bail!(
            "page {requested} is out of range ({} page(s) available)",
            view.page_count
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap::error::ErrorKind;
    use exit_panel_core::{PanelState, StatusPayload};
    use serde_json::json;

    use super::*;

    fn state() -> PanelState {
        let mut state = PanelState::new(&PanelConfig::default());
        state.install_names(Ok(json!({ "se-sto-wg-001.mullvad.ts.net": "Stockholm" })
            .as_object()
            .cloned()
            .expect("object document")));
        state.apply_status(Ok(StatusPayload::new("tailscale:home-router")
            .with_node("se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)", true)
            .with_node("home-router", true)));
        state
    }

    #[test]
    fn cli_requires_subcommand() {
        let err = match ExitPanelCli::try_parse_from(["exit-panel"]) {
            Ok(_) => panic!("expected missing subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn cli_parses_use_with_global_flags() {
        let cli = ExitPanelCli::try_parse_from([
            "exit-panel",
            "use",
            "Stockholm",
            "--json",
            "--base-url",
            "http://router.lan:5000",
        ])
        .expect("parse use");
        assert!(cli.json);
        assert_eq!(cli.base_url.as_deref(), Some("http://router.lan:5000"));
        assert!(matches!(cli.command, Commands::Use { node } if node == "Stockholm"));
    }

    #[test]
    fn cli_rejects_page_zero() {
        let err = match ExitPanelCli::try_parse_from(["exit-panel", "status", "--page", "0"]) {
            Ok(_) => panic!("expected page range error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn finds_nodes_by_raw_key_or_friendly_name() {
        let state = state();
        let view_model = state.paginator().view_model();
        let raw = "se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)";

        assert_eq!(find_node(view_model, raw).map(|e| e.raw.as_str()), Some(raw));
        assert_eq!(
            find_node(view_model, "SE-STO-WG-001.mullvad.ts.net").map(|e| e.raw.as_str()),
            Some(raw)
        );
        assert_eq!(
            find_node(view_model, "stockholm").map(|e| e.raw.as_str()),
            Some(raw)
        );
        assert!(find_node(view_model, "paris").is_none());
    }

    #[test]
    fn renders_active_marker_and_page_info() {
        let rendered = render_view(&state().view());
        assert_eq!(
            rendered,
            [
                "Current mode: home-router",
                "  Stockholm  [se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)]",
                "  ----",
                "* home-router",
                "Page 1 of 1",
            ]
            .join("\n")
        );
    }

    #[test]
    fn page_beyond_count_is_rejected() {
        let view = state().view();
        assert!(ensure_page_in_range(&view, 1).is_ok());
        assert!(ensure_page_in_range(&view, 2).is_err());
    }
}
