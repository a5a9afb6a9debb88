#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use exit_panel_core::{NodeEntry, NotificationPhase, PanelView, ViewItem};
use serde::Serialize;

pub const EXIT_NODE_CLASS: &str = "exit-node";
pub const PRIVATE_NODE_CLASS: &str = "private-node";
pub const ACTIVE_NODE_CLASS: &str = "active-node";
pub const SEPARATOR_CLASS: &str = "separator";

/// DOM-free description of one panel frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub current_mode: String,
    pub rows: Vec<NodeRow>,
    pub page_info: String,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub notification: Option<NotificationPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRow {
    Separator,
    Button(NodeButton),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeButton {
    pub label: String,
    /// Raw identifier sent back on click; carried in `data-node`.
    pub raw: String,
    pub class_name: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPlan {
    pub message: String,
    pub display: &'static str,
    pub opacity: &'static str,
}

impl RenderPlan {
    pub fn from_view(view: &PanelView) -> Self {
        Self {
            current_mode: view.current_mode.clone().unwrap_or_default(),
            rows: view.items.iter().map(plan_row).collect(),
            page_info: view.page_info.clone(),
            prev_disabled: !view.prev_enabled,
            next_disabled: !view.next_enabled,
            notification: view.notification.as_ref().map(|notification| NotificationPlan {
                message: notification.message.clone(),
                display: "block",
                opacity: match notification.phase {
                    NotificationPhase::Visible => "1",
                    NotificationPhase::Fading => "0",
                },
            }),
        }
    }
}

fn plan_row(item: &ViewItem) -> NodeRow {
    match item {
        ViewItem::Separator => NodeRow::Separator,
        ViewItem::Node(entry) => NodeRow::Button(plan_button(entry)),
    }
}

fn plan_button(entry: &NodeEntry) -> NodeButton {
    let base = if entry.provider_hosted {
        EXIT_NODE_CLASS
    } else {
        PRIVATE_NODE_CLASS
    };
    let class_name = if entry.active {
        format!("{base} {ACTIVE_NODE_CLASS}")
    } else {
        base.to_string()
    };
    NodeButton {
        label: entry.display_name.clone(),
        raw: entry.raw.clone(),
        class_name,
        disabled: !entry.is_interactive(),
    }
}
