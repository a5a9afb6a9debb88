use serde::Serialize;

use crate::notification::Notification;
use crate::pagination::Page;
use crate::status::ViewItem;

/// Everything a render adapter needs for one frame of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    /// Friendly label of the mode the backend reports; `None` before the
    /// first successful status fetch.
    pub current_mode: Option<String>,
    pub items: Vec<ViewItem>,
    pub page_number: usize,
    pub page_count: usize,
    pub page_info: String,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub notification: Option<Notification>,
    pub session_expired: bool,
}

impl PanelView {
    pub(crate) fn assemble(
        current_mode: Option<String>,
        page: &Page<'_>,
        notification: Option<Notification>,
        session_expired: bool,
    ) -> Self {
        Self {
            current_mode,
            items: page.items.to_vec(),
            page_number: page.page_number,
            page_count: page.page_count,
            page_info: page.label(),
            prev_enabled: page.has_prev(),
            next_enabled: page.has_next(),
            notification,
            session_expired,
        }
    }
}
