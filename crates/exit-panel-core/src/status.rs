use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{DEFAULT_MODE_PREFIX, DEFAULT_PROVIDER_MARKER, PanelConfig};
use crate::error::PanelError;
use crate::names::{NameResolver, NormalizedKey, normalize};
use crate::transport::PanelTransport;

/// `GET /status` document. Node order follows the JSON object order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "exitNodes", default)]
    pub exit_nodes: Option<Map<String, Value>>,
}

/// Per-node details as reported by the backend. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitNodeDetails {
    #[serde(rename = "Active", default)]
    pub active: bool,
    #[serde(rename = "IP", default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(rename = "Hostname", default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl StatusPayload {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: Some(mode.into()),
            exit_nodes: Some(Map::new()),
        }
    }

    /// Appends a node, keeping insertion order.
    pub fn with_node(mut self, raw: impl Into<String>, active: bool) -> Self {
        let details = serde_json::json!({ "Active": active });
        self.exit_nodes
            .get_or_insert_with(Map::new)
            .insert(raw.into(), details);
        self
    }

    /// Nodes in payload order. Details that fail to decode read as offline.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, ExitNodeDetails)> + '_ {
        self.exit_nodes.iter().flatten().map(|(raw, details)| {
            let details = serde_json::from_value::<ExitNodeDetails>(details.clone())
                .unwrap_or_default();
            (raw.as_str(), details)
        })
    }
}

/// Substring that marks a node as hosted by the VPN provider rather than
/// self-hosted on the tailnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMarker(String);

impl ProviderMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn matches(&self, raw: &str) -> bool {
        raw.contains(&self.0)
    }
}

impl Default for ProviderMarker {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_MARKER)
    }
}

/// Priority tier of a node in the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    FriendlyPrivate,
    FriendlyProvider,
    Generic,
}

impl NodeCategory {
    pub const PRIORITY: [Self; 3] = [Self::FriendlyPrivate, Self::FriendlyProvider, Self::Generic];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub raw: String,
    pub key: NormalizedKey,
    pub display_name: String,
    pub category: NodeCategory,
    pub provider_hosted: bool,
    /// Currently selected exit node; rendered disabled.
    pub active: bool,
}

impl NodeEntry {
    pub fn is_interactive(&self) -> bool {
        !self.active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewItem {
    Node(NodeEntry),
    Separator,
}

impl ViewItem {
    pub fn as_node(&self) -> Option<&NodeEntry> {
        match self {
            Self::Node(entry) => Some(entry),
            Self::Separator => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}

/// Ordered entries and separators, rebuilt in full on every status fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewModel {
    items: Vec<ViewItem>,
}

impl ViewModel {
    /// Concatenates category groups in priority order with one separator
    /// between adjacent non-empty groups.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Vec<NodeEntry>>,
    {
        let mut items = Vec::new();
        for group in groups.into_iter().filter(|group| !group.is_empty()) {
            if !items.is_empty() {
                items.push(ViewItem::Separator);
            }
            items.extend(group.into_iter().map(ViewItem::Node));
        }
        Self { items }
    }

    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    /// Positional length; separators count.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &NodeEntry> {
        self.items.iter().filter_map(ViewItem::as_node)
    }

    pub fn active_entry(&self) -> Option<&NodeEntry> {
        self.entries().find(|entry| entry.active)
    }
}

impl From<Vec<ViewItem>> for ViewModel {
    fn from(items: Vec<ViewItem>) -> Self {
        Self { items }
    }
}

/// Mode the backend reports as current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMode {
    pub key: NormalizedKey,
    pub label: String,
}

/// Result of reconciling one status payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub current_mode: CurrentMode,
    pub view_model: ViewModel,
}

/// Turns status payloads into view-models.
#[derive(Debug, Clone)]
pub struct StatusReconciler {
    mode_prefix: String,
    provider_marker: ProviderMarker,
}

impl Default for StatusReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_MODE_PREFIX, ProviderMarker::default())
    }
}

impl StatusReconciler {
    pub fn new(mode_prefix: impl Into<String>, provider_marker: ProviderMarker) -> Self {
        Self {
            mode_prefix: mode_prefix.into(),
            provider_marker,
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(
            config.mode_prefix.clone(),
            ProviderMarker::new(config.provider_marker.clone()),
        )
    }

    /// Normalized key of a reported mode, with the prefix token removed
    /// case-insensitively.
    pub fn mode_key(&self, mode: &str) -> NormalizedKey {
        normalize(strip_prefix_ignore_case(mode.trim_start(), &self.mode_prefix))
    }

    pub fn classify(&self, raw: &str, key: &NormalizedKey, resolver: &NameResolver) -> NodeCategory {
        match (resolver.has_mapping(key), self.provider_marker.matches(raw)) {
            (true, false) => NodeCategory::FriendlyPrivate,
            (true, true) => NodeCategory::FriendlyProvider,
            (false, _) => NodeCategory::Generic,
        }
    }

    /// Pure reconciliation of a payload against the loaded name table.
    pub fn reconcile(&self, payload: &StatusPayload, resolver: &NameResolver) -> Reconciliation {
        let mode_key = self.mode_key(payload.mode.as_deref().unwrap_or_default());
        let label = resolver
            .lookup(&mode_key)
            .map_or_else(|| mode_key.to_string(), ToString::to_string);

        let mut groups: HashMap<NodeCategory, Vec<NodeEntry>> = HashMap::new();
        let mut active_assigned = false;
        let mut skipped = 0_usize;

        for (raw, details) in payload.nodes() {
            if !details.active {
                skipped += 1;
                continue;
            }
            let key = normalize(raw);
            let category = self.classify(raw, &key, resolver);
            let active = !active_assigned && !mode_key.is_empty() && key == mode_key;
            active_assigned |= active;
            let entry = NodeEntry {
                raw: raw.to_string(),
                display_name: resolver
                    .lookup(&key)
                    .map_or_else(|| raw.to_string(), ToString::to_string),
                provider_hosted: self.provider_marker.matches(raw),
                key,
                category,
                active,
            };
            groups.entry(category).or_default().push(entry);
        }

        let groups =
            NodeCategory::PRIORITY.map(|category| groups.remove(&category).unwrap_or_default());
        tracing::debug!(
            private = groups[0].len(),
            provider = groups[1].len(),
            generic = groups[2].len(),
            skipped,
            mode = %mode_key,
            "reconciled status payload"
        );

        Reconciliation {
            current_mode: CurrentMode {
                key: mode_key,
                label,
            },
            view_model: ViewModel::from_groups(groups),
        }
    }

    /// Reconciles a status fetch result. A failure is logged and handed back
    /// so the caller keeps its previous view.
    pub fn settle(
        &self,
        fetched: Result<StatusPayload, PanelError>,
        resolver: &NameResolver,
    ) -> Result<Reconciliation, PanelError> {
        match fetched {
            Ok(payload) => Ok(self.reconcile(&payload, resolver)),
            Err(error) => {
                tracing::warn!(error = %error, "status refresh failed; keeping previous view");
                Err(error)
            }
        }
    }

    /// Fetches status and reconciles it; see [`StatusReconciler::settle`].
    pub async fn refresh<T: PanelTransport + ?Sized>(
        &self,
        transport: &T,
        resolver: &NameResolver,
    ) -> Result<Reconciliation, PanelError> {
        self.settle(transport.fetch_status().await, resolver)
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
            &value[prefix.len()..]
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::names::FriendlyNameTable;

    fn resolver() -> NameResolver {
        let table: FriendlyNameTable = [
            ("home-pi", "Home"),
            ("office", "Office"),
            ("se-sto-wg-001.mullvad.ts.net", "Stockholm"),
            ("us-nyc-wg-301.mullvad.ts.net", "New York"),
        ]
        .into_iter()
        .collect();
        NameResolver::new(table)
    }

    fn raws(view_model: &ViewModel) -> Vec<String> {
        view_model
            .items()
            .iter()
            .map(|item| match item {
                ViewItem::Node(entry) => entry.raw.clone(),
                ViewItem::Separator => "|".to_string(),
            })
            .collect()
    }

    #[test]
    fn groups_by_priority_and_skips_offline_nodes() {
        let payload = StatusPayload::new("tailscale:home-pi")
            .with_node("home-pi", true)
            .with_node("office", false)
            .with_node("se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)", true)
            .with_node("random-box", true);

        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());

        assert_eq!(
            raws(&reconciliation.view_model),
            vec![
                "home-pi",
                "|",
                "se-sto-wg-001.mullvad.ts.net (Sweden, Stockholm)",
                "|",
                "random-box"
            ]
        );
        let active: Vec<_> = reconciliation
            .view_model
            .entries()
            .filter(|entry| entry.active)
            .map(|entry| entry.raw.as_str())
            .collect();
        assert_eq!(active, vec!["home-pi"]);
        assert_eq!(reconciliation.current_mode.label, "Home");
    }

    #[test]
    fn empty_groups_contribute_no_separator() {
        let payload = StatusPayload::new("direct")
            .with_node("random-box", true)
            .with_node("us-nyc-wg-301.mullvad.ts.net (USA, New York)", true)
            .with_node("another-box", true);

        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());

        assert_eq!(
            raws(&reconciliation.view_model),
            vec![
                "us-nyc-wg-301.mullvad.ts.net (USA, New York)",
                "|",
                "random-box",
                "another-box"
            ]
        );
        assert!(reconciliation.view_model.active_entry().is_none());
        assert_eq!(reconciliation.current_mode.label, "direct");
    }

    #[test]
    fn single_group_has_no_separators() {
        let payload = StatusPayload::new("direct")
            .with_node("home-pi", true)
            .with_node("office", true);
        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        assert_eq!(raws(&reconciliation.view_model), vec!["home-pi", "office"]);
    }

    #[test]
    fn mode_prefix_is_stripped_case_insensitively() {
        let reconciler = StatusReconciler::default();
        assert_eq!(
            reconciler.mode_key("TailScale:SE-STO-WG-001.mullvad.ts.net (Sweden, Stockholm)"),
            normalize("se-sto-wg-001.mullvad.ts.net")
        );
        assert_eq!(reconciler.mode_key("direct"), normalize("direct"));
    }

    #[test]
    fn active_entry_matches_annotated_mode_and_is_unique() {
        let payload = StatusPayload::new("tailscale:US-NYC-WG-301.mullvad.ts.net (USA, New York)")
            .with_node("us-nyc-wg-301.mullvad.ts.net (USA, New York)", true)
            .with_node("US-NYC-WG-301.mullvad.ts.net", true)
            .with_node("home-pi", true);

        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        let active: Vec<_> = reconciliation
            .view_model
            .entries()
            .filter(|entry| entry.active)
            .collect();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].raw, "us-nyc-wg-301.mullvad.ts.net (USA, New York)");
        assert!(!active[0].is_interactive());
        assert_eq!(reconciliation.current_mode.label, "New York");
    }

    #[test]
    fn unmapped_names_keep_raw_display_and_provider_flag() {
        let payload = StatusPayload::new("direct")
            .with_node("de-fra-wg-002.mullvad.ts.net (Germany, Frankfurt)", true);
        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        let entry = reconciliation
            .view_model
            .entries()
            .next()
            .expect("one entry");
        assert_eq!(entry.category, NodeCategory::Generic);
        assert!(entry.provider_hosted);
        assert_eq!(
            entry.display_name,
            "de-fra-wg-002.mullvad.ts.net (Germany, Frankfurt)"
        );
    }

    #[test]
    fn payload_order_and_lenient_details_survive_decoding() {
        let payload: StatusPayload = serde_json::from_value(json!({
            "mode": "tailscale:zeta",
            "exitNodes": {
                "zeta": { "Active": true, "IP": "100.64.0.9", "Hostname": "zeta" },
                "alpha": { "Active": true },
                "broken": "not-an-object",
                "missing": {}
            }
        }))
        .expect("status payload");

        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        assert_eq!(raws(&reconciliation.view_model), vec!["zeta", "alpha"]);
        assert_eq!(
            reconciliation.view_model.active_entry().map(|entry| entry.raw.as_str()),
            Some("zeta")
        );
    }

    #[test]
    fn null_exit_nodes_reconcile_to_empty_view() {
        let payload: StatusPayload =
            serde_json::from_value(json!({ "mode": "direct", "exitNodes": null }))
                .expect("status payload");
        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        assert!(reconciliation.view_model.is_empty());
    }

    #[test]
    fn default_reconciliation_is_empty() {
        let reconciliation = Reconciliation::default();
        assert!(reconciliation.current_mode.key.is_empty());
        assert!(reconciliation.current_mode.label.is_empty());
        assert!(reconciliation.view_model.is_empty());
    }

    #[test]
    fn priority_order_fixes_group_order() {
        assert_eq!(
            NodeCategory::PRIORITY,
            [
                NodeCategory::FriendlyPrivate,
                NodeCategory::FriendlyProvider,
                NodeCategory::Generic
            ]
        );
        let payload = StatusPayload::new("direct")
            .with_node("random-box", true)
            .with_node("se-sto-wg-001.mullvad.ts.net", true)
            .with_node("office", true);
        let reconciliation = StatusReconciler::default().reconcile(&payload, &resolver());
        let categories: Vec<_> = reconciliation
            .view_model
            .entries()
            .map(|entry| entry.category)
            .collect();
        assert_eq!(categories, NodeCategory::PRIORITY.to_vec());
    }

    #[test]
    fn failed_fetch_is_handed_back_unchanged() {
        let error = PanelError::ResourceLoad {
            resource: crate::error::Resource::Status,
            source: crate::error::TransportError::network("connection refused"),
        };
        let settled = StatusReconciler::default().settle(Err(error.clone()), &resolver());
        assert_eq!(settled, Err(error));
    }

    #[test]
    fn custom_provider_marker_drives_classification() {
        let reconciler = StatusReconciler::new("tailscale:", ProviderMarker::new(".proton."));
        let resolver: NameResolver =
            NameResolver::new([("ch-1.proton.example", "Zurich")].into_iter().collect());
        let key = normalize("ch-1.proton.example");
        assert_eq!(
            reconciler.classify("ch-1.proton.example", &key, &resolver),
            NodeCategory::FriendlyProvider
        );
    }
}
