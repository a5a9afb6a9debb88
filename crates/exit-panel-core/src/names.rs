use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PanelError;
use crate::transport::PanelTransport;

/// Display name used when an identifier is missing or blank.
pub const UNKNOWN_NODE_NAME: &str = "Unknown";

// Leftmost, non-greedy, anchored at the end of the identifier. Dot-all keeps
// `normalize` idempotent for identifiers that contain line breaks.
#[expect(clippy::expect_used, reason = "the pattern is a literal")]
static TRAILING_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\s*\(.*?\)\s*$").expect("trailing annotation pattern compiles")
});

/// Canonical lookup form of a raw node identifier. Never displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims, lower-cases and strips one trailing parenthetical annotation.
///
/// `"NYC-exit.mullvad.ts.net (US, New York)"` becomes
/// `"nyc-exit.mullvad.ts.net"`. The annotation match starts at the leftmost
/// position from which `\s*\(.*?\)\s*$` matches, so `"a (b) c (d)"` collapses
/// to `"a"` and an unbalanced `"a (b"` is left untouched.
pub fn normalize(raw: &str) -> NormalizedKey {
    let lowered = raw.trim().to_lowercase();
    let stripped = TRAILING_ANNOTATION.replace(&lowered, "");
    NormalizedKey(stripped.into_owned())
}

/// Friendly display names keyed by normalized identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendlyNameTable {
    entries: HashMap<NormalizedKey, String>,
}

impl FriendlyNameTable {
    /// Builds a table from the raw dictionary document, normalizing every key
    /// with [`normalize`]. Later keys win when two normalize to the same value.
    pub fn from_document(document: &Map<String, Value>) -> Self {
        let mut entries = HashMap::with_capacity(document.len());
        for (raw_key, value) in document {
            let Some(display) = value.as_str() else {
                tracing::debug!(key = %raw_key, "skipping non-string friendly name entry");
                continue;
            };
            entries.insert(normalize(raw_key), display.to_string());
        }
        Self { entries }
    }

    pub fn get(&self, key: &NormalizedKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &NormalizedKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FriendlyNameTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| (normalize(key.as_ref()), value.into()))
            .collect();
        Self { entries }
    }
}

/// Resolves raw node identifiers to friendly display names.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    table: FriendlyNameTable,
}

impl NameResolver {
    pub fn new(table: FriendlyNameTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FriendlyNameTable {
        &self.table
    }

    pub fn has_mapping(&self, key: &NormalizedKey) -> bool {
        self.table.contains(key)
    }

    pub fn lookup(&self, key: &NormalizedKey) -> Option<&str> {
        self.table.get(key)
    }

    /// Friendly name for `raw`, or `raw` itself (original casing and suffix)
    /// when the table has no entry.
    pub fn resolve(&self, raw: &str) -> String {
        self.lookup(&normalize(raw))
            .map_or_else(|| raw.to_string(), ToString::to_string)
    }

    /// Like [`NameResolver::resolve`] but tolerates a missing or blank
    /// identifier, answering [`UNKNOWN_NODE_NAME`].
    pub fn resolve_optional(&self, raw: Option<&str>) -> String {
        match raw {
            Some(raw) if !raw.is_empty() => self.resolve(raw),
            _ => UNKNOWN_NODE_NAME.to_string(),
        }
    }

    /// Installs the outcome of a dictionary fetch. A failed fetch leaves the
    /// table empty so every lookup falls back to the raw identifier.
    pub fn install(&mut self, fetched: Result<Map<String, Value>, PanelError>) {
        match fetched {
            Ok(document) => {
                self.table = FriendlyNameTable::from_document(&document);
                tracing::info!(entries = self.table.len(), "friendly name table loaded");
            }
            Err(error) => {
                self.table = FriendlyNameTable::default();
                tracing::warn!(error = %error, "friendly name table unavailable; using raw identifiers");
            }
        }
    }

    /// Fetches the dictionary once and installs it. Never fails; see
    /// [`NameResolver::install`].
    pub async fn load_table<T: PanelTransport + ?Sized>(&mut self, transport: &T) {
        let fetched = transport.fetch_friendly_names().await;
        self.install(fetched);
    }
}
