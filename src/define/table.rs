//! Definition table with environment fallback.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::meta::MetaChars;
use super::scope::{RESERVED_SCOPE, SCOPE_SEPARATOR, is_scoped, make_key};

/// Maximum Damerau-Levenshtein distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

/// Read-only string lookup consulted when a scoped lookup misses.
pub trait Environment: Send + Sync {
    /// Returns the value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Scoped key/value store populated by `Define`.
///
/// Keys compare ASCII case-insensitively (`Define Root` is reachable as
/// `$root`) but keep the spelling of their first definition for listing.
/// The environment fallback stays case-sensitive.
///
/// The table starts out uninitialized. The first [`define`](Self::define)
/// seeds the built-in `mod_define::*` entries and marks substitution as
/// active; [`clear`](Self::clear) returns it to that pristine state.
pub struct DefinitionTable {
    entries: IndexMap<String, Entry>,
    initialized: bool,
    seen_define: bool,
    env: Arc<dyn Environment>,
}

/// A stored definition, under its folded lookup key.
#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
}

fn fold(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl fmt::Debug for DefinitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionTable")
            .field("entries", &self.entries.values().collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .field("seen_define", &self.seen_define)
            .finish_non_exhaustive()
    }
}

impl Default for DefinitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionTable {
    /// Creates an empty table backed by the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_environment(Arc::new(ProcessEnvironment))
    }

    /// Creates an empty table with a custom environment fallback.
    #[must_use]
    pub fn with_environment(env: Arc<dyn Environment>) -> Self {
        Self {
            entries: IndexMap::new(),
            initialized: false,
            seen_define: false,
            env,
        }
    }

    /// Stores `value` under the exact key `scoped_key`. Last write wins;
    /// a key differing only in case replaces the value but keeps the
    /// first spelling.
    pub fn set(&mut self, scoped_key: impl Into<String>, value: impl Into<String>) {
        self.ensure_initialized();
        self.insert(scoped_key.into(), value.into());
    }

    fn insert(&mut self, key: String, value: String) {
        self.entries
            .entry(fold(&key))
            .and_modify(|entry| entry.value.clone_from(&value))
            .or_insert(Entry { key, value });
    }

    /// Registers a definition as the `Define` directive does.
    ///
    /// Returns the key the value was stored under.
    pub fn define(&mut self, name: &str, value: impl Into<String>, scope: Option<&str>) -> String {
        let key = make_key(name, scope);
        self.set(key.clone(), value);
        self.seen_define = true;
        tracing::debug!(key = %key, "definition registered");
        key
    }

    /// Removes the definition of `name` in `scope`. Returns `true` if it
    /// existed. Substitution stays active.
    pub fn undefine(&mut self, name: &str, scope: Option<&str>) -> bool {
        self.entries.shift_remove(&fold(&make_key(name, scope))).is_some()
    }

    /// Resolves `name` as seen from `scope`.
    ///
    /// Tries the scoped key first, then the raw unscoped `name` in the
    /// environment. Absence is a normal outcome.
    #[must_use]
    pub fn get(&self, name: &str, scope: Option<&str>) -> Option<Cow<'_, str>> {
        if let Some(value) = self.get_exact(&make_key(name, scope)) {
            return Some(Cow::Borrowed(value));
        }
        self.env.var(name).map(Cow::Owned)
    }

    /// Returns the value stored under an exact key, without fallback.
    #[must_use]
    pub fn get_exact(&self, scoped_key: &str) -> Option<&str> {
        self.entries.get(&fold(scoped_key)).map(|e| e.value.as_str())
    }

    /// Whether any definition was registered during this cycle.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.seen_define
    }

    /// Current meta characters, honoring overrides stored in the table.
    #[must_use]
    pub fn meta_chars(&self) -> MetaChars {
        MetaChars::resolve(self)
    }

    /// Suggests the closest defined name visible from `scope`.
    ///
    /// Without a scope only unscoped keys are candidates.
    #[must_use]
    pub fn suggest(&self, name: &str, scope: Option<&str>) -> Option<String> {
        let prefix = scope
            .filter(|s| !s.is_empty())
            .map(|s| fold(&format!("{s}{SCOPE_SEPARATOR}")));
        let folded = fold(name);

        self.entries
            .iter()
            .filter_map(|(lookup, entry)| match &prefix {
                // folding is ASCII-only, so byte offsets agree
                Some(prefix) => lookup
                    .starts_with(prefix.as_str())
                    .then(|| &entry.key[prefix.len()..]),
                None => (!is_scoped(&entry.key)).then_some(entry.key.as_str()),
            })
            .filter(|candidate| fold(candidate) != folded)
            .map(|candidate| (candidate, strsim::damerau_levenshtein(&folded, &fold(candidate))))
            .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
            .min_by_key(|(_, dist)| *dist)
            .map(|(candidate, _)| candidate.to_string())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Number of stored entries, seeded ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and clears the active flag.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.initialized = false;
        self.seen_define = false;
    }

    fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        let defaults = MetaChars::default();
        for (name, value) in [
            ("escape", defaults.escape.to_string()),
            ("dollar", defaults.sigil.to_string()),
            ("open", defaults.brace_open.to_string()),
            ("close", defaults.brace_close.to_string()),
            ("empty", String::new()),
        ] {
            self.insert(make_key(name, Some(RESERVED_SCOPE)), value);
        }
    }
}
