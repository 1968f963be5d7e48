//! Scanner control characters.

use super::scope::RESERVED_SCOPE;
use super::table::DefinitionTable;

/// Default escape character.
pub const DEFAULT_ESCAPE: char = '\\';
/// Default sigil introducing a reference.
pub const DEFAULT_SIGIL: char = '$';
/// Default opening brace of a braced reference.
pub const DEFAULT_BRACE_OPEN: char = '{';
/// Default closing brace of a braced reference.
pub const DEFAULT_BRACE_CLOSE: char = '}';

/// The four characters driving the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaChars {
    pub escape: char,
    pub sigil: char,
    pub brace_open: char,
    pub brace_close: char,
}

impl Default for MetaChars {
    fn default() -> Self {
        Self {
            escape: DEFAULT_ESCAPE,
            sigil: DEFAULT_SIGIL,
            brace_open: DEFAULT_BRACE_OPEN,
            brace_close: DEFAULT_BRACE_CLOSE,
        }
    }
}

impl MetaChars {
    /// Reads the current set from `mod_define::{escape,dollar,braceopen,braceclose}`.
    ///
    /// Each lookup goes through the normal resolution path, so an unset
    /// override may still be picked up from the environment. Only the first
    /// character of a value is used; an empty value keeps the default.
    #[must_use]
    pub fn resolve(table: &DefinitionTable) -> Self {
        let lookup = |name: &str, default: char| {
            table
                .get(name, Some(RESERVED_SCOPE))
                .and_then(|value| value.chars().next())
                .unwrap_or(default)
        };

        Self {
            escape: lookup("escape", DEFAULT_ESCAPE),
            sigil: lookup("dollar", DEFAULT_SIGIL),
            brace_open: lookup("braceopen", DEFAULT_BRACE_OPEN),
            brace_close: lookup("braceclose", DEFAULT_BRACE_CLOSE),
        }
    }
}
