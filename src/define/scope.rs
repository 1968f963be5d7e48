//! Scoped key construction.
//!
//! A `Define` in `/etc/app/vhost-a.conf` and one in `/etc/app/vhost-b.conf`
//! may use the same variable name. Keys are qualified with the defining
//! file so each file sees its own value: `scope::name`.

/// Separator between scope and name in a scoped key.
pub const SCOPE_SEPARATOR: &str = "::";

/// Reserved scope holding meta-character overrides and seeded entries.
pub const RESERVED_SCOPE: &str = "mod_define";

/// Builds the table key for `name` as seen from `scope`.
///
/// Names already written in `a::b` form (at least one character after the
/// `::`) are returned verbatim so a key is never scoped twice.
#[must_use]
pub fn make_key(name: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) if !scope.is_empty() && !is_scoped(name) => {
            let mut key = String::with_capacity(scope.len() + SCOPE_SEPARATOR.len() + name.len());
            key.push_str(scope);
            key.push_str(SCOPE_SEPARATOR);
            key.push_str(name);
            key
        }
        _ => name.to_string(),
    }
}

/// Returns `true` if the first `:` in `name` starts a `::` pair that is
/// followed by at least one more character.
#[must_use]
pub fn is_scoped(name: &str) -> bool {
    name.find(':').is_some_and(|pos| {
        let rest = &name.as_bytes()[pos + 1..];
        rest.len() >= 2 && rest[0] == b':'
    })
}
