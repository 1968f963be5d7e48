//! Resource limits for parsing and substitution.
//!
//! Defaults can be raised or lowered through `CONFDEFINE_*` environment
//! variables.

/// Limits applied while expanding a single directive's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionLimits {
    /// Maximum length in bytes of an expanded argument line.
    pub max_line_length: usize,

    /// Maximum number of substitutions performed on one line.
    pub max_substitutions: usize,
}

impl Default for SubstitutionLimits {
    fn default() -> Self {
        Self {
            max_line_length: env_or("CONFDEFINE_MAX_LINE_LENGTH", 8192),
            max_substitutions: env_or("CONFDEFINE_MAX_SUBSTITUTIONS", 1024),
        }
    }
}

/// Limits applied while reading configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Maximum `Include` nesting depth.
    pub max_include_depth: usize,

    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_include_depth: env_or("CONFDEFINE_MAX_INCLUDE_DEPTH", 16),
            max_config_size: env_or("CONFDEFINE_MAX_CONFIG_SIZE", 10 * 1024 * 1024),
        }
    }
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_variable() {
        assert_eq!(env_or("CONFDEFINE_TEST_UNSET_LIMIT_XYZ123", 42usize), 42);
    }

    #[test]
    fn defaults_are_positive() {
        let sub = SubstitutionLimits::default();
        assert!(sub.max_line_length > 0);
        assert!(sub.max_substitutions > 0);
        let parse = ParserLimits::default();
        assert!(parse.max_include_depth > 0);
        assert!(parse.max_config_size > 0);
    }
}
