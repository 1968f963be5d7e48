//! One configuration-processing pass.
//!
//! A `ConfigCycle` owns the definition table for the duration of a load:
//! files are parsed (registering definitions as they are read), the
//! resulting tree is substituted, and [`finish`](ConfigCycle::finish)
//! empties the table so a reload starts clean.

use std::path::Path;
use std::sync::Arc;

use crate::config::limits::{ParserLimits, SubstitutionLimits};
use crate::config::parser::DirectiveParser;
use crate::config::tree::DirectiveTree;
use crate::define::{DefinitionTable, Environment, ProcessEnvironment, Substitutor, WalkReport};
use crate::error::ConfigError;

/// Owner of the definition table for a single load.
#[derive(Debug)]
pub struct ConfigCycle {
    table: DefinitionTable,
    parser_limits: ParserLimits,
    substitution_limits: SubstitutionLimits,
}

impl Default for ConfigCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCycle {
    /// Creates a cycle that falls back to the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_environment(Arc::new(ProcessEnvironment))
    }

    /// Creates a cycle with a custom environment fallback.
    #[must_use]
    pub fn with_environment(env: Arc<dyn Environment>) -> Self {
        Self {
            table: DefinitionTable::with_environment(env),
            parser_limits: ParserLimits::default(),
            substitution_limits: SubstitutionLimits::default(),
        }
    }

    /// Replaces the parser and substitution limits.
    #[must_use]
    pub const fn with_limits(mut self, parser: ParserLimits, substitution: SubstitutionLimits) -> Self {
        self.parser_limits = parser;
        self.substitution_limits = substitution;
        self
    }

    /// Parses `path` and everything it includes.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any file cannot be read or parsed.
    pub fn load(&mut self, path: &Path) -> Result<DirectiveTree, ConfigError> {
        let mut tree = DirectiveTree::new();
        DirectiveParser::new(&mut self.table, self.parser_limits).parse_file(path, &mut tree)?;
        tracing::info!(
            config = %path.display(),
            directives = tree.len(),
            definitions_active = self.table.is_active(),
            "configuration parsed"
        );
        Ok(tree)
    }

    /// Parses in-memory text attributed to the file `name`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the text cannot be parsed.
    pub fn load_str(&mut self, text: &str, name: &str) -> Result<DirectiveTree, ConfigError> {
        let mut tree = DirectiveTree::new();
        DirectiveParser::new(&mut self.table, self.parser_limits).parse_str(text, name, &mut tree)?;
        Ok(tree)
    }

    /// Registers a definition in `scope`.
    pub fn define(&mut self, name: &str, value: &str, scope: Option<&str>) {
        self.table.define(name, value, scope);
    }

    /// Registers `name` in the scope of every file that contributed to
    /// `tree`, overriding definitions those files made themselves.
    pub fn define_everywhere(&mut self, name: &str, value: &str, tree: &DirectiveTree) {
        let mut files: Vec<&str> = tree
            .preorder()
            .filter_map(|id| tree.get(id))
            .map(|d| d.filename.as_str())
            .collect();
        files.sort_unstable();
        files.dedup();
        for file in files {
            self.table.define(name, value, Some(file));
        }
    }

    /// Substitutes every directive in `tree`.
    pub fn substitute(&self, tree: &mut DirectiveTree) -> WalkReport {
        Substitutor::with_limits(&self.table, self.substitution_limits).walk(tree)
    }

    #[must_use]
    pub const fn table(&self) -> &DefinitionTable {
        &self.table
    }

    /// Ends the cycle, dropping every definition.
    pub fn finish(&mut self) {
        tracing::debug!(entries = self.table.len(), "configuration cycle finished");
        self.table.clear();
    }
}
