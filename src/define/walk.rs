//! Substitution over a whole directive tree.
//!
//! Every node's argument text is scanned for references, each reference is
//! resolved against the definition table from the node's file scope and
//! spliced in. After a splice the scan resumes at the start of the inserted
//! value, so a value that itself contains a reference is expanded too.

use serde::{Serialize, Serializer};

use crate::config::limits::SubstitutionLimits;
use crate::config::tree::{DirectiveTree, NodeId};
use crate::error::SubstitutionError;

use super::expand::splice;
use super::scanner::{ScanOutcome, find_next};
use super::table::DefinitionTable;

/// A substitution problem attached to one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Node whose arguments could not be fully expanded.
    pub node: NodeId,
    /// Source file of the directive.
    pub file: String,
    /// Source line of the directive.
    pub line: usize,
    /// What went wrong.
    #[serde(rename = "message", serialize_with = "serialize_display")]
    pub error: SubstitutionError,
}

fn serialize_display<S: Serializer>(err: &SubstitutionError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Summary of one tree walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// `true` when no definition was registered and the walk never ran.
    pub skipped: bool,
    /// Number of nodes visited.
    pub visited: usize,
    /// Number of nodes whose arguments were replaced.
    pub rewritten: usize,
    /// Total references substituted across committed nodes.
    pub substitutions: usize,
    /// Problems found, in document order.
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkReport {
    /// Returns `true` if the walk produced no diagnostics.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of expanding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Rewritten text to commit, or `None` to keep the original.
    pub text: Option<String>,
    /// Number of substitutions contained in `text`.
    pub substitutions: usize,
    /// Problem that stopped the expansion early.
    pub error: Option<SubstitutionError>,
}

/// Applies definitions to argument text.
#[derive(Debug)]
pub struct Substitutor<'a> {
    table: &'a DefinitionTable,
    limits: SubstitutionLimits,
}

impl<'a> Substitutor<'a> {
    #[must_use]
    pub fn new(table: &'a DefinitionTable) -> Self {
        Self::with_limits(table, SubstitutionLimits::default())
    }

    #[must_use]
    pub const fn with_limits(table: &'a DefinitionTable, limits: SubstitutionLimits) -> Self {
        Self { table, limits }
    }

    /// Rewrites every node of `tree` in document order.
    ///
    /// Does nothing at all when the table never saw a definition. Problems
    /// are logged and collected in the report; they never stop the walk.
    pub fn walk(&self, tree: &mut DirectiveTree) -> WalkReport {
        if !self.table.is_active() {
            tracing::debug!("no definitions registered, skipping substitution");
            return WalkReport {
                skipped: true,
                ..WalkReport::default()
            };
        }

        let mut report = WalkReport::default();
        let order: Vec<NodeId> = tree.preorder().collect();
        for id in order {
            let Some(node) = tree.get_mut(id) else {
                continue;
            };
            report.visited += 1;

            let expansion = self.expand_line(&node.args, Some(node.filename.as_str()));
            if let Some(text) = expansion.text {
                tracing::debug!(
                    file = %node.filename,
                    line = node.line,
                    directive = %node.name,
                    from = %node.args,
                    to = %text,
                    "arguments rewritten"
                );
                node.args = text;
                report.rewritten += 1;
                report.substitutions += expansion.substitutions;
            }
            if let Some(error) = expansion.error {
                tracing::error!(file = %node.filename, line = node.line, "{error}");
                report.diagnostics.push(Diagnostic {
                    node: id,
                    file: node.filename.clone(),
                    line: node.line,
                    error,
                });
            }
        }

        tracing::info!(
            visited = report.visited,
            rewritten = report.rewritten,
            diagnostics = report.diagnostics.len(),
            "substitution complete"
        );
        report
    }

    /// Expands the references in one line as seen from `scope`.
    ///
    /// An undefined variable or a limit violation discards every rewrite
    /// made so far. A malformed reference stops scanning but keeps what was
    /// already substituted.
    #[must_use]
    pub fn expand_line(&self, text: &str, scope: Option<&str>) -> Expansion {
        let mut buffer: Option<String> = None;
        let mut pos = 0;
        let mut substitutions = 0;

        loop {
            let meta = self.table.meta_chars();
            let current = buffer.as_deref().unwrap_or(text);
            let var = match find_next(current, pos, meta) {
                ScanOutcome::Found(var) => var,
                ScanOutcome::NotFound => break,
                ScanOutcome::Malformed { error, .. } => {
                    return Expansion {
                        text: buffer,
                        substitutions,
                        error: Some(error),
                    };
                }
            };

            let Some(value) = self.table.get(&var.name, scope) else {
                let suggestion = self.table.suggest(&var.name, scope);
                return Self::reverted(SubstitutionError::UndefinedVariable {
                    name: var.name,
                    suggestion,
                });
            };

            substitutions += 1;
            if substitutions > self.limits.max_substitutions {
                return Self::reverted(SubstitutionError::TooManySubstitutions {
                    limit: self.limits.max_substitutions,
                });
            }

            let line = buffer.get_or_insert_with(|| text.to_string());
            if let Err(error) = splice(line, var.offset, var.len, &value) {
                return Self::reverted(error);
            }
            if line.len() > self.limits.max_line_length {
                return Self::reverted(SubstitutionError::LineTooLong {
                    limit: self.limits.max_line_length,
                });
            }

            tracing::trace!(variable = %var.name, offset = var.offset, "substituted");
            pos = var.offset;
        }

        Expansion {
            text: buffer,
            substitutions,
            error: None,
        }
    }

    fn reverted(error: SubstitutionError) -> Expansion {
        Expansion {
            text: None,
            substitutions: 0,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tree::Directive;
    use std::collections::HashMap;
    use std::sync::Arc;

    const FILE: &str = "/etc/app/main.conf";

    fn table(defs: &[(&str, &str)]) -> DefinitionTable {
        let mut table = DefinitionTable::with_environment(Arc::new(HashMap::new()));
        for (name, value) in defs {
            table.define(name, *value, Some(FILE));
        }
        table
    }

    fn expand(table: &DefinitionTable, text: &str) -> Expansion {
        Substitutor::new(table).expand_line(text, Some(FILE))
    }

    #[test]
    fn braced_reference_is_replaced() {
        let table = table(&[("root", "/opt/app")]);
        let out = expand(&table, "The path is ${root}/bin");
        assert_eq!(out.text.as_deref(), Some("The path is /opt/app/bin"));
        assert_eq!(out.substitutions, 1);
        assert!(out.error.is_none());
    }

    #[test]
    fn braced_and_unbraced_agree() {
        let table = table(&[("name", "v")]);
        assert_eq!(expand(&table, "${name}/x").text, expand(&table, "$name/x").text);
    }

    #[test]
    fn text_without_references_is_untouched() {
        let table = table(&[("a", "1")]);
        let out = expand(&table, "Listen 80");
        assert_eq!(out.text, None);
        assert_eq!(out.error, None);
    }

    #[test]
    fn escaped_reference_is_preserved() {
        let table = table(&[("name", "v")]);
        let out = expand(&table, r"keep \$name here");
        assert_eq!(out.text, None);
    }

    #[test]
    fn undefined_variable_reverts_whole_line() {
        let table = table(&[("a", "1")]);
        let out = expand(&table, "$a $missing $a");
        assert_eq!(out.text, None);
        assert_eq!(
            out.error,
            Some(SubstitutionError::UndefinedVariable {
                name: "missing".to_string(),
                suggestion: None,
            })
        );
    }

    #[test]
    fn malformed_reference_keeps_earlier_rewrites() {
        let table = table(&[("a", "1")]);
        let out = expand(&table, "$a ${b c} $a");
        assert_eq!(out.text.as_deref(), Some("1 ${b c} $a"));
        assert_eq!(
            out.error,
            Some(SubstitutionError::IllegalCharacter { ch: ' ' })
        );
    }

    #[test]
    fn value_containing_reference_is_expanded_again() {
        let table = table(&[("a", "$b"), ("b", "B")]);
        let out = expand(&table, "x $a y");
        assert_eq!(out.text.as_deref(), Some("x B y"));
        assert_eq!(out.substitutions, 2);
    }

    #[test]
    fn self_reference_hits_substitution_limit() {
        let table = table(&[("a", "$a")]);
        let limits = SubstitutionLimits {
            max_line_length: 8192,
            max_substitutions: 10,
        };
        let out = Substitutor::with_limits(&table, limits).expand_line("$a", Some(FILE));
        assert_eq!(out.text, None);
        assert_eq!(
            out.error,
            Some(SubstitutionError::TooManySubstitutions { limit: 10 })
        );
    }

    #[test]
    fn growing_self_reference_hits_line_limit() {
        let table = table(&[("a", "$a$a")]);
        let limits = SubstitutionLimits {
            max_line_length: 64,
            max_substitutions: 1_000_000,
        };
        let out = Substitutor::with_limits(&table, limits).expand_line("$a", Some(FILE));
        assert_eq!(
            out.error,
            Some(SubstitutionError::LineTooLong { limit: 64 })
        );
    }

    #[test]
    fn other_scope_does_not_see_definition() {
        let table = table(&[("root", "/opt/app")]);
        let out = Substitutor::new(&table).expand_line("$root", Some("/etc/app/other.conf"));
        assert!(matches!(
            out.error,
            Some(SubstitutionError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn identifier_scope_reaches_other_file() {
        let mut table = table(&[]);
        table.define("root", "/opt/app", Some("main"));
        let out = Substitutor::new(&table).expand_line("${main::root}/bin", Some("other"));
        assert_eq!(out.text.as_deref(), Some("/opt/app/bin"));
        assert_eq!(out.error, None);
    }

    #[test]
    fn path_scope_cannot_be_written_in_reference() {
        let table = table(&[("root", "/opt/app")]);
        let text = format!("${{{FILE}::root}}");
        // '/' and '.' are not identifier characters, so a path scope cannot be
        // written inside a reference
        let out = Substitutor::new(&table).expand_line(&text, Some("other"));
        assert_eq!(
            out.error,
            Some(SubstitutionError::IllegalCharacter { ch: '/' })
        );
    }

    #[test]
    fn seeded_empty_expands_to_nothing() {
        let table = table(&[("a", "1")]);
        let out = expand(&table, "x${mod_define::empty}y");
        assert_eq!(out.text.as_deref(), Some("xy"));
    }

    #[test]
    fn overridden_sigil_applies() {
        let mut table = table(&[("a", "1")]);
        table.set("mod_define::dollar", "@");
        let out = expand(&table, "$a @a @{a}");
        assert_eq!(out.text.as_deref(), Some("$a 1 1"));
    }

    #[test]
    fn suggestion_is_attached() {
        let table = table(&[("port", "80")]);
        let out = expand(&table, "Listen $prot");
        assert_eq!(
            out.error,
            Some(SubstitutionError::UndefinedVariable {
                name: "prot".to_string(),
                suggestion: Some("port".to_string()),
            })
        );
    }

    fn tree() -> DirectiveTree {
        let mut tree = DirectiveTree::new();
        tree.push_root(Directive::new("ServerRoot", "${root}", FILE, 1));
        let vhost = tree.push_root(Directive::new("VirtualHost", "*:$port", FILE, 2).into_section());
        tree.push_child(vhost, Directive::new("DocumentRoot", "$root/htdocs", FILE, 3));
        tree.push_child(vhost, Directive::new("ErrorLog", "$logdir/error.log", FILE, 4));
        tree.push_root(Directive::new("Listen", "$port", FILE, 6));
        tree
    }

    #[test]
    fn walk_rewrites_every_node() {
        let table = table(&[("root", "/srv"), ("port", "8080"), ("logdir", "/var/log")]);
        let mut tree = tree();
        let report = Substitutor::new(&table).walk(&mut tree);

        assert!(!report.skipped);
        assert!(report.is_clean());
        assert_eq!(report.visited, 5);
        assert_eq!(report.rewritten, 5);
        let args: Vec<_> = tree
            .preorder()
            .map(|id| tree.get(id).unwrap().args.clone())
            .collect();
        assert_eq!(
            args,
            vec!["/srv", "*:8080", "/srv/htdocs", "/var/log/error.log", "8080"]
        );
    }

    #[test]
    fn walk_continues_after_diagnostic() {
        let table = table(&[("root", "/srv"), ("port", "8080")]);
        let mut tree = tree();
        let report = Substitutor::new(&table).walk(&mut tree);

        assert_eq!(report.diagnostics.len(), 1);
        let diag = &report.diagnostics[0];
        assert_eq!(diag.line, 4);
        assert_eq!(diag.file, FILE);
        assert_eq!(tree.get(diag.node).unwrap().args, "$logdir/error.log");
        assert_eq!(tree.find("Listen").unwrap().args, "8080");
        assert_eq!(report.rewritten, 4);
    }

    #[test]
    fn walk_is_skipped_without_definitions() {
        let table = DefinitionTable::with_environment(Arc::new(HashMap::from([(
            "port".to_string(),
            "9".to_string(),
        )])));
        let mut tree = tree();
        let before = tree.clone();
        let report = Substitutor::new(&table).walk(&mut tree);

        assert!(report.skipped);
        assert_eq!(report.visited, 0);
        assert_eq!(tree, before);
    }

    #[test]
    fn diagnostic_serializes_message() {
        let table = table(&[("x", "1")]);
        let mut tree = DirectiveTree::new();
        tree.push_root(Directive::new("Listen", "$port", FILE, 7));
        let report = Substitutor::new(&table).walk(&mut tree);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["diagnostics"][0]["message"],
            "Variable 'port' not defined"
        );
        assert_eq!(json["diagnostics"][0]["line"], 7);
    }
}
