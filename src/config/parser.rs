//! Directive-file parser.
//!
//! Reads line-oriented configuration in the familiar `Name args` /
//! `<Section args>` ... `</Section>` form into a [`DirectiveTree`].
//! `Define`, `Undefine` and `Include` take effect while reading, so a
//! definition is registered under the file that contains it before any
//! substitution runs.

use std::path::{Path, PathBuf};

use crate::config::limits::ParserLimits;
use crate::config::tree::{Directive, DirectiveTree, NodeId};
use crate::define::DefinitionTable;
use crate::error::ConfigError;

/// Reads configuration text into a tree, executing definition directives
/// against `table` as they are encountered.
#[derive(Debug)]
pub struct DirectiveParser<'t> {
    table: &'t mut DefinitionTable,
    limits: ParserLimits,
    include_stack: Vec<PathBuf>,
}

/// An open `<Section>` awaiting its close tag.
struct OpenSection {
    id: NodeId,
    name: String,
    line: usize,
}

impl<'t> DirectiveParser<'t> {
    #[must_use]
    pub fn new(table: &'t mut DefinitionTable, limits: ParserLimits) -> Self {
        Self {
            table,
            limits,
            include_stack: Vec::new(),
        }
    }

    /// Parses the file at `path`, appending its directives as roots of
    /// `tree`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read, is too large,
    /// contains an unbalanced section or a malformed directive, or includes
    /// itself.
    pub fn parse_file(&mut self, path: &Path, tree: &mut DirectiveTree) -> Result<(), ConfigError> {
        self.parse_file_under(path, tree, None)
    }

    /// Parses in-memory text attributed to `name`, appending its directives
    /// as roots of `tree`. Relative `Include` paths resolve against the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Same as [`parse_file`](Self::parse_file), minus the read errors for
    /// the top-level text.
    pub fn parse_str(
        &mut self,
        text: &str,
        name: &str,
        tree: &mut DirectiveTree,
    ) -> Result<(), ConfigError> {
        self.check_size(Path::new(name), text.len())?;
        self.parse_text(text, Path::new(name), tree, None)
    }

    fn parse_file_under(
        &mut self,
        path: &Path,
        tree: &mut DirectiveTree,
        parent: Option<NodeId>,
    ) -> Result<(), ConfigError> {
        let canonical = path.canonicalize().map_err(|e| read_error(path, e))?;

        if self.include_stack.contains(&canonical) {
            let mut cycle = self.include_stack.clone();
            cycle.push(canonical);
            return Err(ConfigError::CircularInclude { cycle });
        }
        if self.include_stack.len() >= self.limits.max_include_depth {
            return Err(ConfigError::InvalidValue {
                field: "Include depth".to_string(),
                value: format!("{}", self.include_stack.len() + 1),
                expected: format!("at most {} levels", self.limits.max_include_depth),
            });
        }

        let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;
        if !metadata.is_file() {
            return Err(ConfigError::InvalidValue {
                field: "Include".to_string(),
                value: path.display().to_string(),
                expected: "a regular file".to_string(),
            });
        }
        self.check_size(path, usize::try_from(metadata.len()).unwrap_or(usize::MAX))?;
        let text = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;

        tracing::debug!(file = %path.display(), depth = self.include_stack.len(), "reading configuration");
        self.include_stack.push(canonical);
        let result = self.parse_text(&text, path, tree, parent);
        self.include_stack.pop();
        result
    }

    fn check_size(&self, path: &Path, size: usize) -> Result<(), ConfigError> {
        if size > self.limits.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: format!("size of {}", path.display()),
                value: format!("{size} bytes"),
                expected: format!("at most {} bytes", self.limits.max_config_size),
            });
        }
        Ok(())
    }

    fn parse_text(
        &mut self,
        text: &str,
        path: &Path,
        tree: &mut DirectiveTree,
        parent: Option<NodeId>,
    ) -> Result<(), ConfigError> {
        let file = path.display().to_string();
        let mut sections: Vec<OpenSection> = Vec::new();

        for (line_num, line) in logical_lines(text) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let current = sections.last().map_or(parent, |s| Some(s.id));

            if let Some(rest) = line.strip_prefix("</") {
                let name = rest.strip_suffix('>').unwrap_or(rest).trim();
                match sections.pop() {
                    Some(open) if open.name.eq_ignore_ascii_case(name) => {}
                    _ => {
                        return Err(ConfigError::UnbalancedSection {
                            path: path.to_path_buf(),
                            line: line_num,
                            name: name.to_string(),
                        });
                    }
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix('<') {
                let Some(inner) = rest.strip_suffix('>') else {
                    return Err(ConfigError::ParseError {
                        path: path.to_path_buf(),
                        line: Some(line_num),
                        message: "section tag is missing its closing '>'".to_string(),
                    });
                };
                let (name, args) = split_directive(inner);
                if name.is_empty() {
                    return Err(ConfigError::ParseError {
                        path: path.to_path_buf(),
                        line: Some(line_num),
                        message: "empty section name".to_string(),
                    });
                }
                let id = tree.attach(
                    current,
                    Directive::new(name, args, file.as_str(), line_num).into_section(),
                );
                sections.push(OpenSection {
                    id,
                    name: name.to_string(),
                    line: line_num,
                });
                continue;
            }

            let (name, args) = split_directive(line);
            if name.eq_ignore_ascii_case("Include") {
                let target = self.include_target(args, path, line_num)?;
                self.parse_file_under(&target, tree, current)?;
                continue;
            }
            if name.eq_ignore_ascii_case("Define") {
                let [var, value] = take_words::<2>(name, args, path, line_num)?;
                self.table.define(&var, value, Some(file.as_str()));
            } else if name.eq_ignore_ascii_case("Undefine") {
                let [var] = take_words::<1>(name, args, path, line_num)?;
                if !self.table.undefine(&var, Some(file.as_str())) {
                    tracing::warn!(file = %file, line = line_num, variable = %var, "Undefine of unknown variable");
                }
            }
            tree.attach(current, Directive::new(name, args, file.as_str(), line_num));
        }

        if let Some(open) = sections.pop() {
            return Err(ConfigError::UnbalancedSection {
                path: path.to_path_buf(),
                line: open.line,
                name: open.name,
            });
        }
        Ok(())
    }

    fn include_target(&self, args: &str, from: &Path, line: usize) -> Result<PathBuf, ConfigError> {
        let [target] = take_words::<1>("Include", args, from, line)?;
        let target = PathBuf::from(target);
        if target.is_absolute() {
            return Ok(target);
        }
        Ok(from
            .parent()
            .map_or_else(|| target.clone(), |dir| dir.join(&target)))
    }
}

fn read_error(path: &Path, source: std::io::Error) -> ConfigError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ConfigError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Joins backslash-continued physical lines. Each logical line carries the
/// 1-based number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let (start, mut buf) = pending.take().unwrap_or_else(|| (idx + 1, String::new()));
        let trimmed = raw.trim_end();
        if let Some(body) = trimmed.strip_suffix('\\') {
            buf.push_str(body);
            pending = Some((start, buf));
        } else {
            buf.push_str(raw);
            out.push((start, buf));
        }
    }
    if let Some(last) = pending {
        out.push(last);
    }
    out
}

/// Splits `Name rest of line` at the first run of whitespace.
fn split_directive(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    }
}

/// Splits arguments into words. Single or double quotes group words and
/// `\"` / `\'` inside quotes yields the quote itself.
///
/// # Errors
///
/// Returns a message when a quote is left open.
pub fn split_words(args: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut chars = args.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            break;
        };

        let mut word = String::new();
        if first == '"' || first == '\'' {
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '\\' && chars.peek() == Some(&first) {
                    word.push(first);
                    chars.next();
                } else if c == first {
                    closed = true;
                    break;
                } else {
                    word.push(c);
                }
            }
            if !closed {
                return Err(format!("unterminated {first} quote"));
            }
        } else {
            word.push(first);
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }
    Ok(words)
}

fn take_words<const N: usize>(
    directive: &str,
    args: &str,
    path: &Path,
    line: usize,
) -> Result<[String; N], ConfigError> {
    let words = split_words(args).map_err(|message| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: Some(line),
        message: format!("{directive}: {message}"),
    })?;
    <[String; N]>::try_from(words).map_err(|words| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: Some(line),
        message: format!(
            "{directive} takes exactly {N} argument{}, got {}",
            if N == 1 { "" } else { "s" },
            words.len()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn table() -> DefinitionTable {
        DefinitionTable::with_environment(Arc::new(HashMap::new()))
    }

    fn parse(text: &str) -> Result<(DirectiveTree, DefinitionTable), ConfigError> {
        let mut table = table();
        let mut tree = DirectiveTree::new();
        DirectiveParser::new(&mut table, ParserLimits::default()).parse_str(
            text,
            "main.conf",
            &mut tree,
        )?;
        Ok((tree, table))
    }

    #[test]
    fn parses_directives_and_sections() {
        let (tree, _) = parse(
            "# comment\n\
             ServerRoot /srv\n\
             \n\
             <VirtualHost *:80>\n\
                 ServerName a.example\n\
             </VirtualHost>\n",
        )
        .unwrap();

        assert_eq!(tree.len(), 3);
        let vhost = tree.find("VirtualHost").unwrap();
        assert!(vhost.section);
        assert_eq!(vhost.args, "*:80");
        assert_eq!(vhost.line, 4);
        let name = tree.find("ServerName").unwrap();
        assert_eq!(name.line, 5);
        assert_eq!(name.filename, "main.conf");
    }

    #[test]
    fn define_registers_scoped_value() {
        let (tree, table) = parse("Define root /opt/app\nServerRoot ${root}\n").unwrap();
        assert!(table.is_active());
        assert_eq!(table.get_exact("main.conf::root"), Some("/opt/app"));
        assert_eq!(tree.find("Define").unwrap().args, "root /opt/app");
    }

    #[test]
    fn define_accepts_quoted_value() {
        let (_, table) = parse("Define greeting \"hello world\"\n").unwrap();
        assert_eq!(table.get_exact("main.conf::greeting"), Some("hello world"));
    }

    #[test]
    fn define_requires_two_arguments() {
        let err = parse("# header\nDefine lonely\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(2), .. }));
        assert_eq!(
            err.to_string(),
            "parse error in main.conf:2: Define takes exactly 2 arguments, got 1"
        );
    }

    #[test]
    fn undefine_removes_definition() {
        let (_, table) = parse("Define a 1\nUndefine a\n").unwrap();
        assert_eq!(table.get_exact("main.conf::a"), None);
        assert!(table.is_active());
    }

    #[test]
    fn continuation_lines_are_joined() {
        let (tree, _) = parse("LogFormat \"%h %l\" \\\n    common\nListen 80\n").unwrap();
        let log = tree.find("LogFormat").unwrap();
        assert_eq!(log.args, "\"%h %l\"     common");
        assert_eq!(log.line, 1);
        assert_eq!(tree.find("Listen").unwrap().line, 3);
    }

    #[test]
    fn unclosed_section_is_an_error() {
        let err = parse("<Directory /srv>\nRequire all granted\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnbalancedSection { line: 1, ref name, .. } if name == "Directory"
        ));
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let err = parse("<Directory /srv>\n</Location>\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnbalancedSection { line: 2, .. }));
    }

    #[test]
    fn section_close_is_case_insensitive() {
        assert!(parse("<IfModule x>\n</ifmodule>\n").is_ok());
    }

    #[test]
    fn section_tag_needs_closing_bracket() {
        let err = parse("<Directory /srv\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(1), .. }));
    }

    #[test]
    fn oversized_text_is_rejected() {
        let mut table = table();
        let mut tree = DirectiveTree::new();
        let limits = ParserLimits {
            max_include_depth: 4,
            max_config_size: 8,
        };
        let err = DirectiveParser::new(&mut table, limits)
            .parse_str("Listen 8080\n", "big.conf", &mut tree)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn include_scopes_definitions_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.conf");
        let vhost = dir.path().join("vhost.conf");
        std::fs::write(&main, "Define port 80\n<Outer>\nInclude vhost.conf\n</Outer>\n").unwrap();
        std::fs::write(&vhost, "Define port 8080\nListen $port\n").unwrap();

        let mut table = table();
        let mut tree = DirectiveTree::new();
        DirectiveParser::new(&mut table, ParserLimits::default())
            .parse_file(&main, &mut tree)
            .unwrap();

        let main_scope = main.display().to_string();
        let vhost_scope = vhost.display().to_string();
        assert_eq!(table.get("port", Some(&main_scope)).as_deref(), Some("80"));
        assert_eq!(table.get("port", Some(&vhost_scope)).as_deref(), Some("8080"));

        let listen = tree.find("Listen").unwrap();
        assert_eq!(listen.filename, vhost_scope);
        let outer = tree.children(None).nth(1).unwrap();
        assert_eq!(tree.get(outer).unwrap().name, "Outer");
        assert_eq!(tree.children(Some(outer)).count(), 2);
    }

    #[test]
    fn include_cycle_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        let b = dir.path().join("b.conf");
        std::fs::write(&a, "Include b.conf\n").unwrap();
        std::fs::write(&b, "Include a.conf\n").unwrap();

        let mut table = table();
        let mut tree = DirectiveTree::new();
        let err = DirectiveParser::new(&mut table, ParserLimits::default())
            .parse_file(&a, &mut tree)
            .unwrap_err();
        match err {
            ConfigError::CircularInclude { cycle } => assert_eq!(cycle.len(), 3),
            other => panic!("expected CircularInclude, got {other:?}"),
        }
    }

    #[test]
    fn missing_include_is_reported() {
        let mut table = table();
        let mut tree = DirectiveTree::new();
        let err = DirectiveParser::new(&mut table, ParserLimits::default())
            .parse_str(
                "Include /nonexistent/confdefine-test-xyz.conf\n",
                "main.conf",
                &mut tree,
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn directory_include_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table();
        let mut tree = DirectiveTree::new();
        let err = DirectiveParser::new(&mut table, ParserLimits::default())
            .parse_file(dir.path(), &mut tree)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn split_words_handles_quotes() {
        assert_eq!(
            split_words(r#"a "b c" 'd "e"' "f \"g\"""#).unwrap(),
            vec!["a", "b c", "d \"e\"", "f \"g\""]
        );
        assert_eq!(split_words("   ").unwrap(), Vec::<String>::new());
        assert!(split_words("\"open").is_err());
    }
}
