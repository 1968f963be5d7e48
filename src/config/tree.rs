//! Directive tree arena.
//!
//! Nodes live in a flat `Vec` and link to each other by index: parent,
//! first child, last child and next sibling. Document order is the
//! pre-order traversal.

use std::fmt::Write as _;

use serde::Serialize;

/// Handle of a node inside a [`DirectiveTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One parsed directive or section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive or section name as written (`Listen`, `VirtualHost`).
    pub name: String,
    /// Raw argument text. This is what substitution rewrites.
    pub args: String,
    /// File the directive was read from.
    pub filename: String,
    /// 1-based line number of the directive's first line.
    pub line: usize,
    /// Whether the node was written as `<Name ...>` ... `</Name>`.
    pub section: bool,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Directive {
    /// Creates an unlinked directive.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        args: impl Into<String>,
        filename: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
            filename: filename.into(),
            line,
            section: false,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }

    /// Marks the directive as a section container.
    #[must_use]
    pub const fn into_section(mut self) -> Self {
        self.section = true;
        self
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub const fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[must_use]
    pub const fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }
}

/// Arena of directives with first-child / next-sibling links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTree {
    nodes: Vec<Directive>,
    first_root: Option<NodeId>,
    last_root: Option<NodeId>,
}

impl DirectiveTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level directive.
    pub fn push_root(&mut self, directive: Directive) -> NodeId {
        self.attach(None, directive)
    }

    /// Appends `directive` as the last child of `parent`, or as a root when
    /// `parent` is `None`.
    pub fn attach(&mut self, parent: Option<NodeId>, mut directive: Directive) -> NodeId {
        let id = NodeId(self.nodes.len());
        directive.parent = parent;
        directive.first_child = None;
        directive.last_child = None;
        directive.next_sibling = None;
        self.nodes.push(directive);

        let previous = match parent {
            Some(p) => {
                let node = &mut self.nodes[p.0];
                let previous = node.last_child.replace(id);
                if previous.is_none() {
                    node.first_child = Some(id);
                }
                previous
            }
            None => {
                let previous = self.last_root.replace(id);
                if previous.is_none() {
                    self.first_root = Some(id);
                }
                previous
            }
        };
        if let Some(prev) = previous {
            self.nodes[prev.0].next_sibling = Some(id);
        }
        id
    }

    /// Appends `directive` as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, directive: Directive) -> NodeId {
        self.attach(Some(parent), directive)
    }

    /// First top-level node.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.first_root
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Directive> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Directive> {
        self.nodes.get_mut(id.0)
    }

    /// Iterates over the direct children of `id`, or over the roots when
    /// `id` is `None`.
    pub fn children(&self, id: Option<NodeId>) -> impl Iterator<Item = NodeId> + '_ {
        let first = match id {
            Some(id) => self.get(id).and_then(Directive::first_child),
            None => self.first_root,
        };
        std::iter::successors(first, |n| self.nodes[n.0].next_sibling)
    }

    /// Node ids in document order: node, its children, then its siblings.
    #[must_use]
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.first_root.into_iter().collect(),
        }
    }

    /// Finds the first directive named `name` (case-insensitive).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Directive> {
        self.preorder()
            .filter_map(|id| self.get(id))
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Writes the tree back out as configuration text, four spaces per
    /// nesting level.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_level(None, 0, &mut out);
        out
    }

    fn render_level(&self, parent: Option<NodeId>, depth: usize, out: &mut String) {
        for id in self.children(parent) {
            let node = &self.nodes[id.0];
            let indent = "    ".repeat(depth);
            let sep = if node.args.is_empty() { "" } else { " " };
            if node.section {
                let _ = writeln!(out, "{indent}<{}{sep}{}>", node.name, node.args);
                self.render_level(Some(id), depth + 1, out);
                let _ = writeln!(out, "{indent}</{}>", node.name);
            } else {
                let _ = writeln!(out, "{indent}{}{sep}{}", node.name, node.args);
            }
        }
    }

    /// Nested, serializable view of the tree.
    #[must_use]
    pub fn to_view(&self) -> Vec<DirectiveView> {
        self.view_level(None)
    }

    fn view_level(&self, parent: Option<NodeId>) -> Vec<DirectiveView> {
        self.children(parent)
            .map(|id| {
                let node = &self.nodes[id.0];
                DirectiveView {
                    name: node.name.clone(),
                    args: node.args.clone(),
                    file: node.filename.clone(),
                    line: node.line,
                    children: self.view_level(Some(id)),
                }
            })
            .collect()
    }
}

/// Serializable snapshot of one directive and its children.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveView {
    pub name: String,
    pub args: String,
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectiveView>,
}

/// Pre-order iterator over a [`DirectiveTree`].
#[derive(Debug)]
pub struct Preorder<'a> {
    tree: &'a DirectiveTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id.0];
        if let Some(next) = node.next_sibling {
            self.stack.push(next);
        }
        if let Some(child) = node.first_child {
            self.stack.push(child);
        }
        Some(id)
    }
}
