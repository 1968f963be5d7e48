//! Configuration files: directive tree, parser, limits and the
//! per-load cycle that ties them to the definition table.

pub mod cycle;
pub mod limits;
pub mod parser;
pub mod tree;

pub use cycle::ConfigCycle;
pub use limits::{ParserLimits, SubstitutionLimits};
pub use parser::DirectiveParser;
pub use tree::{Directive, DirectiveTree, NodeId};
