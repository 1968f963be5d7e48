//! Variable definitions and substitution.
//!
//! `Define name value` stores a value under a key scoped to the defining
//! file. Afterwards every directive argument is scanned for `$name` and
//! `${name}` references, which are replaced by the value visible from the
//! directive's own file, falling back to the process environment.
//!
//! The control characters (`\`, `$`, `{`, `}`) can be changed through the
//! reserved `mod_define::escape`, `mod_define::dollar`,
//! `mod_define::braceopen` and `mod_define::braceclose` entries.

pub mod expand;
pub mod meta;
pub mod scanner;
pub mod scope;
pub mod table;
pub mod walk;

pub use expand::splice;
pub use meta::MetaChars;
pub use scanner::{ScanOutcome, VarRef, find_all, find_next};
pub use scope::{RESERVED_SCOPE, SCOPE_SEPARATOR, make_key};
pub use table::{DefinitionTable, Environment, ProcessEnvironment};
pub use walk::{Diagnostic, Expansion, Substitutor, WalkReport};
