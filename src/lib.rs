//! `confdefine` - Scoped variable substitution for configuration files
//!
//! Reads directive-style configuration (`Name args`, `<Section>` blocks),
//! registers `Define name value` entries under the file that declares them,
//! and rewrites every directive's arguments by replacing `$name` and
//! `${name}` references with the visible value, falling back to the process
//! environment.
//!
//! ```
//! use confdefine::config::ConfigCycle;
//!
//! let mut cycle = ConfigCycle::new();
//! let mut tree = cycle
//!     .load_str("Define root /opt/app\nDocumentRoot ${root}/htdocs\n", "app.conf")
//!     .unwrap();
//! let report = cycle.substitute(&mut tree);
//! assert!(report.is_clean());
//! assert_eq!(tree.find("DocumentRoot").unwrap().args, "/opt/app/htdocs");
//! ```

pub mod cli;
pub mod config;
pub mod define;
pub mod error;
pub mod observability;
