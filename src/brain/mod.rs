//! Trigger table, matcher, and brain file persistence.

pub mod builtin;
pub mod file;
pub mod matcher;
pub mod table;

pub use file::{BrainFile, load_table};
pub use matcher::{Match, MatchKind, Matcher};
pub use table::{DEFAULT_TRIGGER, Response, ResponseTable, TableError, UNKNOWN_COMMAND};
