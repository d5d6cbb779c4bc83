//! recql - query JSON and JSONL records with a small SQL dialect.
//!
//! The query engine lives in `recql-core`; this crate adds the record
//! sources, the expression routing and the commands used by the `recql`
//! binary.

pub mod cli;
pub mod commands;
pub mod repl;
pub mod source;

pub use cli::{
    resolve_arguments, resolve_input, resolve_interactive_input, run, InvocationError, Route,
    RunOptions,
};
pub use commands::{Command, RecordStats};
pub use repl::{run_repl, Session, Step};
pub use source::{Input, JsonTable, RecordFormat};
