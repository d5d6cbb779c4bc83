//! Record sources for the command line.
//!
//! A source is a file, standard input or an inline JSON literal. Each one is
//! exposed to the query engine as a [`JsonTable`].

mod json_table;

use std::fmt;
use std::path::PathBuf;

pub use json_table::{JsonRowIterator, JsonTable};

/// Layout of a record file: one JSON document, or one value per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordFormat {
    Json,
    Jsonl,
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFormat::Json => write!(f, "JSON"),
            RecordFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Stdin,
    /// JSON text given directly on the command line.
    Inline(String),
}

impl Input {
    /// Interpret a command-line argument.
    ///
    /// `-` is standard input, text starting with `{` or `[` is an inline
    /// literal and anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Input::Stdin
        } else if arg.starts_with('{') || arg.starts_with('[') {
            Input::Inline(arg.to_string())
        } else {
            Input::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::File(path) => write!(f, "{}", path.display()),
            Input::Stdin => write!(f, "<stdin>"),
            Input::Inline(_) => write!(f, "<inline>"),
        }
    }
}
