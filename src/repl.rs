//! Interactive prompt over a single record source.
//!
//! Every line is routed like a command-line expression and run against the
//! same table, so the source must be re-readable (a file or inline JSON).

use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use recql_core::Table;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::cli::{run, RunOptions};
use crate::source::Input;

const PROMPT: &str = "> ";

/// What the prompt loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

pub struct Session {
    table: Arc<dyn Table>,
    options: RunOptions,
}

impl Session {
    pub fn new(table: Arc<dyn Table>, options: RunOptions) -> Self {
        Self { table, options }
    }

    pub fn write_banner<W: Write>(&self, input: &Input, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{}",
            "Interactive mode enabled. Type 'exit' or 'quit' to leave.".dimmed()
        )?;
        writeln!(out, "  {} {}", "Reading from:".dimmed(), input.to_string().white())
    }

    /// Handle one line: a command word or an expression.
    ///
    /// Query failures are reported on `err` and do not end the session.
    pub fn handle<W: Write, E: Write>(
        &self,
        line: &str,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<Step> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Step::Continue);
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Ok(Step::Quit);
        }
        if line.eq_ignore_ascii_case("help") {
            write_help(out)?;
            return Ok(Step::Continue);
        }

        match run(line, self.table.clone(), &self.options, out) {
            Ok(count) => tracing::debug!(expression = line, results = count, "evaluated"),
            Err(e) => writeln!(err, "{} {}", "Error:".red().bold(), e)?,
        }
        Ok(Step::Continue)
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "  {}  run a query", "SELECT ...".yellow())?;
    writeln!(out, "  {}     keep records matching a filter", "age>28".yellow())?;
    writeln!(out, "  {} extract a path from every record", ".user.name".yellow())?;
    writeln!(out, "  {}  leave", "exit, quit".yellow())
}

/// Read lines from the terminal until `exit`, `quit` or end of input.
pub fn run_repl(session: &Session) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let stdout = io::stdout();
                let step = session.handle(&line, &mut stdout.lock(), &mut io::stderr())?;
                if step == Step::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Type exit to quit".dimmed());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}
