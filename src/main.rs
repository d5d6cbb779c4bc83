use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use recql::{
    commands, resolve_arguments, resolve_interactive_input, run, run_repl, Command, JsonTable,
    RunOptions, Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "recql")]
#[command(about = "Query JSON and JSONL records with paths, filters or SQL", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File path, `-` for standard input, or an inline JSON literal
    input: Option<String>,

    /// SELECT statement, inline filter (`age>30`) or path (`.user.name`)
    expression: Option<String>,

    /// Expression used when none is given
    #[arg(short, long, default_value = ".")]
    path: String,

    /// Table name the input is registered under for FROM clauses
    #[arg(long, default_value = "input")]
    table: String,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Print the query plan instead of running it
    #[arg(long)]
    explain: bool,

    /// Write each element of an array result on its own line
    #[arg(short, long)]
    extract: bool,

    /// Keep only these top-level fields of each result (e.g. `value,metadata`)
    #[arg(short, long, value_delimiter = ',')]
    select: Vec<String>,

    /// Read expressions from an interactive prompt
    #[arg(short, long, conflicts_with = "expression")]
    interactive: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recql=warn,recql_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let stdin_piped = !io::stdin().is_terminal();
    let options = RunOptions {
        pretty: args.pretty,
        explain: args.explain,
        extract: args.extract,
        select: args.select,
    };

    if let Some(command) = args.command {
        let stdout = io::stdout();
        let mut sink = io::BufWriter::new(stdout.lock());
        return commands::execute(command, stdin_piped, &mut sink);
    }

    if args.interactive {
        let input = resolve_interactive_input(args.input.as_deref())?;
        let table = Arc::new(JsonTable::new(args.table.as_str(), input.clone()));
        let session = Session::new(table, options);
        session.write_banner(&input, &mut io::stdout())?;
        run_repl(&session).context("interactive prompt failed")?;
        return Ok(());
    }

    let (input, expression) = resolve_arguments(
        args.input.as_deref(),
        args.expression.as_deref(),
        stdin_piped,
        &args.path,
    )?;
    tracing::debug!(%input, %expression, "resolved arguments");

    let table = Arc::new(JsonTable::new(args.table.as_str(), input.clone()));

    let stdout = io::stdout();
    let mut sink = io::BufWriter::new(stdout.lock());
    run(&expression, table, &options, &mut sink)
        .with_context(|| format!("failed to evaluate {:?} against {}", expression, input))?;

    Ok(())
}
