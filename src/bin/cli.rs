//! FlatDB - CLI Client
//!
//! ```bash
//! # Interactive shell
//! flatdb-cli --schema shop.json --data-dir ./data
//!
//! # Execute a single command
//! flatdb-cli -c "SELECT * FROM users WHERE status = 'a'"
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use flatdb::catalog::Catalog;
use flatdb::config::{EngineConfig, DEFAULT_SCHEMA_PATH};
use flatdb::executor::{ExecutionEngine, QueryResult};
use flatdb::storage::Row;

/// FlatDB command-line interface
#[derive(Parser, Debug)]
#[command(name = "flatdb-cli", version, about = "Interactive shell for FlatDB")]
struct Args {
    /// Schema file (JSON)
    #[arg(short = 's', long, default_value = DEFAULT_SCHEMA_PATH, env = "FLATDB_SCHEMA")]
    schema: PathBuf,

    /// Directory holding the table data
    #[arg(short = 'd', long, default_value = ".", env = "FLATDB_DATA_DIR")]
    data_dir: PathBuf,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Shell history file
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress the banner
    #[arg(short = 'q', long)]
    quiet: bool,
}

/// Print welcome banner
fn print_banner(catalog: &Catalog) {
    println!(
        r#"
 FlatDB - a file-backed tabular store
 Schema '{}' with {} table(s)
 Type '.help' for help, '.quit' or EXIT to exit
"#,
        catalog.name(),
        catalog.list_tables().len()
    );
}

/// Print help message
const HELP: &str = r#"
Commands:
  .help              Show this help message
  .quit              Exit FlatDB
  .tables            List all tables
  .schema [table]    Show table schema
  .clear             Clear screen

Statements (end with ';' or an empty line):
  INSERT INTO ...    Insert a row
  SELECT ...         Query rows
  DELETE FROM ...    Delete rows

Values:
  Bare values may only hold letters, digits and '_' (or be a number).
  Quote anything else, such as dates or emails: '2024-01-01'.
  Write a quote inside a quoted value twice: 'it''s'.

Examples:
  INSERT INTO users VALUES (1, 'Alice', 'active');
  INSERT INTO users VALUES (2, 'ann@example.com', '2024-01-01');
  SELECT name FROM users WHERE status = 'active' AND id = 1;
  SELECT * FROM users WHERE (id = 1 OR id = 2);
  DELETE FROM users WHERE status = 'inactive';
"#;

fn print_help() {
    println!("{}", HELP);
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Row]) -> String {
    if columns.is_empty() && rows.is_empty() {
        return String::new();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();

    for row in rows {
        for (i, value) in row.fields().iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }
    }

    let mut output = String::new();

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let row_str: String = row
            .fields()
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<width$} ", v, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));

    output
}

fn print_result(result: &QueryResult) {
    if let Some(msg) = &result.message {
        match result.primary_key {
            Some(key) => println!("{} (primary key {})", msg, key),
            None => println!("{}", msg),
        }
    } else {
        print!("{}", format_results(&result.columns, &result.rows));
    }
}

/// Execute one command, reporting failures without stopping the shell
fn execute_command(input: &str, engine: &ExecutionEngine) {
    let input = input.trim();
    if input.is_empty() {
        return;
    }

    debug!(command = %input, "executing");
    match engine.execute_sql(input) {
        Ok(result) => print_result(&result),
        Err(e) => eprintln!("Error ({}): {}", e.kind(), e),
    }
}

/// Is this the EXIT keyword?
fn is_exit(input: &str) -> bool {
    input.trim_end_matches(';').trim().eq_ignore_ascii_case("exit")
}

/// Handle special dot commands; returns `false` when the shell should stop
fn handle_special_command(cmd: &str, catalog: &Catalog) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => return false,
        Some(".tables") => {
            let tables = catalog.list_tables();
            if tables.is_empty() {
                println!("No tables found.");
            } else {
                println!("Tables:");
                for table in tables {
                    println!("  {}", table);
                }
            }
        }
        Some(".schema") => {
            let names = match parts.get(1) {
                Some(name) => vec![name.to_string()],
                None => catalog.list_tables(),
            };
            for name in names {
                match catalog.get_table_info(&name) {
                    Ok(info) => println!("{}", info),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        Some(".clear") => {
            // Clear screen (ANSI escape code)
            print!("\x1B[2J\x1B[1;1H");
            let _ = io::stdout().flush();
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
    true
}

/// Main REPL loop
fn run_repl(engine: &ExecutionEngine, config: &EngineConfig, quiet: bool) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;
    if let Some(path) = &config.history_file {
        if path.exists() {
            let _ = editor.load_history(path);
        }
    }

    if !quiet {
        print_banner(engine.catalog());
    }

    let mut input_buffer = String::new();

    loop {
        let prompt = if input_buffer.is_empty() {
            "flatdb> "
        } else {
            "   ...> "
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                input_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };

        let trimmed = line.trim();

        if input_buffer.is_empty() {
            if trimmed.starts_with('.') {
                let _ = editor.add_history_entry(trimmed);
                if !handle_special_command(trimmed, engine.catalog()) {
                    break;
                }
                continue;
            }
            if is_exit(trimmed) {
                break;
            }
        }

        // An empty line completes a pending multi-line command
        if trimmed.is_empty() {
            if !input_buffer.is_empty() {
                execute_command(&input_buffer, engine);
                input_buffer.clear();
            }
            continue;
        }

        if !input_buffer.is_empty() {
            input_buffer.push(' ');
        }
        input_buffer.push_str(trimmed);

        if trimmed.ends_with(';') {
            let _ = editor.add_history_entry(input_buffer.as_str());
            execute_command(&input_buffer, engine);
            input_buffer.clear();
        }
    }

    if let Some(path) = &config.history_file {
        if let Err(e) = editor.save_history(path) {
            debug!(error = %e, "failed to save history");
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("flatdb=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = EngineConfig::new()
        .schema_path(&args.schema)
        .data_dir(&args.data_dir);
    if let Some(history) = &args.history {
        config = config.history_file(history);
    }

    let engine = ExecutionEngine::from_config(&config).with_context(|| {
        format!(
            "failed to open schema '{}' in '{}'",
            config.schema_path.display(),
            config.data_dir.display()
        )
    })?;

    match &args.command {
        Some(command) => engine
            .execute_sql(command)
            .map(|result| print_result(&result))
            .context("command failed"),
        None => run_repl(&engine, &config, args.quiet),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
