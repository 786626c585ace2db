//! Mantis CLI — exercises the core's direct, connection-free entry points.
//!
//! Usage:
//!   mantis validate <query>
//!   mantis translate <query> --target <relational|document|search|wide-column|key-value|sql>
//!   mantis describe <query>

use clap::{Parser, Subcommand, ValueEnum};
use mantis::aqr::validate;
use mantis::registry::{BackendKind, WideColumnSchema};
use mantis::translate::key_value::{self, AddressingHint};
use mantis::translate::{to_document, to_search, to_sql, to_wide_column};
use mantis::uql::parser::parse;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mantis")]
#[command(about = "A universal query abstraction layer: one language, five backends")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a query, printing any structural errors.
    Validate {
        /// UQL query text.
        query: String,
    },

    /// Translate a query to a backend-native form.
    Translate {
        /// UQL query text.
        query: String,

        /// Target backend.
        #[arg(short, long)]
        target: TargetArg,
    },

    /// Parse a query and pretty-print the resulting AQR tree.
    Describe {
        /// UQL query text.
        query: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Relational,
    /// Alias for `relational`.
    Sql,
    Document,
    Search,
    WideColumn,
    KeyValue,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { query } => run_validate(&query),
        Commands::Translate { query, target } => run_translate(&query, target),
        Commands::Describe { query } => run_describe(&query),
    }
}

fn run_validate(query: &str) -> ExitCode {
    let aqr = match parse(query) {
        Ok(aqr) => aqr,
        Err(err) => {
            println!("{{\"valid\": false, \"errors\": [\"{err}\"]}}");
            return ExitCode::FAILURE;
        }
    };

    let result = validate(&aqr);
    let errors: Vec<String> = result.errors.iter().map(|e| format!("{}: {}", e.path, e.message)).collect();
    let rendered = serde_json::json!({"valid": result.valid, "errors": errors});
    println!("{rendered}");
    if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_translate(query: &str, target: TargetArg) -> ExitCode {
    let aqr = match parse(query) {
        Ok(aqr) => aqr,
        Err(err) => {
            eprintln!("parse error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let kind = match target {
        TargetArg::Relational | TargetArg::Sql => BackendKind::Relational,
        TargetArg::Document => BackendKind::Document,
        TargetArg::Search => BackendKind::Search,
        TargetArg::WideColumn => BackendKind::WideColumn,
        TargetArg::KeyValue => BackendKind::KeyValue,
    };

    let rendered = match kind {
        BackendKind::Relational => Ok(to_sql(&aqr)),
        BackendKind::Document => to_document(&aqr).map(|p| p.to_json().to_string()),
        BackendKind::Search => to_search(&aqr).map(|p| p.to_json().to_string()),
        BackendKind::WideColumn => to_wide_column(&aqr, &WideColumnSchema::default()).map(|p| p.statement),
        BackendKind::KeyValue => Ok(format!("{:?}", key_value::to_plan(&aqr, AddressingHint::Unknown, false))),
    };

    match rendered {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("translate error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_describe(query: &str) -> ExitCode {
    match parse(query) {
        Ok(aqr) => {
            println!("{aqr:#?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("parse error: {err}");
            ExitCode::FAILURE
        }
    }
}
