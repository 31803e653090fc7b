//! Command-line interface for SpecQL.
//!
//! # Usage
//!
//! ```bash
//! # Validate operations against a schema
//! specql validate --schema schema.graphql query.graphql
//!
//! # Run only selected validation rules
//! specql validate --schema schema.graphql --rules FieldsOnCorrectType query.graphql
//!
//! # Execute a query with default resolvers over a JSON data file
//! specql execute --schema schema.graphql --data root.json --variables vars.json query.graphql
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use specql_runtime::{
    build_schema, execute, validate, Context, OperationInput, ResolverMap, RuleName, SchemaInput,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "specql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate operation documents against a schema
    Validate {
        /// Schema file (GraphQL SDL)
        #[arg(short, long)]
        schema: PathBuf,

        /// Validation rules to run (default: all)
        #[arg(long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Operation documents to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Execute a query against a schema with default resolvers
    Execute {
        /// Schema file (GraphQL SDL)
        #[arg(short, long)]
        schema: PathBuf,

        /// JSON file whose top-level members become root field values
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// JSON file with variable values
        #[arg(long)]
        variables: Option<PathBuf>,

        /// Operation document to execute
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .init();
    }

    match cli.command {
        Commands::Validate {
            schema,
            rules,
            files,
        } => run_validate(schema, rules, files),
        Commands::Execute {
            schema,
            data,
            variables,
            file,
        } => run_execute(schema, data, variables, file).await,
    }
}

fn read_file(path: &PathBuf) -> Result<String, ExitCode> {
    std::fs::read_to_string(path).map_err(|err| {
        eprintln!("{} cannot read {}: {err}", "error:".red().bold(), path.display());
        ExitCode::FAILURE
    })
}

fn load_schema(path: &PathBuf) -> Result<specql_runtime::SchemaState, ExitCode> {
    let source = read_file(path)?;
    build_schema(&source).map_err(|failure| {
        for error in &failure.errors {
            print_error(&path.display().to_string(), error);
        }
        ExitCode::FAILURE
    })
}

fn print_error(origin: &str, error: &specql_runtime::GraphQLError) {
    let location = error
        .locations
        .first()
        .map(|loc| format!(":{}:{}", loc.line, loc.column))
        .unwrap_or_default();
    eprintln!(
        "{} {origin}{location}: {}",
        "error:".red().bold(),
        error.message
    );
}

fn run_validate(schema: PathBuf, rules: Vec<String>, files: Vec<PathBuf>) -> ExitCode {
    let state = match load_schema(&schema) {
        Ok(state) => state,
        Err(code) => return code,
    };

    let selected: Option<Vec<RuleName>> = if rules.is_empty() {
        None
    } else {
        let mut parsed = Vec::with_capacity(rules.len());
        for rule in &rules {
            match rule.parse::<RuleName>() {
                Ok(rule) => parsed.push(rule),
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    return ExitCode::FAILURE;
                }
            }
        }
        Some(parsed)
    };

    let mut failed = false;
    for file in &files {
        let source = match read_file(file) {
            Ok(source) => source,
            Err(code) => return code,
        };
        let validation = validate(&state, &source, selected.as_deref());
        if validation.is_ok() {
            println!("{} {}", "ok:".green().bold(), file.display());
        } else {
            failed = true;
            for error in &validation.errors {
                print_error(&file.display().to_string(), error);
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_execute(
    schema: PathBuf,
    data: Option<PathBuf>,
    variables: Option<PathBuf>,
    file: PathBuf,
) -> ExitCode {
    let state = match load_schema(&schema) {
        Ok(state) => state,
        Err(code) => return code,
    };
    let query = match read_file(&file) {
        Ok(query) => query,
        Err(code) => return code,
    };

    let variables = match variables {
        Some(path) => match read_file(&path).map(|raw| serde_json::from_str(&raw)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                eprintln!("{} invalid variables JSON: {err}", "error:".red().bold());
                return ExitCode::FAILURE;
            }
            Err(code) => return code,
        },
        None => None,
    };

    // Top-level members of the data file become root field resolvers;
    // everything below them resolves by name lookup.
    let mut resolvers = ResolverMap::new();
    if let Some(path) = data {
        let root: serde_json::Value = match read_file(&path).map(|raw| serde_json::from_str(&raw))
        {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                eprintln!("{} invalid data JSON: {err}", "error:".red().bold());
                return ExitCode::FAILURE;
            }
            Err(code) => return code,
        };
        if let serde_json::Value::Object(members) = root {
            for root_type in ["Query", "Mutation"] {
                for (name, value) in &members {
                    let value = value.clone();
                    resolvers.register_fn(root_type, name.as_str(), move |_ctx, _parent, _args| {
                        Ok(value.clone())
                    });
                }
            }
        }
    }

    let response = execute(
        &Context::new(),
        SchemaInput::State(&state),
        &resolvers,
        OperationInput::Source(&query),
        variables,
    )
    .await;

    match serde_json::to_string_pretty(&response) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    }

    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
