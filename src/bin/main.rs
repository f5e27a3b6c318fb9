//! odata-schema CLI - inspect the schema of an OData service
//!
//! Usage:
//!   odata-schema [--metadata <file>] <command>
//!
//! Examples:
//!   odata-schema --metadata trippin.json tables
//!   odata-schema table People/Trips/PlanItems/Flight
//!   odata-schema column People/Trips/PlanItems/Flight FlightNumber
//!   odata-schema --output json table Airports

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use odata_schema::cache::MetadataCache;
use odata_schema::config::Settings;
use odata_schema::metadata::{
    CachingFetcher, FileMetadataFetcher, JsonRecordParser, MetadataFetcher,
};
use odata_schema::schema::{ResolvedSchema, Schema, Table};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odata-schema")]
#[command(about = "Inspect the tables, types and functions of an OData service")]
#[command(version)]
struct Cli {
    /// Metadata document (overrides service.metadata_file from the config)
    #[arg(short, long, global = true)]
    metadata: Option<PathBuf>,

    /// Config file (defaults to the standard search order)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bypass the metadata cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tables
    Tables,

    /// Resolve a table path and show the table it names
    Table {
        /// Table path, e.g. People/Trips/PlanItems/Flight
        path: String,
    },

    /// Look up a column on the table a path resolves to
    Column {
        path: String,
        name: String,
    },

    /// Look up an association on the table a path resolves to
    Association {
        path: String,
        name: String,
    },

    /// List functions and actions
    Functions,

    /// List entity and complex types with their base types
    Types,

    /// Print the raw metadata payload
    Metadata,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let fetcher = match build_fetcher(&cli, &settings) {
        Ok(f) => f,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let schema = Schema::new(fetcher, JsonRecordParser::new());
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let resolved = match schema.resolve(&cancel).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to resolve schema: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Tables => cmd_tables(&resolved, cli.output),
        Commands::Table { path } => cmd_table(&resolved, &path, cli.output),
        Commands::Column { path, name } => cmd_column(&resolved, &path, &name, cli.output),
        Commands::Association { path, name } => {
            cmd_association(&resolved, &path, &name, cli.output)
        }
        Commands::Functions => cmd_functions(&resolved, cli.output),
        Commands::Types => cmd_types(&resolved, cli.output),
        Commands::Metadata => {
            println!("{}", resolved.metadata_as_string());
            ExitCode::SUCCESS
        }
    }
}

fn build_fetcher(cli: &Cli, settings: &Settings) -> Result<Arc<dyn MetadataFetcher>, String> {
    let path = match &cli.metadata {
        Some(path) => path.clone(),
        None => settings
            .service
            .resolved_metadata_file()
            .map_err(|e| format!("Configuration error: {}", e))?
            .ok_or_else(|| {
                "No metadata document: pass --metadata or set service.metadata_file".to_string()
            })?,
    };
    let file = FileMetadataFetcher::new(path);

    if cli.no_cache || !settings.cache.enabled {
        return Ok(Arc::new(file));
    }

    let cache = match settings.cache.resolved_path() {
        Ok(Some(path)) => MetadataCache::open_at(path),
        Ok(None) => MetadataCache::open(),
        Err(e) => return Err(format!("Configuration error: {}", e)),
    };
    match cache {
        Ok(cache) => Ok(Arc::new(CachingFetcher::new(
            file,
            JsonRecordParser::new(),
            cache,
            settings.cache.ttl(),
        ))),
        Err(e) => {
            tracing::warn!(error = %e, "metadata cache unavailable, fetching directly");
            Ok(Arc::new(file))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to encode output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_tables(schema: &ResolvedSchema, output: OutputFormat) -> ExitCode {
    let tables: Vec<&Table> = schema.tables().collect();
    if let OutputFormat::Json = output {
        return print_json(&tables);
    }

    if tables.is_empty() {
        println!("No tables defined.");
        return ExitCode::SUCCESS;
    }

    println!("Tables:");
    for table in tables {
        match &table.base_table {
            Some(base) => println!("  - {} ({}, derives from {})", table.name, table.entity_type, base),
            None => println!("  - {} ({})", table.name, table.entity_type),
        }
    }
    ExitCode::SUCCESS
}

#[derive(Serialize)]
struct TableReport<'a> {
    path: &'a str,
    concrete: &'a str,
    base: &'a str,
    entity_type: &'a str,
    columns: Vec<&'a odata_schema::schema::Column>,
    associations: Vec<&'a odata_schema::schema::Association>,
}

fn cmd_table(schema: &ResolvedSchema, path: &str, output: OutputFormat) -> ExitCode {
    let (concrete, base) = match (schema.find_concrete_table(path), schema.find_base_table(path)) {
        (Ok(concrete), Ok(base)) => (concrete, base),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let index = schema.table_index();
    let report = TableReport {
        path,
        concrete: &concrete.name,
        base: &base.name,
        entity_type: &concrete.entity_type,
        columns: index.all_columns(concrete),
        associations: index.all_associations(concrete),
    };

    if let OutputFormat::Json = output {
        return print_json(&report);
    }

    println!("Path: {}", report.path);
    println!("Table: {} ({})", report.concrete, report.entity_type);
    if report.base != report.concrete {
        println!("Base table: {}", report.base);
    }
    println!();
    println!("Columns:");
    for column in &report.columns {
        let nullable = if column.nullable { "" } else { " not null" };
        println!("  - {}: {}{}", column.name, column.type_name, nullable);
    }
    if !report.associations.is_empty() {
        println!();
        println!("Associations:");
        for association in &report.associations {
            println!(
                "  - {} -> {} [{}..{}]",
                association.name,
                association.target,
                association.source_multiplicity,
                association.target_multiplicity
            );
        }
    }
    ExitCode::SUCCESS
}

fn cmd_column(schema: &ResolvedSchema, path: &str, name: &str, output: OutputFormat) -> ExitCode {
    match schema.find_column(path, name) {
        Ok(column) => match output {
            OutputFormat::Json => print_json(column),
            OutputFormat::Text => {
                let nullable = if column.nullable { "nullable" } else { "not null" };
                println!("{}: {} ({})", column.name, column.type_name, nullable);
                ExitCode::SUCCESS
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_association(
    schema: &ResolvedSchema,
    path: &str,
    name: &str,
    output: OutputFormat,
) -> ExitCode {
    match schema.find_association(path, name) {
        Ok(association) => match output {
            OutputFormat::Json => print_json(association),
            OutputFormat::Text => {
                println!(
                    "{} -> {} [{}..{}]",
                    association.name,
                    association.target,
                    association.source_multiplicity,
                    association.target_multiplicity
                );
                ExitCode::SUCCESS
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_functions(schema: &ResolvedSchema, output: OutputFormat) -> ExitCode {
    let functions: Vec<_> = schema.functions().collect();
    if let OutputFormat::Json = output {
        return print_json(&functions);
    }

    if functions.is_empty() {
        println!("No functions defined.");
        return ExitCode::SUCCESS;
    }

    println!("Functions:");
    for function in functions {
        let params: Vec<_> = function
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect();
        let kind = if function.is_action { "action" } else { "function" };
        let returns = function
            .return_type
            .as_deref()
            .map(|t| format!(" -> {}", t))
            .unwrap_or_default();
        let bound = function
            .bound_to
            .as_deref()
            .map(|t| format!(" (bound to {})", t))
            .unwrap_or_default();
        println!(
            "  - {} {}({}){}{}",
            kind,
            function.name,
            params.join(", "),
            returns,
            bound
        );
    }
    ExitCode::SUCCESS
}

#[derive(Serialize)]
struct TypesReport<'a> {
    entity_types: Vec<&'a odata_schema::schema::EdmEntityType>,
    complex_types: Vec<&'a odata_schema::schema::EdmComplexType>,
}

fn cmd_types(schema: &ResolvedSchema, output: OutputFormat) -> ExitCode {
    let report = TypesReport {
        entity_types: schema.entity_types().collect(),
        complex_types: schema.complex_types().collect(),
    };
    if let OutputFormat::Json = output {
        return print_json(&report);
    }

    println!("Entity types:");
    for ty in &report.entity_types {
        let base = ty
            .base_type
            .as_deref()
            .map(|b| format!(" : {}", b))
            .unwrap_or_default();
        let abstract_marker = if ty.is_abstract { " (abstract)" } else { "" };
        println!("  - {}{}{}", ty.qualified_name(), base, abstract_marker);
    }

    if !report.complex_types.is_empty() {
        println!();
        println!("Complex types:");
        for ty in &report.complex_types {
            let base = ty
                .base_type
                .as_deref()
                .map(|b| format!(" : {}", b))
                .unwrap_or_default();
            println!("  - {}{}", ty.qualified_name(), base);
        }
    }
    ExitCode::SUCCESS
}
