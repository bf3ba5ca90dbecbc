//! duck-migrate CLI
//!
//! Command-line tool for converging a DuckDB database with model definitions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use duck_migrate::catalog::qualify;
use duck_migrate::prelude::*;
use duck_migrate::schema::reorder_tables;

/// Schema migrations for DuckDB.
#[derive(Parser)]
#[command(name = "duck-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DuckDB database file (`:memory:` for a throwaway in-memory database).
    #[arg(short, long, env = "DUCKDB_PATH", default_value = ":memory:")]
    database: PathBuf,

    /// Disable caching of prepared catalog queries.
    #[arg(long)]
    no_prepare: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the name of the current database.
    CurrentDatabase,

    /// List the base tables of the current schema.
    Tables,

    /// Check whether a table exists.
    HasTable {
        /// Table name, optionally `schema.table`.
        table: String,
    },

    /// Check whether a column exists.
    HasColumn {
        /// Table name, optionally `schema.table`.
        table: String,
        /// Column name.
        column: String,
    },

    /// Drop tables if they exist.
    Drop {
        /// Tables to drop.
        #[arg(required = true)]
        tables: Vec<String>,
    },

    /// Rename a table if it exists.
    RenameTable {
        /// Current table name.
        old: String,
        /// New table name.
        new: String,
    },

    /// Create missing tables and columns from a JSON model file.
    Migrate {
        /// JSON array of models.
        #[arg(short, long)]
        models: PathBuf,
    },

    /// Show the CREATE statements for a JSON model file without executing.
    Sql {
        /// JSON array of models.
        #[arg(short, long)]
        models: PathBuf,
    },
}

fn load_models(path: &Path) -> Result<Vec<ResolvedSchema>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_create_sql(models: &[ResolvedSchema]) -> Result<()> {
    let dialect = DuckDbDialect::new();
    let tables: Vec<TableRef<'_>> = models.iter().map(TableRef::from).collect();

    for table in reorder_tables(&tables) {
        let Some(model) = table.model() else {
            continue;
        };
        let qualified = qualify(table)?;
        for statement in dialect.create_table(&qualified, model) {
            println!("{statement};");
        }
        for field in model.migrated_fields() {
            let comment = field.comment_text();
            if !comment.is_empty() {
                let statement = dialect.comment_on_column(&qualified, field.column_name(), comment);
                println!("{statement};");
            }
        }
        println!();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Sql { models } = &cli.command {
        print_create_sql(&load_models(models)?)?;
        return Ok(());
    }

    let conn = Arc::new(
        DuckDbConnection::open(&cli.database)?.with_prepared_statements(!cli.no_prepare),
    );
    let migrator = DuckDbMigrator::new(Arc::clone(&conn)).with_statement_cache(conn);

    match cli.command {
        Commands::CurrentDatabase => {
            println!("{}", migrator.current_database());
        }

        Commands::Tables => {
            for table in migrator.get_tables()? {
                println!("{table}");
            }
        }

        Commands::HasTable { table } => {
            println!("{}", migrator.has_table(TableRef::from(&table)));
        }

        Commands::HasColumn { table, column } => {
            let model = ResolvedSchema::new(table);
            println!("{}", migrator.has_column(&model, &column));
        }

        Commands::Drop { tables } => {
            let refs: Vec<TableRef<'_>> = tables.iter().map(TableRef::from).collect();
            migrator.drop_table(&refs)?;
            info!("Dropped {} table(s).", refs.len());
        }

        Commands::RenameTable { old, new } => {
            migrator.rename_table(TableRef::from(&old), TableRef::from(&new))?;
        }

        Commands::Migrate { models } => {
            let models = load_models(&models)?;
            let refs: Vec<&ResolvedSchema> = models.iter().collect();
            info!(
                database = %cli.database.display(),
                models = refs.len(),
                "Migrating models"
            );
            migrator.auto_migrate(&refs)?;
            info!("Migration complete.");
        }

        Commands::Sql { .. } => {}
    }

    Ok(())
}
