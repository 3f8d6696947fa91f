use anyhow::Result;
use aviary::db::{migrate, Db};
use aviary::error::AviaryError;
use aviary::http::HttpServer;
use aviary::{Config, GenealogyService};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aviary")]
#[command(about = "Genealogy and consanguinity service for breeding records", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the genealogy HTTP API
    Serve {
        /// Override http_server.port from config.toml
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply migrations and verify the database schema (default)
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", &config.aviary.log_level),
    )
    .init();

    let db = Db::new(config.db_path());
    let migrations_dir = config.migrations_dir().to_path_buf();
    let applied = db
        .with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
        .await?;
    log::info!(
        "Database initialized: {} ({} migrations applied)",
        config.db_path().display(),
        applied.len()
    );

    match args.command.unwrap_or(Command::Verify) {
        Command::Serve { port } => {
            log::info!("Starting Aviary v{}", env!("CARGO_PKG_VERSION"));
            let port = port.unwrap_or(config.http_server.port);
            let service = GenealogyService::new(db, config.genealogy.clone());
            let server = HttpServer::new(service, &config)?;
            server.run(port).await?;
        }
        Command::Verify => verify_database_schema(&db).await?,
    }

    Ok(())
}

/// Check tables, record counts and integrity
async fn verify_database_schema(db: &Db) -> Result<()> {
    db.with_connection(|conn| {
        let missing = migrate::missing_tables(conn)?;
        if !missing.is_empty() {
            for table in &missing {
                log::error!("Missing table: {}", table);
            }
            return Err(AviaryError::Config(format!(
                "Not all required tables exist: {}",
                missing.join(", ")
            )));
        }
        log::debug!("✓ All tables exist");

        for table in migrate::BREEDING_TABLES {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            log::info!("{}: {} rows", table, count);
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(AviaryError::Config(format!(
                "Database integrity check failed: {}",
                integrity
            )));
        }
        log::info!("✓ Database integrity: OK");
        Ok(())
    })
    .await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
