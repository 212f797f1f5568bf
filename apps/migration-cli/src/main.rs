use clap::{Parser, ValueEnum};
use migration::{migrate, MigrationCommand};
use sea_orm::Database;

#[derive(Clone, Copy, ValueEnum)]
enum Db {
    Postgres,
    SqliteFile,
}

#[derive(Parser)]
#[command(name = "migration-cli")]
#[command(about = "Huddle database migration tool")]
struct Args {
    /// Migration command: up | down | fresh | reset | refresh | status
    command: MigrationCommand,

    /// Database type. In-memory SQLite is not offered: its schema would
    /// disappear as soon as the command exits.
    #[arg(short, long, value_enum, default_value = "postgres")]
    db: Db,

    /// Connection URL; falls back to DATABASE_URL (postgres) or SQLITE_PATH (sqlite-file)
    #[arg(long)]
    url: Option<String>,
}

fn resolve_url(args: &Args) -> Result<String, String> {
    if let Some(url) = &args.url {
        return Ok(url.clone());
    }
    match args.db {
        Db::Postgres => std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set for --db postgres".to_string()),
        Db::SqliteFile => {
            let path = std::env::var("SQLITE_PATH").unwrap_or_else(|_| "huddle.db".to_string());
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_env_filter("migration=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let url = match resolve_url(&args) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let conn = match Database::connect(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migrate(&conn, args.command).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
