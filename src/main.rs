use campusgate::registry::ClientRegistry;
use campusgate::settings::Settings;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "campusgate",
    version,
    about = "Client registry of the LMS REST gateway"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Print all registered clients with permissions and allow-lists
    ListClients,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    let db = sea_orm::Database::connect(&settings.database.url)
        .await
        .into_diagnostic()?;

    match cli.command {
        Command::Migrate => {
            migration::Migrator::up(&db, None).await.into_diagnostic()?;
            tracing::info!("Migrations applied");
        }
        Command::ListClients => {
            let registry = ClientRegistry::new(db);
            for listing in registry.list_clients().await? {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&listing).into_diagnostic()?
                );
            }
        }
    }

    Ok(())
}
