mod cover;
mod skus;
mod submit;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vitrina")]
#[command(about = "Catalog product variant and media pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print a generated SKU matrix without touching storage or the database
    Skus {
        /// Numeric category id used as the SKU prefix
        #[arg(long)]
        category_id: Option<i64>,
        /// Product slug the matrix belongs to
        #[arg(long)]
        slug: String,
        /// Color name; repeat for several
        #[arg(long = "color", required = true)]
        colors: Vec<String>,
        /// Size label; repeat for several
        #[arg(long = "size", required = true)]
        sizes: Vec<String>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Save a product described by a YAML draft, uploading its images
    Submit {
        /// Path to the draft file
        draft: PathBuf,
        /// Regenerate the variant matrix even when the product already has one
        #[arg(long)]
        regenerate: bool,
    },
    /// Upload a collection cover image under a deadline
    Cover {
        /// Collection slug used as the storage folder
        collection: String,
        /// Image file to upload
        file: PathBuf,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("vitrina: no command given; see --help");
        return Ok(());
    };

    match command {
        Commands::Skus {
            category_id,
            slug,
            colors,
            sizes,
            json,
        } => {
            // Offline: no storage or database settings required.
            init_tracing("warn")?;
            skus::run_skus(category_id, &slug, &colors, &sizes, json)
        }
        Commands::Submit { draft, regenerate } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            submit::run_submit(&config, pool, &draft, regenerate).await
        }
        Commands::Cover { collection, file } => {
            let config = load_config()?;
            cover::run_cover(&config, &collection, &file).await
        }
        Commands::Db { command } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    vitrina_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = vitrina_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<vitrina_core::AppConfig> {
    let config = vitrina_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    Ok(config)
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn connect(config: &vitrina_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = vitrina_db::PoolConfig::from_app_config(config);
    let pool = vitrina_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
