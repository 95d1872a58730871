//! Vowmarket CLI - run and administer the wedding vendor marketplace

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vowmarket::config::{self, MarketConfig, Settings};
use vowmarket::storage::SqliteStore;
use vowmarket::ui::{self, Icons};
use vowmarket::{session, UpsertUser, VendorSearch};

#[derive(Parser)]
#[command(name = "vowmarket")]
#[command(version)]
#[command(about = "Wedding vendor marketplace backend")]
#[command(long_about = r#"
Vowmarket serves a marketplace where couples find wedding vendors:
  • Vendor search by category, keyword, location and price
  • Reviews with per-vendor rating aggregation
  • Saved vendors and inquiry tracking

Example usage:
  vowmarket init
  vowmarket import --file vendors.toml
  vowmarket serve --port 3000
  vowmarket vendors --category photographer --location Austin
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config and VOWMARKET_DATABASE)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the RPC server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static assets served for unmatched paths
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Import a vendor catalog (TOML [[vendor]] tables or a JSON array)
    Import {
        /// Catalog file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Search vendors
    Vendors {
        /// Category tag, e.g. photographer
        #[arg(long)]
        category: Option<String>,

        /// Substring of the vendor name (case-sensitive)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Substring of the vendor location (case-sensitive)
        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        price_min: Option<f64>,

        #[arg(long)]
        price_max: Option<f64>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,

        #[arg(long, default_value = "0")]
        offset: i64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show row counts per table
    Stats,

    /// Sign in a user and print a session token (development login)
    Session {
        /// The user's open identifier
        #[arg(long)]
        open_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(&settings.database)?;
    Ok(SqliteStore::open(&settings.database)?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(database) = cli.database.clone() {
        settings.database = database;
    }

    match cli.command {
        Commands::Serve { port, static_dir } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if static_dir.is_some() {
                settings.static_dir = static_dir;
            }
            ui::header("Vowmarket server");
            ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
            if settings.uses_dev_secret() {
                ui::warn("Using the development session secret; set JWT_SECRET in production");
            }
            vowmarket::server::start_server(settings).await?;
        }

        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let file_config = MarketConfig {
                database: Some(settings.database.display().to_string()),
                port: Some(settings.port),
                cookie_name: Some(settings.cookie_name.clone()),
                session_secret: None,
                owner_open_id: settings.owner_open_id.clone(),
                static_dir: settings.static_dir.as_ref().map(|p| p.display().to_string()),
            };
            config::write_config(&path, &file_config, force)?;
            open_store(&settings)?;

            ui::success(&format!("Wrote {}", path.display()));
            ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
            println!("{}", ui::dim("Set JWT_SECRET in the environment before serving."));
        }

        Commands::Import { file } => {
            let mut store = open_store(&settings)?;
            let inserted = vowmarket::import::import_catalog(&mut store, &file)?;
            ui::success(&format!("{} Imported {} vendors from {}", Icons::PACKAGE, inserted, file.display()));
        }

        Commands::Vendors { category, keyword, location, price_min, price_max, limit, offset, json } => {
            let store = open_store(&settings)?;
            let search = VendorSearch {
                category,
                keyword,
                price_min,
                price_max,
                location,
                limit,
                offset,
            };
            let vendors = store.search_vendors(&search)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&vendors)?);
            } else if vendors.is_empty() {
                ui::info("Vendors", "none matched");
            } else {
                println!("{} {} vendors", Icons::SEARCH, vendors.len());
                println!("{}", ui::vendor_table(&vendors));
            }
        }

        Commands::Stats => {
            let store = open_store(&settings)?;
            let stats = store.stats()?;

            ui::section(&format!("{} Vowmarket Statistics", Icons::STATS));
            println!("{}", ui::muted(&settings.database.display().to_string()));
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Session { open_id, name, email } => {
            let store = open_store(&settings)?;
            let user = store.upsert_user(
                &UpsertUser {
                    open_id,
                    name,
                    email,
                    login_method: Some("cli".to_string()),
                    role: None,
                },
                settings.owner_open_id.as_deref(),
            )?;
            let token = session::issue_token(&user.open_id, settings.session_secret.as_bytes())?;

            ui::status(Icons::PERSON, "User", &format!("{} (id {}, {})", user.open_id, user.id, user.role.as_str()));
            ui::status(Icons::KEY, "Token", &token);
            ui::summary_row(
                &format!("{} Set-Cookie:", Icons::COOKIE),
                &session::session_cookie(&settings.cookie_name, &token, false),
            );
        }
    }

    Ok(())
}
