use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally::auth::hash_password;
use tally::config::ServerConfig;
use tally::server::{AppState, cors_layer, create_router};
use tally::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "An expense and income tracker for small businesses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, env = "TALLY_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, env = "TALLY_PORT", default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, env = "TALLY_DATA_DIR", default_value = "./data")]
        data_dir: String,

        /// Comma-separated browser origins allowed by CORS
        #[arg(
            long,
            env = "TALLY_ALLOWED_ORIGINS",
            default_value = "http://localhost:5173",
            value_delimiter = ','
        )]
        allowed_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Grant the admin flag to an existing user (bootstrap the first admin)
    Grant {
        /// Username to promote
        username: String,

        /// Data directory for the database
        #[arg(long, env = "TALLY_DATA_DIR", default_value = "./data")]
        data_dir: String,
    },

    /// Reset a user's password
    ResetPassword {
        /// Username to reset
        username: String,

        /// The new password
        password: String,

        /// Data directory for the database
        #[arg(long, env = "TALLY_DATA_DIR", default_value = "./data")]
        data_dir: String,
    },
}

fn open_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let store = SqliteStore::new(data_path.join("tally.db"))?;
    store.initialize()?;
    Ok(store)
}

fn run_grant(username: &str, data_dir: &str) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;

    let user = match store.get_user_by_username(username)? {
        Some(user) => user,
        None => bail!("User '{username}' not found"),
    };

    if user.is_admin {
        println!("User '{}' is already an admin", user.username);
        return Ok(());
    }

    store.set_user_admin(user.id, true)?;
    println!("Granted admin privileges to '{}'", user.username);
    Ok(())
}

fn run_reset_password(username: &str, password: &str, data_dir: &str) -> anyhow::Result<()> {
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let store = open_store(data_dir)?;

    let user = match store.get_user_by_username(username)? {
        Some(user) => user,
        None => bail!("User '{username}' not found"),
    };

    let hash = hash_password(password)?;
    store.update_user_password(user.id, &hash)?;
    println!("Password updated for '{}'", user.username);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tally=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Grant { username, data_dir } => {
                run_grant(&username, &data_dir)?;
            }
            AdminCommands::ResetPassword {
                username,
                password,
                data_dir,
            } => {
                run_reset_password(&username, &password, &data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            allowed_origins,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                allowed_origins,
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let purged = store.purge_expired_sessions()?;
            if purged > 0 {
                info!("Purged {} expired sessions", purged);
            }

            let state = Arc::new(AppState::new(Arc::new(store)));
            let app = create_router(state, cors_layer(&config.allowed_origins));
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
