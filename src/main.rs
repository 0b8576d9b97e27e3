use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use foodgram::config::Config;
use foodgram::services::users::Registration;
use foodgram::{build_app, cli, db};

#[derive(Parser)]
#[command(name = "foodgram", about = "Recipe sharing backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load ingredients from a JSON array of {name, measurement_unit}
    LoadIngredients { path: PathBuf },
    /// Load tags from a JSON array of {name, color, slug}
    LoadTags { path: PathBuf },
    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let addr = config.bind_addr;
            let app = build_app(pool, config).await?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Command::LoadIngredients { path } => {
            let added = cli::load_ingredients(&pool, &path).await?;
            println!("Added {added} ingredients");
        }
        Command::LoadTags { path } => {
            let added = cli::load_tags(&pool, &path).await?;
            println!("Added {added} tags");
        }
        Command::CreateUser {
            email,
            username,
            first_name,
            last_name,
            password,
        } => {
            cli::create_user(
                &pool,
                Registration {
                    email: Some(email),
                    username: Some(username),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    password: Some(password),
                },
            )
            .await?;
        }
    }

    Ok(())
}
