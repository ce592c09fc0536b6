//! haloctl
//!
//! Command-line client for a Halo blog's admin API.
//!
//! # Usage
//!
//! ```bash
//! # Log in with the configured username/password and store the tokens
//! haloctl login
//!
//! # Search posts
//! haloctl posts --keyword rust
//!
//! # Publish a journal
//! haloctl journal-create "Have a good time~" --type intimate
//!
//! # Check Halo releases against the running version
//! haloctl releases
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use haloctl_core::{
    AuthInterceptor, Credentials, HaloClient, InterceptorConfig, JournalType, MemoryStore,
    PostQuery, ReleasesClient, ReqwestTransport, SecretStore, create_store,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod render;

use config::Config;
use render::OutputFormat;

type Client = HaloClient<ReqwestTransport, Box<dyn SecretStore>>;

#[derive(Parser)]
#[command(name = "haloctl")]
#[command(about = "Browse and publish content on a Halo blog")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Keep tokens in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the issued tokens
    Login,

    /// Forget stored tokens
    Logout,

    /// Search posts
    Posts {
        /// Keyword to search for
        #[arg(short, long)]
        keyword: Option<String>,

        /// Restrict to one category
        #[arg(long)]
        category: Option<u64>,
    },

    /// Show one post with its source content
    Post {
        /// Post ID
        id: u64,
    },

    /// Search journals
    Journals {
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Publish a journal
    JournalCreate {
        /// Journal content
        content: String,

        /// Visibility (public, intimate)
        #[arg(short = 't', long = "type", default_value = "public")]
        kind: JournalType,
    },

    /// Search attachments
    Attachments {
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// List Halo releases on GitHub
    Releases,

    /// Show the running Halo version
    Environment,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose);
    info!("Loaded configuration from {:?}", config.config_path);

    let client = build_client(&config, cli.ephemeral)?;
    let format = cli.format;

    let output = match cli.command {
        Commands::Login => {
            client.interceptor().login().await?;
            "Logged in".to_string()
        }
        Commands::Logout => {
            Credentials::clear(client.interceptor().store()).await?;
            "Logged out".to_string()
        }
        Commands::Posts { keyword, category } => {
            let query = PostQuery {
                keyword,
                category_id: category,
                ..PostQuery::default()
            };
            let posts = client.list_posts(&query).await.context("Could not fetch posts")?;
            render::posts(&posts, format)?
        }
        Commands::Post { id } => {
            let detail = client
                .get_post(id)
                .await
                .context("Could not get post details")?;
            render::post_detail(&detail, format)?
        }
        Commands::Journals { keyword } => {
            let journals = client
                .list_journals(keyword.as_deref())
                .await
                .context("Could not fetch journals")?;
            render::journals(&journals, format)?
        }
        Commands::JournalCreate { content, kind } => {
            let journal = client.create_journal(&content, kind).await?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&journal)?,
                OutputFormat::Text => "Journal created".to_string(),
            }
        }
        Commands::Attachments { keyword } => {
            let attachments = client
                .list_attachments(keyword.as_deref())
                .await
                .context("Could not fetch attachments")?;
            render::attachments(&attachments, format)?
        }
        Commands::Releases => list_releases(&client, &config, format).await?,
        Commands::Environment => {
            let env = client
                .environment()
                .await
                .context("Could not fetch halo environments")?;
            render::environment(&env, format)?
        }
    };

    println!("{}", output);
    Ok(())
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(config: &Config, ephemeral: bool) -> Result<Client> {
    let transport = ReqwestTransport::new(&config.base_url, config.request_timeout())
        .with_context(|| format!("Invalid base_url {:?}", config.base_url))?;

    let store: Box<dyn SecretStore> = if ephemeral {
        Box::new(MemoryStore::new())
    } else {
        create_store(config.prefer_keyring)
    };

    let interceptor_config = InterceptorConfig {
        token_header: config.token_header.clone(),
        login: config.login_credentials(),
        refresh_timeout: config.refresh_timeout(),
        ..InterceptorConfig::default()
    };

    Ok(HaloClient::new(AuthInterceptor::new(
        transport,
        store,
        interceptor_config,
    )))
}

async fn list_releases(client: &Client, config: &Config, format: OutputFormat) -> Result<String> {
    let transport = ReqwestTransport::new(&config.github_api_url, config.request_timeout())
        .with_context(|| format!("Invalid github_api_url {:?}", config.github_api_url))?;
    let releases = ReleasesClient::new(transport)
        .list(&config.releases_repo)
        .await
        .context("Could not fetch halo github releases")?;

    // Marking the running version is best effort.
    let running = match client.environment().await {
        Ok(env) => Some(env.version),
        Err(e) => {
            warn!("Could not fetch halo environments: {}", e);
            None
        }
    };

    render::releases(&releases, running.as_deref(), format)
}
