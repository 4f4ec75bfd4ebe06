mod config;
mod logging;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog_auth::{Claims, JwtVerifier};
use clap::{Parser, Subcommand};
use product_catalog::CatalogModule;

use crate::config::{AppConfig, CliOverrides};

/// Product Catalog Server - multi-tenant product catalog over HTTP
#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(about = "Product Catalog Server - multi-tenant product catalog over HTTP")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
    /// Mint a bearer token signed with the configured secret (local testing)
    Token {
        /// Tenant the token is bound to
        #[arg(long)]
        tenant: String,

        #[arg(long, default_value = "dev")]
        subject: String,

        /// Lifetime in minutes
        #[arg(long, default_value_t = 60)]
        ttl_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (CATALOG__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
        Commands::Token {
            tenant,
            subject,
            ttl_minutes,
        } => mint_token(&config, tenant, subject, ttl_minutes),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    config.validate()?;
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn mint_token(config: &AppConfig, tenant: String, subject: String, ttl_minutes: i64) -> Result<()> {
    let verifier = JwtVerifier::new(&config.auth.to_jwt_config())?;
    let token = verifier.sign(
        &Claims::for_tenant(tenant).with_subject(subject),
        time::Duration::minutes(ttl_minutes),
    )?;
    println!("{token}");
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;

    let verifier = Arc::new(JwtVerifier::new(&config.auth.to_jwt_config())?);
    let module = CatalogModule::in_memory(&config.catalog)?;
    let router = module.router(verifier, config.server.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "catalog server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("catalog server stopped");
    Ok(())
}
