// gibbot-server/src/main.rs

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use gibbot_core::config::Config;
use gibbot_core::db::Database;
use gibbot_core::repositories::sqlite::{commands, user};
use gibbot_core::services::builtin_commands::builtin_commands;
use gibbot_core::services::{CommandRegistry, CommandService};

mod console;
use console::{run_console_loop, ConsoleSender};

#[derive(Parser, Debug, Clone)]
#[command(name = "gibbot")]
#[command(author, version, about = "Gibbot - twitch chat bot with gated commands")]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Sets log level to debug
    #[arg(long)]
    debug: bool,

    /// Ignore all other args and generate the command list json to the
    /// specified path
    #[arg(long)]
    cmd_list: Option<String>,

    /// Prefix shown on command names in the generated command list
    #[arg(long, default_value = "!")]
    cmd_list_prefix: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).init();

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));

    if let Some(path) = &args.cmd_list {
        info!("generating command list json at {}", path);
        let mut infos = registry.command_infos();
        for entry in &mut infos {
            if !entry.no_prefix {
                entry.name = format!("{}{}", args.cmd_list_prefix, entry.name);
            }
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        std::fs::write(path, serde_json::to_string_pretty(&infos)?)?;
        info!("command list json generated successfully");
        return Ok(());
    }

    if !Path::new(&args.config).exists() {
        warn!(
            "config file {} does not exist, creating from template",
            args.config
        );
        Config::template().save(&args.config)?;
        info!("template created successfully, please edit the file and run the bot again");
        return Ok(());
    }

    let mut cfg = Config::from_file(&args.config)?;

    let db = Database::new(&cfg.database.path).await?;
    // a half-migrated store is fatal: any migration error bubbles out of
    // main before message handling starts
    if db.migrate(&mut cfg).await? {
        cfg.save(&args.config)?;
    }

    // mirror the registry's command names into the store; a no-op on every
    // start after the first
    {
        let mut tx = db.pool().begin().await?;
        commands::insert_commands(&mut tx, &registry.command_names()).await?;
        tx.commit().await?;
    }

    {
        let mut conn = db.pool().acquire().await?;
        let channels = user::joined_channels(&mut conn).await?;
        info!("bot is joined to {} channel(s)", channels.len());
    }

    let service = CommandService::new(db.clone(), registry);
    let sender = ConsoleSender::new();

    info!("no chat transport configured in this build; starting operator console on stdin");
    run_console_loop(&service, &sender, &db, &cfg).await?;

    Ok(())
}
