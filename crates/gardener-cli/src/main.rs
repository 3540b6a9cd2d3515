//! `gardener`: run digital-gardener commands against a markdown vault.

mod args;
mod surface;

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gardener_agent::{line_range, CommandContext, CommandOutcome, CommandRegistry, StatusBar};
use gardener_core::{DocumentRef, DocumentStore, Settings};
use gardener_inference::{CancelToken, CompletionClient};
use gardener_vault::{ensure_root_folders, list_folders, read_vault_index, FilesystemVault, SettingsStore};

use args::{Cli, Command, SelectionArgs, SettingsAction};
use surface::{StderrStatus, TerminalSurface};

/// Initialize tracing on stderr, or on a daily-rotated file when `LOG_FILE` is set.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, replaces stderr output)
///   RUST_LOG    - standard env filter (default: "gardener=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gardener=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("gardener.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
        None
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let settings_store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::for_vault(&cli.vault),
    };
    debug!(path = %settings_store.path().display(), "Using settings file");

    if let Command::Settings { action } = &cli.command {
        return settings_command(&settings_store, action).await;
    }

    let mut settings = settings_store
        .load()
        .await
        .with_context(|| format!("loading {}", settings_store.path().display()))?
        .apply_env();
    cli.apply_overrides(&mut settings);
    settings.validate()?;
    let settings = Arc::new(settings);

    let vault = Arc::new(FilesystemVault::new(&cli.vault));
    info!(vault = %vault.root().display(), name = %vault.vault_name(), "Opened vault");
    ensure_root_folders(vault.as_ref(), &settings).await;

    if let Some(file) = &cli.file {
        vault
            .set_active_document(Some(DocumentRef::new(file.as_str())))
            .await
            .with_context(|| format!("opening {}", file))?;
    }

    match &cli.command {
        Command::Index => {
            let index = read_vault_index(vault.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&index)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Folders => {
            for folder in list_folders(vault.as_ref()).await? {
                println!("{}", folder);
            }
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let status = Arc::new(StderrStatus::new());
    let seed = cli.command.query_args().map(|args| args.seed(&settings));
    let bar = StatusBar::new(status.clone(), Arc::clone(&settings));
    let registry = CommandRegistry::with_default_commands(&settings, &bar);
    status.finish();

    if registry.is_empty() {
        eprintln!(
            "No API key configured. Set OPENAI_API_KEY or run `gardener settings set openAIAPIKey <key>`."
        );
        return Ok(ExitCode::FAILURE);
    }

    let client = CompletionClient::from_settings(&settings)?;
    let cancel = CancelToken::new();
    let ctx = CommandContext::new(
        Arc::clone(&settings),
        vault.clone(),
        client,
        Arc::new(TerminalSurface::new(seed)),
        status.clone(),
    )
    .with_cancel(cancel.clone());
    let ctx = match &cli.command {
        Command::Selection(args) => match read_selection(args, vault.as_ref()).await? {
            Some(text) => ctx.with_selection(text),
            None => ctx,
        },
        _ => ctx,
    };

    if let Command::Commands = &cli.command {
        for command in registry.commands() {
            let state = if registry.is_enabled(command.id(), &ctx).await {
                "enabled"
            } else {
                "needs --file"
            };
            println!("{:<32} {:<36} {}", command.id(), command.name(), state);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(id) = cli.command.command_id() else {
        return Ok(ExitCode::SUCCESS);
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the request");
            cancel.cancel();
        }
    });

    let outcome = registry.execute(id, &ctx).await?;
    status.finish();
    Ok(if report(&outcome) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The selected text: given inline, a line range of the active document, or
/// piped on stdin.
async fn read_selection(args: &SelectionArgs, vault: &FilesystemVault) -> anyhow::Result<Option<String>> {
    if let Some(text) = &args.text {
        return Ok(Some(text.clone()));
    }
    if let Some(lines) = &args.lines {
        let doc = vault
            .active_document()
            .await
            .context("--lines selects from the active document, pass --file <path>")?;
        let content = vault.read(&doc.path).await?;
        return Ok(line_range(&content, lines.clone()));
    }
    if std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(Some(text))
}

/// Print what the command did. Returns false when it did not succeed.
fn report(outcome: &CommandOutcome) -> bool {
    match outcome {
        CommandOutcome::Created(doc) => println!("created {}", doc),
        CommandOutcome::Updated(doc) => println!("updated {}", doc),
        CommandOutcome::Renamed { from, to } => println!("renamed {} -> {}", from, to),
        CommandOutcome::NoChange => println!("no changes"),
        CommandOutcome::Cancelled => println!("cancelled"),
        CommandOutcome::Disabled => {
            eprintln!("This command needs an active document, pass --file <path>");
            return false;
        }
        CommandOutcome::Failed(_) => return false,
    }
    true
}

async fn settings_command(store: &SettingsStore, action: &SettingsAction) -> anyhow::Result<ExitCode> {
    match action {
        SettingsAction::Show => {
            let settings = store.load().await?.apply_env();
            println!("{}", serde_json::to_string_pretty(&masked(&settings))?);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.load().await?;
            settings.set_field(key, value)?;
            store.save(&settings).await?;
            info!(key = %key, path = %store.path().display(), "Saved setting");
            println!("{} updated in {}", key, store.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn masked(settings: &Settings) -> Settings {
    let mut shown = settings.clone();
    if shown.has_api_key() {
        let chars: Vec<char> = shown.api_key.trim().chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        shown.api_key = format!("****{}", tail);
    }
    shown
}
