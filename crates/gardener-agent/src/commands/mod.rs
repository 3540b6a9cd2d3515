//! Vault commands and the registry that exposes them.
//!
//! Each command composes a prompt, makes exactly one completion request and
//! reconciles the typed result into the vault. A failed completion never
//! mutates the vault and produces exactly one error notice.

mod chat;
mod create_file;
mod properties;
mod rename;
mod wiki_links;

pub use chat::{line_range, GenerateTextFromPrompt, GenerateTextFromSelection};
pub use create_file::{new_file_path, GenerateFileFromQuery};
pub use properties::GenerateFileProperties;
pub use rename::RenameFileFromContents;
pub use wiki_links::{refers_to, GenerateWikiLinks};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

use gardener_core::{
    CallOptions, CompletionFailure, ComposedPrompt, DocumentRef, DocumentStore, Error, Notice,
    NoticeLevel, Result, Settings, StatusSink, UserSurface,
};
use gardener_inference::{CancelToken, CompletionClient};
use gardener_vault::read_vault_index;

use crate::composer::{PromptComposer, PromptContext, TaskKind};
use crate::status::StatusBar;

/// Everything a command needs for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn DocumentStore>,
    pub client: CompletionClient,
    pub surface: Arc<dyn UserSurface>,
    pub status: StatusBar,
    pub composer: PromptComposer,
    pub cancel: CancelToken,
    /// Text the user selected in the active document, if any.
    pub selection: Option<String>,
}

impl CommandContext {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn DocumentStore>,
        client: CompletionClient,
        surface: Arc<dyn UserSurface>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            status: StatusBar::new(sink, Arc::clone(&settings)),
            composer: PromptComposer::new(Arc::clone(&settings)),
            settings,
            store,
            client,
            surface,
            cancel: CancelToken::new(),
            selection: None,
        }
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    /// Compose a prompt against a fresh vault index.
    pub async fn compose(
        &self,
        task: TaskKind,
        options: &CallOptions,
        user_message: &str,
    ) -> ComposedPrompt {
        let index = read_vault_index(self.store.as_ref()).await;
        let vault_name = self.store.vault_name();
        let config_dir = self.store.config_dir();
        let ctx = PromptContext {
            vault_name: &vault_name,
            config_dir: &config_dir,
            index: &index,
        };
        self.composer.compose(task, &ctx, options, user_message)
    }

    /// The active document, or an error for document-scoped commands.
    pub async fn require_active(&self) -> Result<DocumentRef> {
        self.store
            .active_document()
            .await
            .ok_or_else(|| Error::InvalidInput("No active document".to_string()))
    }

    pub fn notify(&self, notice: Notice) {
        self.surface.notify(notice);
    }

    /// Report a failed completion: one error dialog, no mutation.
    pub fn report_failure(&self, failure: CompletionFailure) -> CommandOutcome {
        self.notify(Notice::dialog(
            NoticeLevel::Error,
            "Error",
            failure.display_text(),
        ));
        CommandOutcome::Failed(failure.display_text())
    }
}

/// What a command invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Created(DocumentRef),
    Updated(DocumentRef),
    Renamed { from: DocumentRef, to: DocumentRef },
    /// Completed without touching the vault.
    NoChange,
    /// The user backed out of a dialog.
    Cancelled,
    /// Not runnable right now, e.g. no active document.
    Disabled,
    Failed(String),
}

impl CommandOutcome {
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            Self::Created(_) | Self::Updated(_) | Self::Renamed { .. }
        )
    }
}

/// A user-invocable command.
#[async_trait]
pub trait GardenerCommand: Send + Sync {
    /// Stable identifier, e.g. `dg-generate-wiki-links`.
    fn id(&self) -> &'static str;

    /// Human readable name.
    fn name(&self) -> &'static str;

    /// Commands that act on the active document are disabled without one.
    fn requires_active_document(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome>;
}

/// Registered commands, looked up by id.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn GardenerCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in commands. Without an API key nothing is
    /// registered and the status bar says so.
    pub fn with_default_commands(settings: &Settings, status: &StatusBar) -> Self {
        let mut registry = Self::new();
        if !settings.has_api_key() {
            warn!("No API key configured, commands are not available");
            status.show_no_api_key();
            return registry;
        }

        registry.register(Box::new(GenerateTextFromPrompt));
        registry.register(Box::new(GenerateTextFromSelection));
        registry.register(Box::new(GenerateFileFromQuery));
        registry.register(Box::new(GenerateFileProperties));
        registry.register(Box::new(GenerateWikiLinks));
        registry.register(Box::new(RenameFileFromContents));
        status.show_idle();
        registry
    }

    pub fn register(&mut self, command: Box<dyn GardenerCommand>) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn GardenerCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn GardenerCommand> {
        self.commands().find(|c| c.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the command can run in the current state.
    pub async fn is_enabled(&self, id: &str, ctx: &CommandContext) -> bool {
        match self.get(id) {
            Some(cmd) => !cmd.requires_active_document() || ctx.store.active_document().await.is_some(),
            None => false,
        }
    }

    /// Run a command. Errors raised while reconciling into the vault are
    /// reported to the user here; they only escape for unknown ids.
    pub async fn execute(&self, id: &str, ctx: &CommandContext) -> Result<CommandOutcome> {
        let command = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("command {}", id)))?;

        if !self.is_enabled(id, ctx).await {
            info!(command = id, "Command disabled: no active document");
            return Ok(CommandOutcome::Disabled);
        }

        let span = info_span!("command", subsystem = "agent", command = id);
        let outcome = match command.run(ctx).instrument(span).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(command = id, error = %e, "Command failed");
                ctx.notify(Notice::dialog(NoticeLevel::Error, "Error", e.to_string()));
                CommandOutcome::Failed(e.to_string())
            }
        };

        info!(command = id, mutated = outcome.mutated(), outcome = ?outcome, "Command finished");
        Ok(outcome)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use gardener_inference::mock::MockChatBackend;

    #[test]
    fn test_no_api_key_registers_nothing() {
        let fx = Fixture::new(&[], MockChatBackend::new(), ScriptedSurface::default());
        let registry = CommandRegistry::with_default_commands(&Settings::default(), &fx.ctx.status);

        assert!(registry.is_empty());
        assert_eq!(
            fx.sink.updates.lock().unwrap().last().unwrap(),
            "Digital Gardener: No API Key"
        );
    }

    #[test]
    fn test_default_commands_by_id() {
        let fx = Fixture::new(&[], MockChatBackend::new(), ScriptedSurface::default());
        let registry = CommandRegistry::with_default_commands(&fx.ctx.settings, &fx.ctx.status);

        let ids: Vec<&str> = registry.commands().map(|c| c.id()).collect();
        assert_eq!(
            ids,
            vec![
                "dg-generate-text-from-prompt",
                "dg-generate-text-from-selection",
                "dg-generate-file-from-query",
                "dg-generate-file-properties",
                "dg-generate-wiki-links",
                "dg-rename-file-from-contents",
            ]
        );
        assert_eq!(
            registry.get("dg-generate-wiki-links").unwrap().name(),
            "Append WikiLinks to current file"
        );
    }

    #[tokio::test]
    async fn test_document_commands_disabled_without_active_document() {
        let fx = Fixture::new(&[("Trip.md", "# Trip")], MockChatBackend::new(), ScriptedSurface::default());
        let registry = CommandRegistry::with_default_commands(&fx.ctx.settings, &fx.ctx.status);

        for id in [
            "dg-generate-text-from-selection",
            "dg-generate-file-properties",
            "dg-generate-wiki-links",
            "dg-rename-file-from-contents",
        ] {
            assert!(!registry.is_enabled(id, &fx.ctx).await);
            let outcome = registry.execute(id, &fx.ctx).await.unwrap();
            assert_eq!(outcome, CommandOutcome::Disabled);
        }
        assert!(registry.is_enabled("dg-generate-file-from-query", &fx.ctx).await);
        assert_eq!(fx.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_found() {
        let fx = Fixture::new(&[], MockChatBackend::new(), ScriptedSurface::default());
        let registry = CommandRegistry::with_default_commands(&fx.ctx.settings, &fx.ctx.status);
        assert!(matches!(
            registry.execute("dg-nope", &fx.ctx).await,
            Err(Error::NotFound(_))
        ));
    }
}
