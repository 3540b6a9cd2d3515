//! System prompt composition.
//!
//! The system message is assembled in a fixed order: persona, task
//! instructions, then a block of vault and user context. Context blocks that
//! are toggled off are left out entirely. Values are interpolated verbatim.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tracing::debug;

use gardener_core::defaults::PROTECTED_FRONTMATTER_KEYS;
use gardener_core::{CallOptions, ComposedPrompt, EmojiLevel, Settings, VaultFileIndex};

use crate::prompts;

/// The command a prompt is being composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    NewFile,
    Properties,
    WikiLinks,
    Rename,
    Chat,
}

impl TaskKind {
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::NewFile => prompts::NEW_FILE,
            Self::Properties => prompts::PROPERTIES,
            Self::WikiLinks => prompts::WIKI_LINKS,
            Self::Rename => prompts::RENAME,
            Self::Chat => prompts::CHAT,
        }
    }

    /// Tasks whose output touches frontmatter get the vault's key list.
    /// Only these two write frontmatter, so every other prompt leaves the
    /// key list out.
    pub fn uses_frontmatter(&self) -> bool {
        matches!(self, Self::NewFile | Self::Properties)
    }

    /// Wiki-link suggestions are meaningless without the file list.
    pub fn requires_filenames(&self) -> bool {
        matches!(self, Self::WikiLinks)
    }
}

/// Vault facts that go into the context block.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub vault_name: &'a str,
    pub config_dir: &'a str,
    pub index: &'a VaultFileIndex,
}

/// The single emoji sentence for a level.
pub fn emoji_directive(level: EmojiLevel) -> &'static str {
    match level {
        EmojiLevel::None => "The user has requested no emojis - keep the response free of emojis.",
        EmojiLevel::Low => "The user will allow a low amount of appropriate emojis in the response.",
        EmojiLevel::Medium => "The user will allow an appropriate amount of emojis in the response.",
        EmojiLevel::High => {
            "The user has asked you to be creative and use as many emojis as you like in the response."
        }
    }
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Builds the system and user messages for a command.
#[derive(Clone)]
pub struct PromptComposer {
    settings: Arc<Settings>,
    clock: Clock,
}

impl PromptComposer {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Use a fixed or custom clock for the date and time lines.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Compose the full prompt. `user_message` is the free-text query or the
    /// active document's raw content.
    pub fn compose(
        &self,
        task: TaskKind,
        ctx: &PromptContext<'_>,
        options: &CallOptions,
        user_message: &str,
    ) -> ComposedPrompt {
        let system = self.system_message(task, ctx, options);
        debug!(
            subsystem = "agent",
            component = "composer",
            task = ?task,
            prompt_len = system.len() + user_message.len(),
            "Composed prompt"
        );
        ComposedPrompt::new(system, user_message)
    }

    pub fn system_message(
        &self,
        task: TaskKind,
        ctx: &PromptContext<'_>,
        options: &CallOptions,
    ) -> String {
        let now = (self.clock)();
        let mut blocks: Vec<String> = vec![
            prompts::PERSONA.to_string(),
            task.instructions().to_string(),
        ];

        blocks.push(format!(
            "Some additional important information:\n\n\
             Today's date: {}\n\n\
             The current time: {}\n\n\
             The current vault name: {}\n\n\
             The current vault config dir is: {}",
            now.format("%A, %-d %B %Y"),
            now.format("%H:%M"),
            ctx.vault_name,
            ctx.config_dir,
        ));

        if task.uses_frontmatter() {
            if !ctx.index.frontmatter_keys.is_empty() {
                blocks.push(format!(
                    "Here are all the frontmatter keys available in the current vault, reuse ones that are relevant:\n{}",
                    json_list(ctx.index.frontmatter_keys.iter())
                ));
            }
            blocks.push(format!(
                "The following keys tend to be generated automatically and must not be replaced, so only include them when they are missing from a file: {}",
                PROTECTED_FRONTMATTER_KEYS.join(", ")
            ));
        }

        if options.include_personalisation {
            let s = &self.settings;
            blocks.push(format!(
                "Name: {}\nPronouns: {}\nPreferred Language: {}\nBiography: {}",
                s.user_name, s.user_pronouns, s.user_languages, s.user_bio
            ));
        }

        if options.include_filenames || task.requires_filenames() {
            let files = serde_json::to_string_pretty(&ctx.index.files).unwrap_or_default();
            blocks.push(format!(
                "The following is a list of all markdown files in the current vault:\n{}\n\
                 When creating content, connect it to relevant files from this list with [[FILENAME]] WikiLinks.",
                files
            ));
        }

        if options.include_tags {
            blocks.push(format!(
                "The following is a list of all tags in the current vault, reuse ones that are relevant:\n{}",
                json_list(ctx.index.tags.iter())
            ));
        }

        blocks.push(emoji_directive(options.emoji_level).to_string());

        blocks.join("\n\n")
    }
}

fn json_list<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let items: Vec<&String> = items.collect();
    serde_json::to_string_pretty(&items).unwrap_or_default()
}
