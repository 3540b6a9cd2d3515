//! # gardener-agent
//!
//! Prompt composition and the vault commands of digital-gardener.
//!
//! A command collects options from the [`gardener_core::UserSurface`],
//! composes a prompt from vault metadata, makes one completion request and
//! reconciles the typed result into the [`gardener_core::DocumentStore`].

pub mod commands;
pub mod composer;
pub mod prompts;
pub mod status;

pub use commands::{
    line_range, new_file_path, refers_to, CommandContext, CommandOutcome, CommandRegistry,
    GardenerCommand, GenerateFileFromQuery, GenerateFileProperties, GenerateTextFromPrompt,
    GenerateTextFromSelection, GenerateWikiLinks, RenameFileFromContents,
};
pub use composer::{emoji_directive, PromptComposer, PromptContext, TaskKind};
pub use status::{PendingTimer, StatusBar};
