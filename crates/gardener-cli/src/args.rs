//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use gardener_core::{CallOptions, EmojiLevel, Settings};

#[derive(Debug, Parser)]
#[command(name = "gardener")]
#[command(about = "Grow a markdown vault with OpenAI-generated notes, links and properties", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Vault root directory
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,

    /// Settings file (default: <vault>/.obsidian/plugins/digital-gardener/data.json)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Vault-relative path of the active document
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Model override for this invocation
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature override (0-2)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Maximum tokens override
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new note from a query
    NewFile(QueryArgs),

    /// Ask a question; the answer is appended to --file or written to a new note
    Ask(QueryArgs),

    /// Answer selected text from --file; the answer is appended to it
    Selection(SelectionArgs),

    /// Suggest names for --file and rename it
    Rename,

    /// Suggest frontmatter properties for --file
    Properties,

    /// Append links to related notes to --file
    WikiLinks,

    /// Print the vault metadata index as JSON
    Index,

    /// List vault folders
    Folders,

    /// List the available commands
    Commands,

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

impl Command {
    /// Registry id of a generative command.
    pub fn command_id(&self) -> Option<&'static str> {
        match self {
            Self::NewFile(_) => Some("dg-generate-file-from-query"),
            Self::Ask(_) => Some("dg-generate-text-from-prompt"),
            Self::Selection(_) => Some("dg-generate-text-from-selection"),
            Self::Rename => Some("dg-rename-file-from-contents"),
            Self::Properties => Some("dg-generate-file-properties"),
            Self::WikiLinks => Some("dg-generate-wiki-links"),
            _ => None,
        }
    }

    pub fn query_args(&self) -> Option<&QueryArgs> {
        match self {
            Self::NewFile(args) | Self::Ask(args) => Some(args),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings (API key masked)
    Show,

    /// Set one key, e.g. `settings set oaiTemperature 0.4`
    Set { key: String, value: String },
}

/// Options for the commands that take a free-text query.
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// The request; asked for interactively when omitted
    pub query: Option<String>,

    /// Include the vault's file list in the prompt
    #[arg(long)]
    pub files: bool,

    /// Include the vault's tags in the prompt
    #[arg(long)]
    pub tags: bool,

    /// Include your name, pronouns and biography
    #[arg(long)]
    pub personal: bool,

    /// Emoji usage: none, low, medium or high
    #[arg(long)]
    pub emoji: Option<EmojiLevel>,
}

/// Where the selected text comes from. Without either, it is read from stdin.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// The selected text
    #[arg(conflicts_with = "lines")]
    pub text: Option<String>,

    /// Select lines of --file instead, e.g. `3-7` or `5`
    #[arg(long, value_parser = parse_line_range)]
    pub lines: Option<RangeInclusive<usize>>,
}

/// Parse a 1-based inclusive line range such as `3-7` or `5`.
pub fn parse_line_range(s: &str) -> Result<RangeInclusive<usize>, String> {
    let number = |part: &str| {
        part.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid line number: {}", part))
    };
    let (start, end) = match s.split_once('-') {
        Some((start, end)) => (number(start)?, number(end)?),
        None => {
            let line = number(s)?;
            (line, line)
        }
    };
    if end < start {
        return Err(format!("line range ends before it starts: {}", s));
    }
    Ok(start..=end)
}

impl QueryArgs {
    /// Call options seeded from the flags. The query may still be empty.
    pub fn seed(&self, settings: &Settings) -> CallOptions {
        CallOptions {
            include_personalisation: self.personal,
            include_filenames: self.files,
            include_tags: self.tags,
            user_query: self.query.clone().unwrap_or_default(),
            emoji_level: self.emoji.unwrap_or(settings.emoji_level),
            ..CallOptions::from_settings(settings)
        }
    }
}

impl Cli {
    /// Apply per-invocation overrides on top of file and environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_new_file_with_toggles() {
        let cli = Cli::try_parse_from([
            "gardener", "--vault", "/tmp/garden", "new-file", "notes on bees", "--tags", "--emoji", "high",
        ])
        .unwrap();

        assert_eq!(cli.vault, PathBuf::from("/tmp/garden"));
        assert_eq!(cli.command.command_id(), Some("dg-generate-file-from-query"));
        let args = cli.command.query_args().unwrap();
        assert_eq!(args.query.as_deref(), Some("notes on bees"));
        assert!(args.tags);
        assert!(!args.files);
        assert_eq!(args.emoji, Some(EmojiLevel::High));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gardener", "wiki-links", "--file", "Trip.md"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some("Trip.md"));
        assert_eq!(cli.command.command_id(), Some("dg-generate-wiki-links"));
        assert!(cli.command.query_args().is_none());
    }

    #[test]
    fn test_settings_set() {
        let cli = Cli::try_parse_from(["gardener", "settings", "set", "oaiTemperature", "0.4"]).unwrap();
        match cli.command {
            Command::Settings {
                action: SettingsAction::Set { key, value },
            } => {
                assert_eq!(key, "oaiTemperature");
                assert_eq!(value, "0.4");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["gardener", "settings"]).is_err());
    }

    #[test]
    fn test_parse_selection() {
        let cli = Cli::try_parse_from(["gardener", "--file", "Journal.md", "selection", "--lines", "3-7"])
            .unwrap();
        assert_eq!(cli.command.command_id(), Some("dg-generate-text-from-selection"));
        match cli.command {
            Command::Selection(args) => {
                assert_eq!(args.lines, Some(3..=7));
                assert!(args.text.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["gardener", "selection", "bees", "--lines", "2"]).is_err());
    }

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("4"), Ok(4..=4));
        assert_eq!(parse_line_range(" 2 - 9 "), Ok(2..=9));
        assert!(parse_line_range("0").is_err());
        assert!(parse_line_range("7-3").is_err());
        assert!(parse_line_range("a-b").is_err());
    }

    #[test]
    fn test_invalid_emoji_level_rejected() {
        assert!(Cli::try_parse_from(["gardener", "ask", "hi", "--emoji", "lots"]).is_err());
    }

    #[test]
    fn test_seed_and_overrides() {
        let cli = Cli::try_parse_from([
            "gardener", "--model", "gpt-4o", "--max-tokens", "500", "ask", "--files",
        ])
        .unwrap();
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_tokens, 500);

        let seed = cli.command.query_args().unwrap().seed(&settings);
        assert!(seed.user_query.is_empty());
        assert!(seed.include_filenames);
        assert_eq!(seed.model.as_deref(), Some("gpt-4o"));
        assert_eq!(seed.max_tokens, Some(500));
        assert_eq!(seed.emoji_level, EmojiLevel::None);
    }
}
