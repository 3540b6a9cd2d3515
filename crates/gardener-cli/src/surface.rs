//! Terminal implementation of the user surface and status line.

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};
use std::io::{IsTerminal, Write};
use std::sync::Mutex;
use tracing::warn;

use gardener_core::defaults::AVAILABLE_MODELS;
use gardener_core::{
    CallOptions, Choice, EmojiLevel, Error, Notice, NoticeLevel, NoticeStyle, OptionRequest, Result, Settings,
    StatusSink, UserSurface,
};

/// Prompts on the terminal with `dialoguer`; notices go to stderr.
pub struct TerminalSurface {
    seed: Option<CallOptions>,
    interactive: bool,
}

impl TerminalSurface {
    pub fn new(seed: Option<CallOptions>) -> Self {
        Self {
            seed,
            interactive: std::io::stdin().is_terminal() && std::io::stderr().is_terminal(),
        }
    }

    async fn prompt<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ColorfulTheme) -> dialoguer::Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || f(&ColorfulTheme::default()))
            .await
            .map_err(|e| Error::Internal(format!("prompt task failed: {}", e)))?
            .map_err(|e| Error::InvalidInput(format!("prompt failed: {}", e)))
    }
}

/// Label shown for a choice in a selection list.
pub fn choice_line(choice: &Choice) -> String {
    let mut line = format!("{} ({:.2})", choice.label, choice.score);
    if !choice.reason.is_empty() {
        line.push_str(": ");
        line.push_str(&choice.reason);
    }
    line
}

/// Text written to stderr for a notice.
pub fn render_notice(notice: &Notice) -> String {
    let level = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    match notice.style {
        NoticeStyle::Toast => format!("[{}] {}: {}", level, notice.title, notice.message),
        NoticeStyle::Dialog => format!("[{}] {}\n  {}", level, notice.title, notice.message),
    }
}

/// Finish the collected options. An empty query cancels; personalisation is
/// only kept when the settings have something to personalise with.
pub fn finish_options(mut options: CallOptions, settings: &Settings) -> Option<CallOptions> {
    let query = options.user_query.trim();
    if query.is_empty() {
        return None;
    }
    options.user_query = query.to_string();
    Some(options.normalized(settings))
}

/// Context toggles offered in the dialog, with their current state.
fn context_toggles(options: &CallOptions, settings: &Settings) -> Vec<(String, bool)> {
    let mut toggles = vec![
        ("Vault file names".to_string(), options.include_filenames),
        ("Vault tags".to_string(), options.include_tags),
    ];
    if settings.has_personalisation() {
        toggles.push((
            format!("Personalise for {}", settings.user_name),
            options.include_personalisation,
        ));
    }
    toggles
}

/// Emoji levels offered in the dialog and the index of the current one.
fn emoji_items(current: EmojiLevel) -> (Vec<&'static str>, usize) {
    let items = EmojiLevel::ALL.iter().map(|level| level.as_str()).collect();
    let default = EmojiLevel::ALL
        .iter()
        .position(|level| *level == current)
        .unwrap_or(0);
    (items, default)
}

#[async_trait]
impl UserSurface for TerminalSurface {
    async fn collect_options(
        &self,
        settings: &Settings,
        request: &OptionRequest,
    ) -> Result<Option<CallOptions>> {
        let mut options = self
            .seed
            .clone()
            .unwrap_or_else(|| CallOptions::from_settings(settings));

        if options.user_query.trim().is_empty() && self.interactive {
            let title = request.title.clone();
            options.user_query = self
                .prompt(move |theme| {
                    Input::<String>::with_theme(theme)
                        .with_prompt(title)
                        .allow_empty(true)
                        .interact_text()
                })
                .await?;

            if request.offer_context_toggles && !options.user_query.trim().is_empty() {
                let toggles = context_toggles(&options, settings);
                let picked = self
                    .prompt(move |theme| {
                        MultiSelect::with_theme(theme)
                            .with_prompt("Include in the prompt")
                            .items_checked(&toggles)
                            .interact_opt()
                    })
                    .await?;
                let Some(picked) = picked else {
                    return Ok(None);
                };
                options.include_filenames = picked.contains(&0);
                options.include_tags = picked.contains(&1);
                options.include_personalisation = picked.contains(&2);

                let current = options.model.clone().unwrap_or_else(|| settings.model.clone());
                let default = AVAILABLE_MODELS
                    .iter()
                    .position(|(id, _)| *id == current)
                    .unwrap_or(0);
                let labels: Vec<&'static str> = AVAILABLE_MODELS.iter().map(|(_, label)| *label).collect();
                let model = self
                    .prompt(move |theme| {
                        Select::with_theme(theme)
                            .with_prompt("Model")
                            .items(&labels)
                            .default(default)
                            .interact_opt()
                    })
                    .await?;
                match model.and_then(|i| AVAILABLE_MODELS.get(i)) {
                    Some((id, _)) => options.model = Some(id.to_string()),
                    None => return Ok(None),
                }

                let (levels, default) = emoji_items(options.emoji_level);
                let emoji = self
                    .prompt(move |theme| {
                        Select::with_theme(theme)
                            .with_prompt("Emoji usage")
                            .items(&levels)
                            .default(default)
                            .interact_opt()
                    })
                    .await?;
                match emoji.and_then(|i| EmojiLevel::ALL.get(i)) {
                    Some(level) => options.emoji_level = *level,
                    None => return Ok(None),
                }
            }
        }

        Ok(finish_options(options, settings))
    }

    async fn select_one(
        &self,
        title: &str,
        instructions: &str,
        choices: &[Choice],
    ) -> Result<Option<usize>> {
        if !self.interactive {
            warn!(title, "Not a terminal, selection skipped");
            return Ok(None);
        }
        eprintln!("{}", instructions);
        let title = title.to_string();
        let items: Vec<String> = choices.iter().map(choice_line).collect();
        self.prompt(move |theme| {
            Select::with_theme(theme)
                .with_prompt(title)
                .items(&items)
                .default(0)
                .interact_opt()
        })
        .await
    }

    async fn select_many(
        &self,
        title: &str,
        instructions: &str,
        choices: &[Choice],
    ) -> Result<Option<Vec<usize>>> {
        if !self.interactive {
            warn!(title, "Not a terminal, selection skipped");
            return Ok(None);
        }
        eprintln!("{}", instructions);
        let title = title.to_string();
        let items: Vec<String> = choices.iter().map(choice_line).collect();
        self.prompt(move |theme| {
            MultiSelect::with_theme(theme)
                .with_prompt(title)
                .items(&items)
                .interact_opt()
        })
        .await
    }

    fn notify(&self, notice: Notice) {
        eprintln!("{}", render_notice(&notice));
    }
}

/// Status line on stderr, redrawn in place on a terminal.
pub struct StderrStatus {
    redraw: bool,
    last: Mutex<String>,
}

impl StderrStatus {
    pub fn new() -> Self {
        Self {
            redraw: std::io::stderr().is_terminal(),
            last: Mutex::new(String::new()),
        }
    }

    /// The most recent status text.
    pub fn last(&self) -> String {
        self.last.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// End the status line so later output starts on a fresh line.
    pub fn finish(&self) {
        if self.redraw && !self.last().is_empty() {
            eprintln!();
        }
    }
}

impl Default for StderrStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StderrStatus {
    fn set_status(&self, text: &str) {
        if let Ok(mut last) = self.last.lock() {
            *last = text.to_string();
        }
        if self.redraw {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r\x1b[2K{}", text);
            let _ = err.flush();
        } else {
            tracing::debug!(status = text, "Status");
        }
    }
}
