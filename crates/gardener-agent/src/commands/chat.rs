//! Free-form chat commands: answer a prompt, or answer the text the user
//! selected in the active document.

use async_trait::async_trait;
use std::ops::RangeInclusive;
use tracing::info;

use gardener_core::{
    join_vault_path, CallOptions, CompletionOutcome, Notice, NoticeLevel, OptionRequest, Result,
};

use super::{CommandContext, CommandOutcome, GardenerCommand};
use crate::composer::TaskKind;

/// `dg-generate-text-from-prompt`: free-form answer, appended to the active
/// document or written to a new `gpt-<millis>.md` note.
pub struct GenerateTextFromPrompt;

#[async_trait]
impl GardenerCommand for GenerateTextFromPrompt {
    fn id(&self) -> &'static str {
        "dg-generate-text-from-prompt"
    }

    fn name(&self) -> &'static str {
        "Generate text from prompt"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let request = OptionRequest {
            title: self.name().to_string(),
            offer_context_toggles: true,
        };
        let options = match ctx.surface.collect_options(&ctx.settings, &request).await? {
            Some(options) if !options.user_query.trim().is_empty() => {
                options.normalized(&ctx.settings)
            }
            _ => {
                ctx.notify(Notice::toast(
                    NoticeLevel::Info,
                    "Digital Gardener",
                    "No prompt given, nothing was generated",
                ));
                return Ok(CommandOutcome::Cancelled);
            }
        };

        let prompt = ctx
            .compose(TaskKind::Chat, &options, &options.user_query)
            .await;

        let outcome = {
            let _timer = ctx.status.start_timer("Awaiting OpenAI response");
            ctx.client
                .request_chat(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let text = match outcome {
            CompletionOutcome::Success(text) => text,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        let text = text.trim();
        if text.is_empty() {
            let message = "No text generated, please try again";
            ctx.notify(Notice::toast(NoticeLevel::Error, "Error", message));
            return Ok(CommandOutcome::Failed(message.to_string()));
        }

        if let Some(doc) = ctx.store.active_document().await {
            ctx.store.append(&doc.path, &format!("\n{}\n\n", text)).await?;
            info!(path = %doc.path, chars = text.len(), "Appended generated text");
            ctx.notify(Notice::toast(
                NoticeLevel::Success,
                "Text generated",
                format!("Added the response to {}", doc.name()),
            ));
            return Ok(CommandOutcome::Updated(doc));
        }

        let file_name = format!("gpt-{}.md", chrono::Utc::now().timestamp_millis());
        let path = join_vault_path(ctx.settings.root_folder(), &file_name);
        let doc = ctx.store.create(&path, text).await?;
        info!(path = %doc.path, chars = text.len(), "Wrote generated text to new file");
        ctx.notify(Notice::toast(NoticeLevel::Success, "New file", doc.name()));
        ctx.store.set_active_document(Some(doc.clone())).await?;
        Ok(CommandOutcome::Created(doc))
    }
}

/// Lines `start..=end` (1-based) of `content`, clamped to the document.
/// `None` when the range is empty or starts past the last line.
pub fn line_range(content: &str, range: RangeInclusive<usize>) -> Option<String> {
    let (start, end) = (*range.start(), *range.end());
    if start == 0 || end < start {
        return None;
    }
    let lines: Vec<&str> = content.lines().skip(start - 1).take(end - start + 1).collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// `dg-generate-text-from-selection`: sends the selected text as the chat
/// message and appends the answer to the active document.
pub struct GenerateTextFromSelection;

#[async_trait]
impl GardenerCommand for GenerateTextFromSelection {
    fn id(&self) -> &'static str {
        "dg-generate-text-from-selection"
    }

    fn name(&self) -> &'static str {
        "Generate text from text selection"
    }

    fn requires_active_document(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let doc = ctx.require_active().await?;
        let selection = match ctx.selection.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                ctx.notify(Notice::toast(
                    NoticeLevel::Info,
                    "Digital Gardener",
                    "Nothing is selected, nothing was generated",
                ));
                return Ok(CommandOutcome::Cancelled);
            }
        };

        let options = CallOptions::from_settings(&ctx.settings)
            .with_query(selection.as_str())
            .normalized(&ctx.settings);
        let prompt = ctx.compose(TaskKind::Chat, &options, &selection).await;

        let outcome = {
            let _timer = ctx.status.start_timer("Awaiting OpenAI response");
            ctx.client
                .request_chat(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let text = match outcome {
            CompletionOutcome::Success(text) => text,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        let text = text.trim();
        if text.is_empty() {
            let message = "No text generated, please try again";
            ctx.notify(Notice::toast(NoticeLevel::Error, "Error", message));
            return Ok(CommandOutcome::Failed(message.to_string()));
        }

        ctx.store.append(&doc.path, &format!("\n{}\n\n", text)).await?;
        info!(path = %doc.path, selected = selection.len(), chars = text.len(), "Appended answer to selection");
        ctx.notify(Notice::toast(
            NoticeLevel::Success,
            "Text generated",
            format!("Response of {} characters added to {}", text.chars().count(), doc.name()),
        ));
        Ok(CommandOutcome::Updated(doc))
    }
}
