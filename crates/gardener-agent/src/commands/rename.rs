//! Rename the active document to a name suggested from its contents.

use async_trait::async_trait;
use tracing::info;

use gardener_core::{
    join_vault_path, note_file_name, CallOptions, Choice, CompletionOutcome, FilenamesResult,
    Notice, NoticeLevel, Result,
};

use super::{CommandContext, CommandOutcome, GardenerCommand};
use crate::composer::TaskKind;

/// `dg-rename-file-from-contents`: suggest names and rename to the chosen one.
pub struct RenameFileFromContents;

#[async_trait]
impl GardenerCommand for RenameFileFromContents {
    fn id(&self) -> &'static str {
        "dg-rename-file-from-contents"
    }

    fn name(&self) -> &'static str {
        "Rename file from contents"
    }

    fn requires_active_document(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let doc = ctx.require_active().await?;
        let current = doc.basename().to_string();
        ctx.notify(Notice::toast(
            NoticeLevel::Info,
            "Finding new names",
            format!("Finding a new name for {}", current),
        ));

        let content = ctx.store.read(&doc.path).await?;
        let options = CallOptions::from_settings(&ctx.settings).normalized(&ctx.settings);
        let prompt = ctx.compose(TaskKind::Rename, &options, &content).await;

        let outcome = {
            let _timer = ctx.status.start_timer("Rename file from contents");
            ctx.client
                .request_json::<FilenamesResult>(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let candidates = match outcome {
            CompletionOutcome::Success(result) => result.filenames,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        if candidates.is_empty() {
            ctx.notify(Notice::dialog(
                NoticeLevel::Info,
                "No file names generated",
                format!("No new names were generated for {}", current),
            ));
            return Ok(CommandOutcome::NoChange);
        }

        let choices: Vec<Choice> = candidates
            .iter()
            .map(|c| Choice {
                label: c.file_name.clone(),
                description: format!("Select this to rename the file to {}", note_file_name(&c.file_name)),
                reason: c.reason.clone(),
                score: c.score,
            })
            .collect();

        let selected = ctx
            .surface
            .select_one(
                "Select a new file name",
                "I've generated a few new file names for you to choose from. Select the one you like the most, or cancel to keep the current name.",
                &choices,
            )
            .await?;

        let Some(choice) = selected.and_then(|i| candidates.get(i)) else {
            ctx.notify(Notice::toast(
                NoticeLevel::Info,
                "Digital Gardener",
                format!("{} was not renamed", current),
            ));
            return Ok(CommandOutcome::Cancelled);
        };

        let new_path = join_vault_path(doc.folder(), &note_file_name(&choice.file_name));
        if new_path == doc.path {
            ctx.notify(Notice::toast(
                NoticeLevel::Info,
                "Digital Gardener",
                format!("{} already has that name", current),
            ));
            return Ok(CommandOutcome::NoChange);
        }

        let renamed = ctx.store.rename(&doc.path, &new_path).await?;
        info!(from = %doc.path, to = %renamed.path, "Renamed document from contents");
        ctx.notify(Notice::toast(
            NoticeLevel::Success,
            "File Renamed",
            format!("{} Renamed to {}", current, renamed.basename()),
        ));
        Ok(CommandOutcome::Renamed {
            from: doc,
            to: renamed,
        })
    }
}
