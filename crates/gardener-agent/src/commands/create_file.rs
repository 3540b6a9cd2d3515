//! New notes generated from a free-text query.

use async_trait::async_trait;
use tracing::info;

use gardener_core::{
    join_vault_path, note_file_name, CompletionOutcome, NewFileResult, Notice, NoticeLevel,
    OptionRequest, Result, Settings,
};
use gardener_vault::frontmatter;

use super::{CommandContext, CommandOutcome, GardenerCommand};
use crate::composer::TaskKind;

/// Vault path for a generated note: `<root>/notes/<name>.md`.
pub fn new_file_path(settings: &Settings, filename: &str) -> String {
    join_vault_path(&settings.notes_folder(), &note_file_name(filename))
}

/// `dg-generate-file-from-query`: create a note from a free-text request.
pub struct GenerateFileFromQuery;

#[async_trait]
impl GardenerCommand for GenerateFileFromQuery {
    fn id(&self) -> &'static str {
        "dg-generate-file-from-query"
    }

    fn name(&self) -> &'static str {
        "Generate New File From Query"
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
                    "No query given, no file was created",
                ));
                return Ok(CommandOutcome::Cancelled);
            }
        };

        let prompt = ctx
            .compose(TaskKind::NewFile, &options, &options.user_query)
            .await;

        let outcome = {
            let _timer = ctx.status.start_timer("Generating new file");
            ctx.client
                .request_json::<NewFileResult>(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let result = match outcome {
            CompletionOutcome::Success(result) => result,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        let path = new_file_path(&ctx.settings, &result.filename);
        let content = frontmatter::merge(&result.content, &result.frontmatter)?;
        let doc = ctx.store.create(&path, &content).await?;
        info!(path = %doc.path, "Generated new file");

        ctx.notify(Notice::toast(NoticeLevel::Success, "New file", doc.name()));
        ctx.store.set_active_document(Some(doc.clone())).await?;
        Ok(CommandOutcome::Created(doc))
    }
}
