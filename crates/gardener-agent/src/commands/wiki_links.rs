//! WikiLinks from the active document to related notes in the vault.

use async_trait::async_trait;
use tracing::{debug, info};

use gardener_core::{
    strip_markdown_extension, CallOptions, CompletionOutcome, DocumentRef, Notice, NoticeLevel,
    Result, WikiLinksResult,
};

use super::{CommandContext, CommandOutcome, GardenerCommand};
use crate::composer::TaskKind;

/// True when a suggested link target is the document itself: the same path
/// or the same file stem, with or without `.md`.
pub fn refers_to(doc: &DocumentRef, file_name: &str) -> bool {
    let candidate = file_name.trim().trim_start_matches("./").trim_start_matches('/');
    if candidate.is_empty() {
        return false;
    }
    if strip_markdown_extension(candidate) == strip_markdown_extension(&doc.path) {
        return true;
    }
    let stem = candidate.rsplit('/').next().unwrap_or(candidate);
    strip_markdown_extension(stem) == doc.basename()
}

/// `dg-generate-wiki-links`: append links to related documents.
pub struct GenerateWikiLinks;

#[async_trait]
impl GardenerCommand for GenerateWikiLinks {
    fn id(&self) -> &'static str {
        "dg-generate-wiki-links"
    }

    fn name(&self) -> &'static str {
        "Append WikiLinks to current file"
    }

    fn requires_active_document(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let doc = ctx.require_active().await?;
        ctx.notify(Notice::toast(
            NoticeLevel::Info,
            "Digital Gardener",
            format!("Finding WikiLinks for {}", doc.name()),
        ));

        let content = ctx.store.read(&doc.path).await?;
        let options = CallOptions {
            include_filenames: true,
            ..CallOptions::from_settings(&ctx.settings)
        }
        .normalized(&ctx.settings);
        let prompt = ctx.compose(TaskKind::WikiLinks, &options, &content).await;

        let outcome = {
            let _timer = ctx.status.start_timer("Finding WikiLinks");
            ctx.client
                .request_json::<WikiLinksResult>(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let links = match outcome {
            CompletionOutcome::Success(result) => result.wiki_links,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        let suggested = links.len();
        let lines: Vec<String> = links
            .iter()
            .filter(|link| !refers_to(&doc, &link.file_name))
            .map(|link| link.to_markdown())
            .collect();
        debug!(
            candidate_count = suggested,
            kept = lines.len(),
            "Filtered wiki-link suggestions"
        );

        if lines.is_empty() {
            ctx.notify(Notice::toast(
                NoticeLevel::Info,
                "Digital Gardener",
                format!("No new WikiLinks were found for {}", doc.name()),
            ));
            return Ok(CommandOutcome::NoChange);
        }

        ctx.store.append(&doc.path, &lines.join("\n")).await?;
        info!(path = %doc.path, links = lines.len(), "Appended wiki-links");
        ctx.notify(Notice::toast(
            NoticeLevel::Success,
            "WikiLinks added",
            format!("Added {} WikiLinks to {}", lines.len(), doc.name()),
        ));
        Ok(CommandOutcome::Updated(doc))
    }
}
