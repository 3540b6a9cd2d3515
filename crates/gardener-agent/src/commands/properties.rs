//! Frontmatter suggestions for the active document.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::info;

use gardener_core::{
    CallOptions, Choice, CompletionOutcome, Notice, NoticeLevel, PropertiesResult, Result,
};

use super::{CommandContext, CommandOutcome, GardenerCommand};
use crate::composer::TaskKind;

/// `dg-generate-file-properties`: propose frontmatter for the active
/// document and merge the ones the user picks.
pub struct GenerateFileProperties;

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl GardenerCommand for GenerateFileProperties {
    fn id(&self) -> &'static str {
        "dg-generate-file-properties"
    }

    fn name(&self) -> &'static str {
        "Generate properties for current file"
    }

    fn requires_active_document(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let doc = ctx.require_active().await?;
        ctx.notify(Notice::toast(
            NoticeLevel::Info,
            "Digital Gardener",
            format!("Checking {} for new properties", doc.name()),
        ));

        let content = ctx.store.read(&doc.path).await?;
        let options = CallOptions::from_settings(&ctx.settings).normalized(&ctx.settings);
        let prompt = ctx.compose(TaskKind::Properties, &options, &content).await;

        let outcome = {
            let _timer = ctx.status.start_timer("Generating properties");
            ctx.client
                .request_json::<PropertiesResult>(&prompt, &options.request_options(), &ctx.cancel)
                .await
        };
        let candidates = match outcome {
            CompletionOutcome::Success(result) => result.frontmatter,
            CompletionOutcome::Failed(failure) => return Ok(ctx.report_failure(failure)),
        };

        if candidates.is_empty() {
            ctx.notify(Notice::dialog(
                NoticeLevel::Info,
                "No properties generated",
                format!("No properties were generated for {}", doc.name()),
            ));
            return Ok(CommandOutcome::NoChange);
        }

        let choices: Vec<Choice> = candidates
            .iter()
            .map(|c| Choice {
                label: format!("{}: {}", c.key, display_value(&c.value)),
                description: format!("Add the {} property to {}", c.key, doc.name()),
                reason: c.reason.clone(),
                score: c.score,
            })
            .collect();

        let selected = ctx
            .surface
            .select_many(
                "Properties generated",
                &format!(
                    "Properties were generated for {}, select the ones you want to keep",
                    doc.name()
                ),
                &choices,
            )
            .await?;

        let selected: Vec<usize> = selected.unwrap_or_default();
        let mut properties = serde_json::Map::new();
        for candidate in selected.iter().filter_map(|i| candidates.get(*i)) {
            properties.insert(candidate.key.clone(), candidate.value.clone());
        }

        if properties.is_empty() {
            ctx.notify(Notice::toast(
                NoticeLevel::Info,
                "Digital Gardener",
                format!("No properties were added to {}", doc.name()),
            ));
            return Ok(CommandOutcome::NoChange);
        }

        ctx.store.merge_frontmatter(&doc.path, &properties).await?;
        info!(path = %doc.path, keys = properties.len(), "Merged generated properties");
        ctx.notify(Notice::toast(
            NoticeLevel::Success,
            "Properties updated",
            format!("Added {} properties to {}", properties.len(), doc.name()),
        ));
        Ok(CommandOutcome::Updated(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use gardener_inference::mock::MockChatBackend;
    use serde_json::json;

    const TRIP: &str = "---\nstatus: draft\n---\n# Trip\nTemples in Kyoto";

    fn candidates() -> serde_json::Value {
        json!({"frontmatter": [
            {"key": "country", "value": "Japan", "reason": "mentions Kyoto", "score": 0.9},
            {"key": "tags", "value": ["travel", "japan"], "reason": "topic", "score": 0.8},
            {"key": "city", "value": "Kyoto", "reason": "mentions Kyoto", "score": 0.7}
        ]})
    }

    #[tokio::test]
    async fn test_merges_only_selected_properties() {
        let fx = Fixture::new(
            &[("Trip.md", TRIP)],
            MockChatBackend::new().with_json(&candidates()),
            ScriptedSurface::default().with_multi_selection(Some(vec![0, 1])),
        );
        fx.activate("Trip.md").await;

        let outcome = GenerateFileProperties.run(&fx.ctx).await.unwrap();

        assert!(outcome.mutated());
        let meta = gardener_core::DocumentStore::metadata(fx.vault.as_ref(), "Trip.md")
            .await
            .unwrap();
        assert_eq!(meta.frontmatter["status"], json!("draft"));
        assert_eq!(meta.frontmatter["country"], json!("Japan"));
        assert_eq!(meta.frontmatter["tags"], json!(["travel", "japan"]));
        assert!(meta.frontmatter.get("city").is_none());
        assert!(fx.read("Trip.md").ends_with("---\n# Trip\nTemples in Kyoto"));

        let offered = fx.surface.offered.lock().unwrap();
        assert_eq!(offered[0][0].label, "country: Japan");
        assert_eq!(offered[0][1].label, "tags: [\"travel\",\"japan\"]");
    }

    #[tokio::test]
    async fn test_no_selection_leaves_document_untouched() {
        for selection in [None, Some(vec![])] {
            let fx = Fixture::new(
                &[("Trip.md", TRIP)],
                MockChatBackend::new().with_json(&candidates()),
                ScriptedSurface::default().with_multi_selection(selection),
            );
            fx.activate("Trip.md").await;

            let outcome = GenerateFileProperties.run(&fx.ctx).await.unwrap();

            assert_eq!(outcome, CommandOutcome::NoChange);
            assert_eq!(fx.read("Trip.md"), TRIP);
        }
    }

    #[tokio::test]
    async fn test_repeated_runs_without_selection_keep_file_identical() {
        let fx = Fixture::new(
            &[("Trip.md", TRIP)],
            MockChatBackend::new().with_json(&candidates()),
            ScriptedSurface::default()
                .with_multi_selection(None)
                .with_multi_selection(None),
        );
        fx.activate("Trip.md").await;
        let path = fx.dir.path().join("Trip.md");
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        for _ in 0..2 {
            let outcome = GenerateFileProperties.run(&fx.ctx).await.unwrap();
            assert_eq!(outcome, CommandOutcome::NoChange);
        }

        assert_eq!(std::fs::read(&path).unwrap(), TRIP.as_bytes());
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
        assert_eq!(fx.backend.call_count(), 2);
        assert_eq!(fx.surface.offered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_candidates_show_dialog() {
        let fx = Fixture::new(
            &[("Trip.md", TRIP)],
            MockChatBackend::new().with_json(&json!({"frontmatter": []})),
            ScriptedSurface::default(),
        );
        fx.activate("Trip.md").await;

        let outcome = GenerateFileProperties.run(&fx.ctx).await.unwrap();

        assert_eq!(outcome, CommandOutcome::NoChange);
        let notices = fx.surface.notices();
        assert_eq!(notices.last().unwrap().title, "No properties generated");
        assert!(fx.surface.offered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_does_not_mutate() {
        let fx = Fixture::new(
            &[("Trip.md", TRIP)],
            MockChatBackend::new().with_network_error("offline"),
            ScriptedSurface::default(),
        );
        fx.activate("Trip.md").await;

        let outcome = GenerateFileProperties.run(&fx.ctx).await.unwrap();

        assert!(matches!(outcome, CommandOutcome::Failed(_)));
        assert_eq!(fx.read("Trip.md"), TRIP);
        assert_eq!(fx.surface.errors().len(), 1);
        assert!(fx.surface.errors()[0].message.starts_with("My apologies"));
    }

    #[tokio::test]
    async fn test_uses_document_content_and_settings() {
        let fx = Fixture::new(
            &[("Trip.md", TRIP)],
            MockChatBackend::new().with_json(&json!({"frontmatter": []})),
            ScriptedSurface::default(),
        );
        fx.activate("Trip.md").await;

        GenerateFileProperties.run(&fx.ctx).await.unwrap();

        let request = fx.backend.last_request().unwrap();
        assert_eq!(request.messages[1].content, TRIP);
        assert_eq!(request.model, "gpt-35-turbo");
        assert_eq!(request.max_tokens, 10_000);
        assert!(request.messages[0].content.contains("\"status\""));
    }
}
