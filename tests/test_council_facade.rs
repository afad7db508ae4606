//! End-to-end facade scenarios (§8): alias resolution and the full
//! drafts -> critique -> synthesis pipeline driven through `Council::run`
//! rather than the orchestrator directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use council::Council;
use council_config::{CouncilConfig, ModeConfig, RoleConfig};
use council_core::error::CouncilError;
use council_providers::{
    DoctorReport, FinishReason, GenerateRequest, GenerateResponse, ProviderAdapter,
    ProviderCapabilities, ProviderRegistry, Usage,
};

struct StaticAdapter {
    name: String,
    text: String,
}

#[async_trait]
impl ProviderAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: false,
            tool_use: false,
            structured_output: true,
            multimodal: false,
            max_output_tokens: 4096,
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError> {
        let text = if request.structured_output.is_some() {
            json!({"answer": "synthesized"}).to_string()
        } else {
            self.text.clone()
        };
        Ok(GenerateResponse {
            text: Some(text.clone()),
            raw_content: text,
            tool_calls: Vec::new(),
            usage: Usage {
                input_tokens: 20,
                output_tokens: 10,
                total_tokens: 30,
            },
            model: format!("{}-model", self.name),
            finish_reason: FinishReason::Stop,
            raw: serde_json::Value::Null,
        })
    }

    async fn doctor(&self) -> DoctorReport {
        DoctorReport::ok(format!("{} reachable", self.name), 5)
    }
}

fn write_schema(dir: &std::path::Path, role: &str) {
    std::fs::write(
        dir.join(format!("{role}.json")),
        json!({
            "type": "object",
            "properties": {"answer": {"type": "string"}},
            "required": ["answer"],
            "additionalProperties": false
        })
        .to_string(),
    )
    .unwrap();
}

fn drafter_config() -> RoleConfig {
    let mut drafter = RoleConfig {
        system_prompt: "Draft a solution.".to_string(),
        ..RoleConfig::default()
    };
    drafter.providers.preferred = vec!["alpha".to_string(), "bravo".to_string()];
    drafter.modes.insert(
        "impl".to_string(),
        ModeConfig {
            system_prompt_suffix: "Favor working code over prose.".to_string(),
            temperature: None,
        },
    );
    drafter
}

#[tokio::test]
async fn happy_path_end_to_end_through_the_facade() {
    let store_dir = tempfile::tempdir().unwrap();
    let schema_dir = tempfile::tempdir().unwrap();
    write_schema(schema_dir.path(), "drafter");

    let mut config = CouncilConfig::default();
    config.store.root = Some(store_dir.path().display().to_string());
    config.schema_dir = Some(schema_dir.path().display().to_string());
    config.roles.insert("drafter".to_string(), drafter_config());

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(StaticAdapter {
        name: "alpha".to_string(),
        text: "Alpha's draft.".to_string(),
    }));
    registry.register(Arc::new(StaticAdapter {
        name: "bravo".to_string(),
        text: "Bravo's draft.".to_string(),
    }));

    let council = Council::new(config, registry).unwrap();
    let result = council
        .run("Evaluate the proposal.", "drafter", Some("impl"), None)
        .await;

    assert!(result.success);
    assert_eq!(result.resolved_role, "drafter");
    assert_eq!(result.mode.as_deref(), Some("impl"));
    assert_eq!(result.drafts.len(), 2);
    assert!(result.critique.is_some());
    assert_eq!(result.synthesis.unwrap()["answer"], json!("synthesized"));
    assert!(!result.artifact_ids.is_empty());
    assert!(result.estimated_cost_usd >= 0.0);
}

#[tokio::test]
async fn deprecated_alias_resolves_with_implied_mode() {
    let store_dir = tempfile::tempdir().unwrap();
    let schema_dir = tempfile::tempdir().unwrap();
    write_schema(schema_dir.path(), "drafter");

    let mut config = CouncilConfig::default();
    config.store.root = Some(store_dir.path().display().to_string());
    config.schema_dir = Some(schema_dir.path().display().to_string());
    config.roles.insert("drafter".to_string(), drafter_config());

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(StaticAdapter {
        name: "alpha".to_string(),
        text: "Alpha's draft.".to_string(),
    }));
    registry.register(Arc::new(StaticAdapter {
        name: "bravo".to_string(),
        text: "Bravo's draft.".to_string(),
    }));

    let council = Council::new(config, registry).unwrap();
    let result = council
        .run("Evaluate the proposal.", "implementer", None, None)
        .await;

    assert!(result.success);
    assert_eq!(result.resolved_role, "drafter");
    assert_eq!(result.mode.as_deref(), Some("impl"));
}

#[tokio::test]
async fn unknown_role_fails_without_touching_any_provider() {
    let store_dir = tempfile::tempdir().unwrap();
    let schema_dir = tempfile::tempdir().unwrap();

    let mut config = CouncilConfig::default();
    config.store.root = Some(store_dir.path().display().to_string());
    config.schema_dir = Some(schema_dir.path().display().to_string());

    let registry = ProviderRegistry::new();
    let council = Council::new(config, registry).unwrap();
    let result = council.run("task", "not-a-role", None, None).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.run_id.is_empty());
}

#[tokio::test]
async fn doctor_probes_every_registered_provider() {
    let store_dir = tempfile::tempdir().unwrap();
    let schema_dir = tempfile::tempdir().unwrap();

    let mut config = CouncilConfig::default();
    config.store.root = Some(store_dir.path().display().to_string());
    config.schema_dir = Some(schema_dir.path().display().to_string());

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(StaticAdapter {
        name: "alpha".to_string(),
        text: "unused".to_string(),
    }));

    let council = Council::new(config, registry).unwrap();
    let reports: HashMap<String, DoctorReport> = council.doctor().await;

    assert_eq!(reports.len(), 1);
    assert!(reports["alpha"].ok);
}
