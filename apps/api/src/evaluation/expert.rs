//! Expert Solution Provider: pluggable, trait-based source of the reference
//! process breakdown for a case study.
//!
//! Default: `StaticExpertSolution` (zips the configured answers, no model call).
//! Alternative: `GeneratedExpertSolution` (asks the model from the case objective),
//! selected at start-up with `ENABLE_GENERATIVE_EXPERT_SOLUTION`.
//!
//! `AppState` holds an `Arc<dyn ExpertSolutionProvider>`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cases::CaseStudy;
use crate::evaluation::models::ExpertStep;
use crate::evaluation::prompts::{EXPERT_SOLUTION_PROMPT_TEMPLATE, EXPERT_SOLUTION_SYSTEM};
use crate::evaluation::{
    parse_model_output, report_failure, PipelineError, PIPELINE_TEMPERATURE,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{ChatMessage, ModelGateway};
use crate::notices::Notifier;

/// An empty result means "cannot proceed to evaluation"; implementations report
/// why through `notifier` before returning it.
#[async_trait]
pub trait ExpertSolutionProvider: Send + Sync {
    /// "static" | "generative", for transparency in status output.
    fn backend_name(&self) -> &'static str;

    async fn provide(&self, case: &CaseStudy, notifier: &Notifier) -> Vec<ExpertStep>;
}

/// Chooses the provider for the configured flag.
pub fn build_provider(generative: bool, gateway: ModelGateway) -> Arc<dyn ExpertSolutionProvider> {
    if generative {
        Arc::new(GeneratedExpertSolution::new(gateway))
    } else {
        Arc::new(StaticExpertSolution)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static path
// ────────────────────────────────────────────────────────────────────────────

pub struct StaticExpertSolution;

#[async_trait]
impl ExpertSolutionProvider for StaticExpertSolution {
    fn backend_name(&self) -> &'static str {
        "static"
    }

    async fn provide(&self, case: &CaseStudy, notifier: &Notifier) -> Vec<ExpertStep> {
        let steps = expert_solution_from_case(case);
        if steps.is_empty() {
            notifier.warning(format!(
                "Case study '{}' has no expert solution configured.",
                case.name
            ));
        }
        steps
    }
}

/// Pairs `process_answer[i]` with `key_considerations_answer[i]`.
/// Extra entries on the longer side are dropped.
pub fn expert_solution_from_case(case: &CaseStudy) -> Vec<ExpertStep> {
    case.process_answer
        .iter()
        .zip(&case.key_considerations_answer)
        .map(|(task, consideration)| ExpertStep {
            process_task: task.clone(),
            key_consideration: consideration.clone(),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Generative path
// ────────────────────────────────────────────────────────────────────────────

pub struct GeneratedExpertSolution {
    gateway: ModelGateway,
}

impl GeneratedExpertSolution {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    async fn generate(
        &self,
        case: &CaseStudy,
        notifier: &Notifier,
    ) -> Result<Vec<ExpertStep>, PipelineError> {
        let messages = vec![
            ChatMessage::system(format!("{EXPERT_SOLUTION_SYSTEM} {JSON_ONLY_SYSTEM}")),
            ChatMessage::user(EXPERT_SOLUTION_PROMPT_TEMPLATE.replace("{objective}", &case.objective)),
        ];
        let raw = self
            .gateway
            .complete(&messages, PIPELINE_TEMPERATURE, notifier)
            .await?;
        parse_model_output(&raw)
    }
}

#[async_trait]
impl ExpertSolutionProvider for GeneratedExpertSolution {
    fn backend_name(&self) -> &'static str {
        "generative"
    }

    async fn provide(&self, case: &CaseStudy, notifier: &Notifier) -> Vec<ExpertStep> {
        match self.generate(case, notifier).await {
            Ok(steps) if steps.is_empty() => {
                notifier.warning(format!(
                    "The model returned no expert steps for '{}'.",
                    case.name
                ));
                steps
            }
            Ok(steps) => {
                info!("Generated {} expert steps for case '{}'", steps.len(), case.key);
                steps
            }
            Err(e) => {
                report_failure(notifier, "Failed to generate expert solution", &e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{scripted_gateway, ScriptedBackend};
    use crate::notices::{LogLevel, NoticeLevel};

    fn case(process: &[&str], considerations: &[&str]) -> CaseStudy {
        CaseStudy {
            key: "dr".to_string(),
            name: "Disaster Recovery".to_string(),
            objective: "Design a DR strategy for a payments platform.".to_string(),
            process_answer: process.iter().map(|s| s.to_string()).collect(),
            key_considerations_answer: considerations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn step(task: &str, consideration: &str) -> ExpertStep {
        ExpertStep {
            process_task: task.to_string(),
            key_consideration: consideration.to_string(),
        }
    }

    #[test]
    fn test_static_pairs_positionally() {
        let steps = expert_solution_from_case(&case(&["a", "b"], &["x", "y"]));
        assert_eq!(steps, vec![step("a", "x"), step("b", "y")]);
    }

    #[test]
    fn test_static_truncates_to_shorter_side() {
        let steps = expert_solution_from_case(&case(&["a", "b", "c"], &["x"]));
        assert_eq!(steps, vec![step("a", "x")]);
    }

    #[tokio::test]
    async fn test_static_provider_warns_when_empty() {
        let notifier = Notifier::new(LogLevel::On);
        let steps = StaticExpertSolution.provide(&case(&[], &["x"]), &notifier).await;

        assert!(steps.is_empty());
        assert_eq!(notifier.drain()[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_generative_parses_model_steps() {
        let backend = ScriptedBackend::replying(&[r#"[
            {"process_task": "Define RTO and RPO", "key_consideration": "Business impact"},
            {"process_task": "Choose replication", "key_consideration": "Latency between regions"},
            {"process_task": "Run failover drills", "key_consideration": "Runbook accuracy"}
        ]"#]);
        let provider = GeneratedExpertSolution::new(scripted_gateway(&backend));

        let steps = provider.provide(&case(&[], &[]), &Notifier::default()).await;

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].process_task, "Define RTO and RPO");
        assert!(backend.prompt(0).contains("Design a DR strategy for a payments platform."));
    }

    #[tokio::test]
    async fn test_generative_parse_failure_is_empty() {
        let backend = ScriptedBackend::replying(&["Step 1: assess. Step 2: plan."]);
        let provider = GeneratedExpertSolution::new(scripted_gateway(&backend));
        let notifier = Notifier::new(LogLevel::On);

        let steps = provider.provide(&case(&[], &[]), &notifier).await;

        assert!(steps.is_empty());
        assert!(notifier
            .drain()
            .iter()
            .any(|n| n.message.starts_with("Failed to generate expert solution")));
    }

    #[tokio::test]
    async fn test_generative_rejects_wrong_schema() {
        let backend = ScriptedBackend::replying(&[r#"[{"step": "assess"}]"#]);
        let provider = GeneratedExpertSolution::new(scripted_gateway(&backend));
        let steps = provider.provide(&case(&[], &[]), &Notifier::default()).await;
        assert!(steps.is_empty());
    }

    #[test]
    fn test_build_provider_by_flag() {
        let backend = ScriptedBackend::replying(&[]);
        assert_eq!(
            build_provider(false, scripted_gateway(&backend)).backend_name(),
            "static"
        );
        assert_eq!(
            build_provider(true, scripted_gateway(&backend)).backend_name(),
            "generative"
        );
    }
}
