//! Evaluator: two strategies over the same QA pairs.
//!
//! - `RubricEvaluator`: each answer against a proficiency-level rubric and a
//!   free-text case label. Produces `RubricEvaluation` (no numeric scores).
//! - `ComparativeEvaluator`: each answer against the whole expert solution.
//!   Produces `EvaluationRecord` with scores from the Score Mapper.
//!
//! Both require a JSON array back. An empty array is only valid for zero
//! questions, and zero questions never reach the model.

use serde::de::DeserializeOwned;
use tracing::info;

use crate::evaluation::models::{
    ComparativeJudgement, EvaluationRecord, ExpertStep, ProficiencyLevel, QAPair,
    RubricEvaluation,
};
use crate::evaluation::prompts::{
    COMPARATIVE_EVALUATION_PROMPT_TEMPLATE, COMPARATIVE_EVALUATION_SYSTEM,
    RUBRIC_EVALUATION_PROMPT_TEMPLATE, RUBRIC_EVALUATION_SYSTEM,
};
use crate::evaluation::{
    parse_model_output, report_failure, PipelineError, PIPELINE_TEMPERATURE,
};
use crate::llm_client::prompts::{JSON_ARRAY_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{ChatMessage, ModelGateway};
use crate::notices::Notifier;

/// Which strategy a session evaluates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Rubric,
    Comparative,
}

// ────────────────────────────────────────────────────────────────────────────
// Rubric mode
// ────────────────────────────────────────────────────────────────────────────

pub struct RubricEvaluator<'a> {
    pub case_label: &'a str,
    pub level: ProficiencyLevel,
}

impl RubricEvaluator<'_> {
    pub async fn evaluate(
        &self,
        qa_pairs: &[QAPair],
        gateway: &ModelGateway,
        notifier: &Notifier,
    ) -> Vec<RubricEvaluation> {
        if qa_pairs.is_empty() {
            notifier.warning("There are no Q&A pairs to evaluate.");
            return Vec::new();
        }

        let result = async {
            let prompt = RUBRIC_EVALUATION_PROMPT_TEMPLATE
                .replace("{level}", self.level.as_str())
                .replace("{case_study}", self.case_label)
                .replace("{expectations}", self.level.expectations())
                .replace("{qa_pairs}", &to_pretty_json(qa_pairs)?);
            let messages = evaluation_messages(RUBRIC_EVALUATION_SYSTEM, prompt);
            request_records::<RubricEvaluation>(&messages, qa_pairs.len(), gateway, notifier).await
        }
        .await;

        match result {
            Ok(records) => {
                info!(
                    "Rubric evaluation produced {} records at level {}",
                    records.len(),
                    self.level
                );
                records
            }
            Err(e) => {
                report_failure(notifier, "Failed to evaluate answers", &e);
                Vec::new()
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Comparative mode
// ────────────────────────────────────────────────────────────────────────────

pub struct ComparativeEvaluator<'a> {
    pub expert_solution: &'a [ExpertStep],
    /// Optional leniency calibration appended to the prompt.
    pub level: Option<ProficiencyLevel>,
}

impl ComparativeEvaluator<'_> {
    pub async fn evaluate(
        &self,
        qa_pairs: &[QAPair],
        gateway: &ModelGateway,
        notifier: &Notifier,
    ) -> Vec<EvaluationRecord> {
        if qa_pairs.is_empty() {
            notifier.warning("There are no Q&A pairs to evaluate.");
            return Vec::new();
        }
        if self.expert_solution.is_empty() {
            notifier.warning("No expert solution available; cannot evaluate candidate answers.");
            return Vec::new();
        }

        let result = async {
            let calibration = match self.level {
                Some(level) => format!(
                    "\nThe candidate is applying for a {level} position. Calibrate accordingly: {}\n",
                    level.expectations()
                ),
                None => String::new(),
            };
            let prompt = COMPARATIVE_EVALUATION_PROMPT_TEMPLATE
                .replace("{calibration}", &calibration)
                .replace("{expert_solution}", &to_pretty_json(self.expert_solution)?)
                .replace("{qa_pairs}", &to_pretty_json(qa_pairs)?);
            let messages = evaluation_messages(COMPARATIVE_EVALUATION_SYSTEM, prompt);
            request_records::<ComparativeJudgement>(&messages, qa_pairs.len(), gateway, notifier)
                .await
        }
        .await;

        match result {
            Ok(judgements) => {
                info!("Comparative evaluation produced {} records", judgements.len());
                judgements.into_iter().map(EvaluationRecord::from).collect()
            }
            Err(e) => {
                report_failure(notifier, "Failed to evaluate candidate answers", &e);
                Vec::new()
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

fn evaluation_messages(system: &str, prompt: String) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{system} {JSON_ONLY_SYSTEM}")),
        ChatMessage::user(format!("{prompt}\n\n{JSON_ARRAY_INSTRUCTION}")),
    ]
}

/// Calls the model and parses a non-empty JSON array of `T`.
async fn request_records<T: DeserializeOwned>(
    messages: &[ChatMessage],
    expected: usize,
    gateway: &ModelGateway,
    notifier: &Notifier,
) -> Result<Vec<T>, PipelineError> {
    let raw = gateway
        .complete(messages, PIPELINE_TEMPERATURE, notifier)
        .await?;
    let records: Vec<T> = parse_model_output(&raw)?;
    if records.is_empty() {
        return Err(PipelineError::NoRecords { expected });
    }
    Ok(records)
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value).map_err(PipelineError::PromptInput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{scripted_gateway, ScriptedBackend};
    use crate::notices::{LogLevel, NoticeLevel};

    fn qa(question: &str, answer: &str) -> QAPair {
        QAPair {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    fn expert() -> Vec<ExpertStep> {
        vec![ExpertStep {
            process_task: "Define RTO and RPO".to_string(),
            key_consideration: "Business impact analysis".to_string(),
        }]
    }

    const COMPARATIVE_REPLY: &str = r#"[
        {
            "question": "¿Qué es DR?",
            "expert_answer": "Define RTO/RPO considering business impact",
            "candidate_answer": "Es recuperación ante desastres",
            "approach_evaluation": "Low",
            "key_considerations_evaluation": "Partially correct"
        }
    ]"#;

    #[tokio::test]
    async fn test_comparative_scores_records() {
        let backend = ScriptedBackend::replying(&[COMPARATIVE_REPLY]);
        let expert = expert();
        let evaluator = ComparativeEvaluator {
            expert_solution: &expert,
            level: None,
        };

        let records = evaluator
            .evaluate(
                &[qa("¿Qué es DR?", "Es recuperación ante desastres")],
                &scripted_gateway(&backend),
                &Notifier::default(),
            )
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].approach_score, 33);
        assert_eq!(records[0].key_considerations_score, 66);
        assert_eq!(records[0].candidate_answer, "Es recuperación ante desastres");

        let prompt = backend.prompt(0);
        assert!(prompt.contains("Define RTO and RPO"));
        assert!(prompt.contains("JSON array"));
        assert!(!prompt.contains("{calibration}"));
    }

    #[tokio::test]
    async fn test_comparative_empty_qa_skips_model() {
        let backend = ScriptedBackend::replying(&[COMPARATIVE_REPLY]);
        let expert = expert();
        let notifier = Notifier::new(LogLevel::On);

        let records = ComparativeEvaluator {
            expert_solution: &expert,
            level: None,
        }
        .evaluate(&[], &scripted_gateway(&backend), &notifier)
        .await;

        assert!(records.is_empty());
        assert_eq!(backend.calls(), 0);
        let notices = notifier.drain();
        assert!(notices.iter().all(|n| n.level != NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_comparative_empty_model_array_is_logged_failure() {
        let backend = ScriptedBackend::replying(&["[]"]);
        let expert = expert();
        let notifier = Notifier::new(LogLevel::On);

        let records = ComparativeEvaluator {
            expert_solution: &expert,
            level: None,
        }
        .evaluate(&[qa("q", "a")], &scripted_gateway(&backend), &notifier)
        .await;

        assert!(records.is_empty());
        assert_eq!(backend.calls(), 1);
        let notices = notifier.drain();
        assert!(notices
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.message.contains("no records")));
    }

    #[tokio::test]
    async fn test_comparative_non_array_is_failure() {
        let backend = ScriptedBackend::replying(&[r#"{"question": "q"}"#]);
        let expert = expert();
        let records = ComparativeEvaluator {
            expert_solution: &expert,
            level: None,
        }
        .evaluate(&[qa("q", "a")], &scripted_gateway(&backend), &Notifier::default())
        .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_comparative_without_expert_solution_skips_model() {
        let backend = ScriptedBackend::replying(&[COMPARATIVE_REPLY]);
        let records = ComparativeEvaluator {
            expert_solution: &[],
            level: None,
        }
        .evaluate(&[qa("q", "a")], &scripted_gateway(&backend), &Notifier::default())
        .await;
        assert!(records.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_comparative_level_calibration_in_prompt() {
        let backend = ScriptedBackend::replying(&[COMPARATIVE_REPLY]);
        let expert = expert();
        ComparativeEvaluator {
            expert_solution: &expert,
            level: Some(ProficiencyLevel::L4),
        }
        .evaluate(&[qa("q", "a")], &scripted_gateway(&backend), &Notifier::default())
        .await;

        assert!(backend.prompt(0).contains("L4 (Expert)"));
    }

    #[tokio::test]
    async fn test_rubric_mode_returns_judgements() {
        let backend = ScriptedBackend::replying(&[r#"[
            {"question": "¿Qué es DR?", "answer": "Es recuperación ante desastres",
             "completeness": "Low", "accuracy": "Partially Correct",
             "feedback": "Correct definition but no strategy."}
        ]"#]);

        let records = RubricEvaluator {
            case_label: "Disaster Recovery",
            level: ProficiencyLevel::L4,
        }
        .evaluate(
            &[qa("¿Qué es DR?", "Es recuperación ante desastres")],
            &scripted_gateway(&backend),
            &Notifier::default(),
        )
        .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].completeness, "Low");
        assert_eq!(records[0].accuracy, "Partially Correct");

        let prompt = backend.prompt(0);
        assert!(prompt.contains("applying for a L4 position"));
        assert!(prompt.contains("The case study being discussed is: Disaster Recovery"));
    }

    #[test]
    fn test_unserializable_prompt_input_is_not_a_model_error() {
        // JSON object keys must be strings
        let mut input = std::collections::BTreeMap::new();
        input.insert((1u8, 2u8), "step");

        let err = to_pretty_json(&input).unwrap_err();
        assert!(matches!(err, PipelineError::PromptInput(_)));
        assert!(err.to_string().starts_with("failed to serialize prompt input"));
    }

    #[tokio::test]
    async fn test_rubric_malformed_output_is_empty() {
        let backend = ScriptedBackend::replying(&["Completeness: High"]);
        let records = RubricEvaluator {
            case_label: "x",
            level: ProficiencyLevel::L1,
        }
        .evaluate(&[qa("q", "a")], &scripted_gateway(&backend), &Notifier::default())
        .await;
        assert!(records.is_empty());
    }
}
