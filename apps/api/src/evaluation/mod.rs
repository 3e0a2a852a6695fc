// Evaluation pipeline: QA extraction, expert solutions, evaluation strategies,
// scoring and export. Every model call goes through llm_client::ModelGateway.
//
// Stage contract: public stage functions return a value or an empty collection.
// Failures are reported to the Notifier at the stage boundary and never cross
// into the session controller as errors.

pub mod evaluator;
pub mod expert;
pub mod export;
pub mod extractor;
pub mod models;
pub mod prompts;
pub mod scoring;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::llm_client::{self, LlmError};
use crate::notices::Notifier;

/// Temperature for every pipeline call: low variance, near-deterministic output.
pub const PIPELINE_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("failed to serialize prompt input: {0}")]
    PromptInput(serde_json::Error),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model output is not valid JSON for the expected schema: {source}")]
    Malformed {
        source: serde_json::Error,
        raw: String,
    },

    #[error("model returned no records for {expected} question(s)")]
    NoRecords { expected: usize },
}

/// Parses raw model output into `T`, keeping the raw text on failure.
pub(crate) fn parse_model_output<T: DeserializeOwned>(raw: &str) -> Result<T, PipelineError> {
    if raw.trim().is_empty() {
        return Err(PipelineError::EmptyResponse);
    }
    llm_client::parse_json(raw).map_err(|source| PipelineError::Malformed {
        source,
        raw: raw.to_string(),
    })
}

/// Routes a stage failure to the notifier, including raw output when there is one.
pub(crate) fn report_failure(notifier: &Notifier, context: &str, err: &PipelineError) {
    notifier.error(format!("{context}: {err}"));
    if let PipelineError::Malformed { raw, .. } = err {
        notifier.error(format!("Raw model output for debugging:\n{raw}"));
    }
}
