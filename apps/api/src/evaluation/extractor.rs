//! QA Extractor: normalized transcript → ordered question/answer pairs.

use tracing::info;

use crate::evaluation::models::QAPair;
use crate::evaluation::prompts::{QA_EXTRACTION_PROMPT_TEMPLATE, QA_EXTRACTION_SYSTEM};
use crate::evaluation::{
    parse_model_output, report_failure, PipelineError, PIPELINE_TEMPERATURE,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{ChatMessage, ModelGateway};
use crate::notices::Notifier;

/// Extracts QA pairs in interview order. Returns an empty list on any failure;
/// the failure has already been reported to `notifier`.
pub async fn extract_qa_pairs(
    normalized_transcript: &str,
    gateway: &ModelGateway,
    notifier: &Notifier,
) -> Vec<QAPair> {
    if normalized_transcript.trim().is_empty() {
        notifier.warning("Transcript is empty; nothing to extract.");
        return Vec::new();
    }

    match try_extract(normalized_transcript, gateway, notifier).await {
        Ok(pairs) => {
            info!("Extracted {} Q&A pairs from transcript", pairs.len());
            if pairs.is_empty() {
                notifier.warning("No questions and answers were found in the transcript.");
            }
            pairs
        }
        Err(e) => {
            report_failure(notifier, "Failed to parse Q&A from transcript", &e);
            Vec::new()
        }
    }
}

async fn try_extract(
    normalized_transcript: &str,
    gateway: &ModelGateway,
    notifier: &Notifier,
) -> Result<Vec<QAPair>, PipelineError> {
    let messages = build_messages(normalized_transcript);
    let raw = gateway
        .complete(&messages, PIPELINE_TEMPERATURE, notifier)
        .await?;
    parse_model_output(&raw)
}

fn build_messages(normalized_transcript: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{QA_EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}")),
        ChatMessage::user(QA_EXTRACTION_PROMPT_TEMPLATE.replace("{transcript}", normalized_transcript)),
    ]
}
