//! Wizard operations: run a pipeline stage, then commit its result to the session.
//!
//! A stage that comes back empty leaves the session untouched and returns the
//! matching `SessionError`. The stage itself has already told the notifier why.

use crate::cases::CaseCatalog;
use crate::evaluation::evaluator::{ComparativeEvaluator, EvaluationMode, RubricEvaluator};
use crate::evaluation::expert::ExpertSolutionProvider;
use crate::evaluation::extractor::extract_qa_pairs;
use crate::evaluation::models::{Evaluation, ProficiencyLevel};
use crate::llm_client::ModelGateway;
use crate::notices::Notifier;
use crate::session::{Session, SessionError, WizardVariant};
use crate::transcript::{RawUpload, Transcript};

/// Collaborators a wizard operation needs, borrowed for one request.
pub struct FlowContext<'a> {
    pub gateway: &'a ModelGateway,
    pub catalog: &'a CaseCatalog,
    pub expert_provider: &'a dyn ExpertSolutionProvider,
    pub notifier: &'a Notifier,
}

/// Two-step inputs sent with the upload.
#[derive(Debug, Clone, Default)]
pub struct RubricChoice {
    pub case_study: Option<String>,
    pub level: Option<ProficiencyLevel>,
}

/// Upload → decode → normalize → extract. Commits only when QA pairs came back.
pub async fn process_upload(
    session: &mut Session,
    upload: RawUpload,
    rubric: RubricChoice,
    ctx: &FlowContext<'_>,
) -> Result<(), SessionError> {
    let rubric = match session.variant() {
        WizardVariant::TwoStep => {
            let label = rubric
                .case_study
                .ok_or(SessionError::MissingField("case_study"))?;
            Some((case_label(ctx.catalog, &label), rubric.level.unwrap_or_default()))
        }
        WizardVariant::ThreeStep => None,
    };

    let Some(transcript) = Transcript::from_upload(upload) else {
        ctx.notifier
            .error("Could not read the uploaded file. Please check the file encoding.");
        return Err(SessionError::UnreadableUpload);
    };

    ctx.notifier.info("Processing transcript...");
    let qa_pairs = extract_qa_pairs(&transcript.normalized, ctx.gateway, ctx.notifier).await;
    let count = qa_pairs.len();

    session.accept_transcript(transcript, qa_pairs)?;
    if let Some((label, level)) = rubric {
        session.choose_rubric(label, level)?;
    }

    ctx.notifier
        .success(format!("Transcript processed: {count} Q&A pairs extracted."));
    Ok(())
}

/// Three-step only: picks a case and obtains its expert solution.
pub async fn select_case(
    session: &mut Session,
    case_key: &str,
    ctx: &FlowContext<'_>,
) -> Result<(), SessionError> {
    session.ensure_can_select_case()?;

    let case = ctx
        .catalog
        .get(case_key)
        .ok_or_else(|| SessionError::UnknownCase(case_key.to_string()))?;

    let expert_solution = ctx.expert_provider.provide(case, ctx.notifier).await;
    let steps = expert_solution.len();
    session.accept_case(case.key.clone(), case.name.clone(), expert_solution)?;

    ctx.notifier.success(format!(
        "Expert solution ready for '{}' ({steps} steps).",
        case.name
    ));
    Ok(())
}

/// Runs the variant's evaluation strategy over the session's QA pairs.
///
/// `level` overrides the level chosen at upload in rubric mode and calibrates
/// the comparative prompt when given.
pub async fn evaluate(
    session: &mut Session,
    level: Option<ProficiencyLevel>,
    ctx: &FlowContext<'_>,
) -> Result<(), SessionError> {
    let mode = session.ensure_can_evaluate()?;
    ctx.notifier.info("Evaluating answers...");

    let (evaluation, level) = match mode {
        EvaluationMode::Rubric => {
            let level = level.or(session.level()).unwrap_or_default();
            let evaluator = RubricEvaluator {
                case_label: session.case_label().unwrap_or_default(),
                level,
            };
            let records = evaluator
                .evaluate(session.qa_pairs(), ctx.gateway, ctx.notifier)
                .await;
            (Evaluation::Rubric(records), Some(level))
        }
        EvaluationMode::Comparative => {
            let evaluator = ComparativeEvaluator {
                expert_solution: session.expert_solution(),
                level,
            };
            let records = evaluator
                .evaluate(session.qa_pairs(), ctx.gateway, ctx.notifier)
                .await;
            (Evaluation::Comparative(records), level)
        }
    };

    let count = evaluation.len();
    session.accept_evaluation(evaluation, level)?;
    ctx.notifier
        .success(format!("Evaluation complete: {count} answers evaluated."));
    Ok(())
}

/// Display label for a case: its catalog name when the key is known, otherwise
/// the label as given.
fn case_label(catalog: &CaseCatalog, label: &str) -> String {
    let label = label.trim();
    catalog
        .get(label)
        .map(|case| case.name.clone())
        .unwrap_or_else(|| label.to_string())
}
