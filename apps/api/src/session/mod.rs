//! Session Flow Controller state.
//!
//! A `Session` is one wizard run. Its fields are private: every change goes
//! through a transition method, so stage and artifacts never disagree.
//!
//! Stages: `Start → TranscriptProcessed → (CaseSelected →) Evaluated`.
//! `CaseSelected` exists only in the three-step variant.
//!
//! Replacing an upstream artifact clears everything derived from it. Going
//! back keeps artifacts. Reset discards everything.

pub mod controller;
pub mod handlers;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::evaluation::evaluator::EvaluationMode;
use crate::evaluation::models::{Evaluation, ExpertStep, ProficiencyLevel, QAPair};
use crate::transcript::Transcript;

// ────────────────────────────────────────────────────────────────────────────
// Stages and variants
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    Start,
    TranscriptProcessed,
    CaseSelected,
    Evaluated,
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardStage::Start => "start",
            WizardStage::TranscriptProcessed => "transcript_processed",
            WizardStage::CaseSelected => "case_selected",
            WizardStage::Evaluated => "evaluated",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardVariant {
    /// Upload (with case label and level) → rubric evaluation.
    TwoStep,
    /// Upload → case selection with expert solution → comparative evaluation.
    #[default]
    ThreeStep,
}

impl WizardVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardVariant::TwoStep => "two_step",
            WizardVariant::ThreeStep => "three_step",
        }
    }

    pub fn has_stage(self, stage: WizardStage) -> bool {
        stage != WizardStage::CaseSelected || self == WizardVariant::ThreeStep
    }
}

impl fmt::Display for WizardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two_step" | "two-step" | "2" => Ok(WizardVariant::TwoStep),
            "three_step" | "three-step" | "3" => Ok(WizardVariant::ThreeStep),
            other => Err(format!(
                "unknown wizard variant '{other}' (expected two_step or three_step)"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not read the uploaded file")]
    UnreadableUpload,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("No questions and answers could be extracted from the transcript")]
    NothingExtracted,

    #[error("Unknown case study '{0}'")]
    UnknownCase(String),

    #[error("No expert solution could be obtained for case '{0}'")]
    EmptyExpertSolution(String),

    #[error("Evaluation produced no records")]
    EvaluationFailed,

    #[error("Cannot {action} while the session is at stage '{stage}'")]
    InvalidTransition {
        stage: WizardStage,
        action: &'static str,
    },

    #[error("'{action}' is not part of the {variant} wizard")]
    NotInVariant {
        variant: WizardVariant,
        action: &'static str,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    variant: WizardVariant,
    stage: WizardStage,
    created_at: DateTime<Utc>,
    transcript: Option<Transcript>,
    qa_pairs: Vec<QAPair>,
    case_key: Option<String>,
    case_label: Option<String>,
    level: Option<ProficiencyLevel>,
    expert_solution: Vec<ExpertStep>,
    evaluation: Option<Evaluation>,
}

/// Read-only view returned to callers after every step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub variant: WizardVariant,
    pub stage: WizardStage,
    pub created_at: DateTime<Utc>,
    pub transcript: Option<Transcript>,
    pub qa_pairs: Vec<QAPair>,
    pub case_key: Option<String>,
    pub case_label: Option<String>,
    pub level: Option<ProficiencyLevel>,
    pub expert_solution: Vec<ExpertStep>,
    pub evaluation: Option<Evaluation>,
}

impl Session {
    pub fn new(id: Uuid, variant: WizardVariant) -> Self {
        Self {
            id,
            variant,
            stage: WizardStage::Start,
            created_at: Utc::now(),
            transcript: None,
            qa_pairs: Vec::new(),
            case_key: None,
            case_label: None,
            level: None,
            expert_solution: Vec::new(),
            evaluation: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn variant(&self) -> WizardVariant {
        self.variant
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn qa_pairs(&self) -> &[QAPair] {
        &self.qa_pairs
    }

    pub fn case_label(&self) -> Option<&str> {
        self.case_label.as_deref()
    }

    pub fn level(&self) -> Option<ProficiencyLevel> {
        self.level
    }

    pub fn expert_solution(&self) -> &[ExpertStep] {
        &self.expert_solution
    }

    /// The evaluation table, once the session has reached `Evaluated`.
    pub fn evaluation(&self) -> Result<&Evaluation, SessionError> {
        match (&self.evaluation, self.stage) {
            (Some(evaluation), WizardStage::Evaluated) => Ok(evaluation),
            _ => Err(self.invalid("export results")),
        }
    }

    /// Stores a freshly extracted transcript. Everything downstream is cleared.
    pub fn accept_transcript(
        &mut self,
        transcript: Transcript,
        qa_pairs: Vec<QAPair>,
    ) -> Result<(), SessionError> {
        if qa_pairs.is_empty() {
            return Err(SessionError::NothingExtracted);
        }
        self.transcript = Some(transcript);
        self.qa_pairs = qa_pairs;
        self.case_key = None;
        self.case_label = None;
        self.level = None;
        self.expert_solution.clear();
        self.evaluation = None;
        self.stage = WizardStage::TranscriptProcessed;
        Ok(())
    }

    /// Two-step only: the rubric inputs captured alongside the upload.
    pub fn choose_rubric(
        &mut self,
        case_label: String,
        level: ProficiencyLevel,
    ) -> Result<(), SessionError> {
        if self.variant != WizardVariant::TwoStep {
            return Err(self.not_in_variant("choose a rubric"));
        }
        if self.stage != WizardStage::TranscriptProcessed {
            return Err(self.invalid("choose a rubric"));
        }
        self.case_label = Some(case_label);
        self.level = Some(level);
        Ok(())
    }

    pub fn ensure_can_select_case(&self) -> Result<(), SessionError> {
        if self.variant != WizardVariant::ThreeStep {
            return Err(self.not_in_variant("select a case study"));
        }
        if self.stage < WizardStage::TranscriptProcessed {
            return Err(self.invalid("select a case study"));
        }
        Ok(())
    }

    /// Stores the selected case and its expert solution. Clears any evaluation.
    pub fn accept_case(
        &mut self,
        case_key: String,
        case_label: String,
        expert_solution: Vec<ExpertStep>,
    ) -> Result<(), SessionError> {
        self.ensure_can_select_case()?;
        if expert_solution.is_empty() {
            return Err(SessionError::EmptyExpertSolution(case_label));
        }
        self.case_key = Some(case_key);
        self.case_label = Some(case_label);
        self.expert_solution = expert_solution;
        self.evaluation = None;
        self.stage = WizardStage::CaseSelected;
        Ok(())
    }

    /// Checks that evaluation may run now and returns the strategy to use.
    pub fn ensure_can_evaluate(&self) -> Result<EvaluationMode, SessionError> {
        match self.variant {
            WizardVariant::TwoStep if self.stage >= WizardStage::TranscriptProcessed => {
                Ok(EvaluationMode::Rubric)
            }
            WizardVariant::ThreeStep
                if self.stage >= WizardStage::CaseSelected && !self.expert_solution.is_empty() =>
            {
                Ok(EvaluationMode::Comparative)
            }
            _ => Err(self.invalid("evaluate")),
        }
    }

    pub fn accept_evaluation(
        &mut self,
        evaluation: Evaluation,
        level: Option<ProficiencyLevel>,
    ) -> Result<(), SessionError> {
        self.ensure_can_evaluate()?;
        if evaluation.is_empty() {
            return Err(SessionError::EvaluationFailed);
        }
        if level.is_some() {
            self.level = level;
        }
        self.evaluation = Some(evaluation);
        self.stage = WizardStage::Evaluated;
        Ok(())
    }

    /// Moves to an earlier stage. Computed artifacts are kept.
    pub fn go_back(&mut self, to: WizardStage) -> Result<(), SessionError> {
        if !self.variant.has_stage(to) {
            return Err(self.not_in_variant("go back to that stage"));
        }
        if to >= self.stage {
            return Err(self.invalid("go back"));
        }
        self.stage = to;
        Ok(())
    }

    /// Discards every artifact; the id and variant survive.
    pub fn reset(&mut self) {
        *self = Session::new(self.id, self.variant);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            variant: self.variant,
            stage: self.stage,
            created_at: self.created_at,
            transcript: self.transcript.clone(),
            qa_pairs: self.qa_pairs.clone(),
            case_key: self.case_key.clone(),
            case_label: self.case_label.clone(),
            level: self.level,
            expert_solution: self.expert_solution.clone(),
            evaluation: self.evaluation.clone(),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            stage: self.stage,
            action,
        }
    }

    fn not_in_variant(&self, action: &'static str) -> SessionError {
        SessionError::NotInVariant {
            variant: self.variant,
            action,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// In-memory sessions keyed by id. Each session has its own lock, held for the
/// whole of a wizard operation.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub async fn create(&self, variant: WizardVariant) -> Arc<Mutex<Session>> {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(id, variant)));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
