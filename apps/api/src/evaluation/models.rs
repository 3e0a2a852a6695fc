use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::evaluation::scoring::{map_approach, map_key_consideration};

/// One interviewer question and the candidate's answer, in the original language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAPair {
    pub question: String,
    pub answer: String,
}

/// One step of an expert solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertStep {
    pub process_task: String,
    pub key_consideration: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    #[default]
    L1,
    L2,
    L3,
    L4,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 4] = [Self::L1, Self::L2, Self::L3, Self::L4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
        }
    }

    /// Rubric leniency text injected into evaluation prompts.
    pub fn expectations(self) -> &'static str {
        match self {
            Self::L1 => {
                "L1 (Junior): Answers may be basic, incomplete, or lack structure. \
                 Some inaccuracies are acceptable. Focus on basic understanding."
            }
            Self::L2 => {
                "L2 (Intermediate): Answers should show some structure and understanding. \
                 Some missing details or minor inaccuracies are acceptable."
            }
            Self::L3 => {
                "L3 (Senior): Answers should be mostly complete, structured, and accurate. \
                 Minor gaps are acceptable, but most key points should be covered."
            }
            Self::L4 => {
                "L4 (Expert): Answers should be highly complete, well-structured, and highly accurate. \
                 Expect depth, clarity, and minimal inaccuracies."
            }
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown proficiency level '{wanted}' (expected L1..L4)"))
    }
}

/// Rubric-mode judgement of a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricEvaluation {
    pub question: String,
    pub answer: String,
    /// High / Medium / Low
    pub completeness: String,
    /// Correct / Partially Correct / Incorrect
    pub accuracy: String,
    #[serde(default)]
    pub feedback: String,
}

/// Comparative-mode judgement exactly as the model returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComparativeJudgement {
    pub question: String,
    pub expert_answer: String,
    pub candidate_answer: String,
    pub approach_evaluation: String,
    pub key_considerations_evaluation: String,
}

/// Scored comparative record; the exported artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub expert_answer: String,
    pub candidate_answer: String,
    pub approach_evaluation: String,
    pub key_considerations_evaluation: String,
    pub approach_score: u8,
    pub key_considerations_score: u8,
}

impl From<ComparativeJudgement> for EvaluationRecord {
    fn from(j: ComparativeJudgement) -> Self {
        Self {
            approach_score: map_approach(&j.approach_evaluation),
            key_considerations_score: map_key_consideration(&j.key_considerations_evaluation),
            question: j.question,
            expert_answer: j.expert_answer,
            candidate_answer: j.candidate_answer,
            approach_evaluation: j.approach_evaluation,
            key_considerations_evaluation: j.key_considerations_evaluation,
        }
    }
}

/// Result table of one evaluation run, tagged by the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "records", rename_all = "snake_case")]
pub enum Evaluation {
    Rubric(Vec<RubricEvaluation>),
    Comparative(Vec<EvaluationRecord>),
}

impl Evaluation {
    pub fn len(&self) -> usize {
        match self {
            Evaluation::Rubric(records) => records.len(),
            Evaluation::Comparative(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
