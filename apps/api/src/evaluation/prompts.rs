// All LLM prompt constants for the evaluation pipeline.
// Templates use `{placeholder}` markers filled with `str::replace` before sending.

/// QA extraction system prompt.
pub const QA_EXTRACTION_SYSTEM: &str = "You are a helpful assistant that extracts Q&A pairs \
    from interview transcripts. Maintain the original language of the transcript and \
    preserve the exact wording.";

/// QA extraction prompt. Replace `{transcript}`.
pub const QA_EXTRACTION_PROMPT_TEMPLATE: &str = r#"From the transcript below, extract a list of questions asked by the interviewer (marked with A:) and the candidate's corresponding answers (marked with C:).
Format the response as a JSON array of objects with 'question' and 'answer' fields.
The transcript might be in Spanish or English; keep the original language in the output. Do NOT translate.
Lines may have been split at any word followed by a colon; join such fragments back into the turn they belong to.

Transcript:
{transcript}

Example format:
[
  {
    "question": "¿Podrías describir una estrategia de migración a cloud?",
    "answer": "Claro. Para desarrollar una estrategia de migración efectiva..."
  }
]"#;

/// Expert solution system prompt.
pub const EXPERT_SOLUTION_SYSTEM: &str = "You are an expert IT architect.";

/// Expert solution prompt. Replace `{objective}`.
pub const EXPERT_SOLUTION_PROMPT_TEMPLATE: &str = r#"For the following case objective, list the process required to execute the challenge, including 3-4 main steps and key considerations to tackle the main challenge. Output as a JSON array of objects with 'process_task' and 'key_consideration' fields. Do not include any commentary or markdown.

Objective: {objective}

Example:
[
  {"process_task": "Assess current infrastructure", "key_consideration": "Identify legacy dependencies"},
  {"process_task": "Plan migration phases", "key_consideration": "Minimize downtime"}
]"#;

/// Rubric evaluation system prompt.
pub const RUBRIC_EVALUATION_SYSTEM: &str = "You are a senior tech architect evaluating \
    interview responses. The responses may be in Spanish, but provide your evaluation in English.";

/// Rubric evaluation prompt. Replace `{level}`, `{case_study}`, `{expectations}`, `{qa_pairs}`.
pub const RUBRIC_EVALUATION_PROMPT_TEMPLATE: &str = r#"As a senior tech architect evaluating a peer, analyze the following Q&A pairs from an architecture interview.
The candidate is applying for a {level} position.
The case study being discussed is: {case_study}

Evaluation rubric:
{expectations}

For each answer, evaluate:
1. Level of Completeness (High/Medium/Low)
2. Level of Accuracy (Correct/Partially Correct/Incorrect)

Be more lenient for L1, and stricter for L4. Calibrate your expectations accordingly.

Provide your evaluation as a JSON array with exactly one object per Q&A pair, in the same order:
[
  {
    "question": "original question",
    "answer": "original answer",
    "completeness": "High/Medium/Low",
    "accuracy": "Correct/Partially Correct/Incorrect",
    "feedback": "brief explanation of the evaluation"
  }
]

Q&A Pairs:
{qa_pairs}"#;

/// Comparative evaluation system prompt.
pub const COMPARATIVE_EVALUATION_SYSTEM: &str =
    "You are an expert IT architect evaluating candidate answers.";

/// Comparative evaluation prompt. Replace `{calibration}`, `{expert_solution}`, `{qa_pairs}`.
pub const COMPARATIVE_EVALUATION_PROMPT_TEMPLATE: &str = r#"For each candidate answer, compare it to the expert process and key considerations below. Rate the approach and key considerations as follows:

- Approach evaluation:
    - High: The answer contains almost all the definitions of the process recommended by the expert
    - Medium: The answer contains several definitions of the process recommended by the expert
    - Low: The answer contains one or two definitions of the process recommended by the expert
- Key Considerations:
    - Correct: The answers are highly connected with all the key considerations recommended by the expert
    - Partially correct: The answers are connected with some key considerations recommended by the expert
    - Incorrect: The answers are not connected or related with key considerations recommended by the expert
{calibration}
Output a JSON array with exactly one object per Q&A pair, in the same order, with these fields:
- question
- expert_answer (summary of process and key considerations)
- candidate_answer
- approach_evaluation
- key_considerations_evaluation

Return an empty array only if there are no Q&A pairs.

Expert process and considerations:
{expert_solution}

Q&A pairs:
{qa_pairs}"#;
