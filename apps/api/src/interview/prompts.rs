// All model prompt templates for the interview engine.
// Shared fragments come from llm_client::prompts.

pub const GENERATOR_ROLE: &str = "technical interviewer who writes relevant, \
    probing questions tailored to the candidate's background and the target role";

pub const EVALUATOR_ROLE: &str = "interview assessor who judges answers objectively \
    and gives actionable feedback";

pub const TOPIC_ROLE: &str = "interview flow manager who decides how deep to probe \
    each topic based on the candidate's answers";

/// Question generation task. Replace `{count}` before sending.
pub const QUESTION_GENERATION_TASK: &str = r#"Generate exactly {count} interview questions.

Return a JSON ARRAY with this EXACT shape:
[
  {
    "question": "Walk me through how you designed the caching layer in your last project.",
    "type": "technical",
    "context": "Why this question is being asked",
    "expected_duration": 180,
    "follow_up_questions": ["How did you handle invalidation?"]
  }
]

Rules:
- "type" must be one of: "technical", "behavioral", "situational", "experience"
- "expected_duration" is in seconds
- Mix question types and ground each question in the candidate or job context"#;

/// Question generation user message.
/// Replace: {count}, {candidate_json}, {job_json}
pub const QUESTION_GENERATION_PROMPT_TEMPLATE: &str = r#"CANDIDATE PROFILE:
{candidate_json}

TARGET ROLE:
{job_json}

Generate {count} interview questions."#;

pub const EVALUATION_TASK: &str = r#"Evaluate the candidate's answer to an interview question.

Score these dimensions:
1. Completeness: is the answer thorough and logically structured?
2. Technical accuracy: is the technical content correct?
3. Clarity: is the answer easy to follow?
4. Relevance: does it address the question that was asked?
5. Depth and insight: does it show original thinking?

Return a JSON object with this EXACT shape:
{
  "score": 7.5,
  "feedback": "Overall assessment in a few sentences",
  "strengths": ["..."],
  "areas_for_improvement": ["..."],
  "suggestions": ["..."]
}

"score" is a single overall number from 1 to 10."#;

/// Evaluation user message.
/// Replace: {question_type}, {question}, {question_context}, {answer_text},
///          {duration}, {context_block}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"INTERVIEW QUESTION
Type: {question_type}
Question: {question}
Context: {question_context}

CANDIDATE ANSWER
Text: {answer_text}
Duration: {duration} seconds
{context_block}
Evaluate this answer."#;

pub const FINAL_REPORT_TASK: &str = r#"Write a final assessment report for the whole interview.

The report must cover:
1. Overall performance
2. Main strengths
3. Areas to improve
4. Targeted recommendations
5. Whether the candidate suits the role

Stay objective, professional, and constructive. Plain text, no JSON."#;

/// Final report user message. Replace: {evaluations_json}, {mean_score}, {context_block}
pub const FINAL_REPORT_PROMPT_TEMPLATE: &str = r#"PER-QUESTION EVALUATIONS:
{evaluations_json}

AVERAGE SCORE: {mean_score}/10
{context_block}
Write the final report."#;

pub const FOLLOW_UP_JUDGMENT_TASK: &str = r#"Decide whether the candidate's answer warrants a follow-up question.

Consider:
1. Is the answer too short or vague?
2. Does it mention technical detail worth exploring further?
3. Is there a contradiction that needs clarifying?
4. Would a follow-up let the candidate better demonstrate their ability?

Answer with a single word: "yes" or "no"."#;

pub const FOLLOW_UP_TASK: &str = r#"Write one follow-up question based on the candidate's answer.

The follow-up should:
1. Dig into a key point of the answer
2. Help the candidate show their ability
3. Keep the interview flowing naturally"#;

pub const DEEP_DIVE_TASK: &str = r#"Write one deeper probing question on the current topic.

The question should:
1. Go one level deeper than the discussion so far
2. Test higher-order understanding
3. Explore a realistic application scenario
4. Stretch the candidate's reasoning"#;

/// Replace: {question}, {answer_text}, {duration}
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"QUESTION: {question}
CANDIDATE ANSWER: {answer_text}
ANSWER DURATION: {duration} seconds"#;

/// Replace: {topic}, {answer_text}
pub const DEEP_DIVE_PROMPT_TEMPLATE: &str = r#"CURRENT TOPIC: {topic}
CANDIDATE'S LATEST ANSWER: {answer_text}"#;
