// Profile analysis prompt templates.

pub const ANALYST_ROLE: &str = "recruiting analyst who condenses resumes and job \
    descriptions into short structured summaries";

pub const RESUME_ANALYSIS_TASK: &str = r#"Summarize the resume below.

Return a JSON object with this EXACT shape:
{
  "name": "Candidate name, or null if absent",
  "skills": ["Rust", "PostgreSQL"],
  "experience": ["One line per role or major project"],
  "education": "Highest degree and institution",
  "highlights": ["Notable achievements"]
}"#;

/// Replace: {resume_text}
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = "RESUME:\n{resume_text}";

pub const JOB_ANALYSIS_TASK: &str = r#"Summarize the job description below.

Return a JSON object with this EXACT shape:
{
  "position": "Job title",
  "seniority": "junior | mid | senior | lead",
  "required_skills": ["Skills the role requires"],
  "responsibilities": ["Main duties"],
  "experience_requirements": "Years or kind of experience required"
}"#;

/// Replace: {job_description}
pub const JOB_ANALYSIS_PROMPT_TEMPLATE: &str = "JOB DESCRIPTION:\n{job_description}";
