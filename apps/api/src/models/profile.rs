use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Candidate context passed through to the model. Entries may be plain strings or
/// structured objects; unknown fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub skills: Vec<Value>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub experience: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub highlights: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Target-role context passed through to the model. Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority: Option<Value>,
    #[serde(default, alias = "requirements", deserialize_with = "one_or_many")]
    pub required_skills: Vec<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub responsibilities: Vec<Value>,
    #[serde(
        default,
        alias = "experience",
        skip_serializing_if = "Option::is_none"
    )]
    pub experience_requirements: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateProfile {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl JobProfile {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accepts a list, a single value (wrapped), or null (empty).
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}
