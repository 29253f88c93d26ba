use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parameters accepted by the generation endpoint.
///
/// Field names follow the wire format posted by the voice assistant workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewParams {
    #[serde(rename = "type")]
    pub interview_type: String,
    pub role: String,
    pub level: String,
    /// Comma-separated technology list, e.g. `"Go,Postgres"`.
    pub techstack: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: u32,
    #[serde(rename = "userid")]
    pub user_id: String,
}

impl InterviewParams {
    /// The tech stack as a list, split on every comma.
    pub fn techstack_list(&self) -> Vec<String> {
        split_techstack(&self.techstack)
    }
}

/// Split a comma-separated tech stack string on every `,`.
///
/// Entries are kept verbatim: no trimming, and empty entries survive, so
/// `"Rust, Tokio"` gives `["Rust", " Tokio"]` and `""` gives `[""]`.
pub fn split_techstack(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Accept `amount` as either a JSON number or a numeric string.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u32),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s:?}"))),
    }
}

/// A generated mock interview, as persisted in the `interviews` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub level: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    pub user_id: String,
    pub finalized: bool,
    pub cover_image: String,
    #[serde(serialize_with = "serialize_millis")]
    pub created_at: DateTime<Utc>,
}

/// ISO-8601 with exactly three fractional digits, e.g. `2024-05-01T12:00:00.000Z`.
fn serialize_millis<S>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Interview {
    /// Build a finalized record from request parameters and parsed questions.
    pub fn from_params(params: &InterviewParams, questions: Vec<String>, cover_image: String) -> Self {
        Self {
            role: params.role.clone(),
            interview_type: params.interview_type.clone(),
            level: params.level.clone(),
            techstack: params.techstack_list(),
            questions,
            user_id: params.user_id.clone(),
            finalized: true,
            cover_image,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// An interview together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInterview {
    pub id: String,
    #[serde(flatten)]
    pub interview: Interview,
}
