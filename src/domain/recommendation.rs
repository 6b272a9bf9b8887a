//! Product recommendations and the response bodies built around them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Upper bound on recommendations returned to clients.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// One product suggested for the cat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub name: String,
    /// 主食, おやつ or ケアフード.
    pub category: String,
    pub series: String,
    /// Why the product suits this cat.
    pub reason: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Structured model output for the recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<RecommendedProduct>,
    #[serde(default)]
    pub notes: String,
}

impl RecommendationResult {
    /// Drops recommendations past [`MAX_RECOMMENDATIONS`].
    pub fn truncated(mut self) -> Self {
        self.recommendations.truncate(MAX_RECOMMENDATIONS);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub diagnosis: String,
    #[serde(serialize_with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub result: RecommendationResult,
    #[serde(serialize_with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
}

fn iso_millis<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
