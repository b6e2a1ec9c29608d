//! Materials awaiting review and their Ecoinvent activity suggestions

use serde::{Deserialize, Serialize};

use super::{id_string, opt_id_string};

/// Confidence at or above which a suggestion is "high"
pub const HIGH_CONFIDENCE: f64 = 0.7;
/// Confidence at or above which a suggestion is "medium"
pub const MEDIUM_CONFIDENCE: f64 = 0.4;

/// Three-tier confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Bucket a confidence score; NaN counts as low
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            ConfidenceLevel::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl std::str::FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(ConfidenceLevel::High),
            "medium" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// Ecoinvent activity returned by the alternatives search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcoinventActivity {
    #[serde(alias = "activityUuid")]
    pub uuid: String,
    #[serde(alias = "activityName")]
    pub name: String,
    #[serde(default)]
    pub reference_product: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Search similarity in `[0, 1]`, used as the suggestion confidence
    #[serde(default, alias = "score")]
    pub similarity: Option<f64>,
}

/// Candidate activity for a material
///
/// `confidence_level` is always recomputed from `confidence` on decode so
/// server-sent and operator-sourced suggestions bucket identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SuggestionWire")]
pub struct MaterialSuggestion {
    pub activity_uuid: String,
    pub activity_name: String,
    pub reference_product: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    /// Set only on suggestions the operator picked from the alternatives
    /// search. Carried through to the backend untouched.
    pub new_mapping: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionWire {
    #[serde(alias = "uuid")]
    activity_uuid: String,
    #[serde(alias = "name")]
    activity_name: String,
    #[serde(default)]
    reference_product: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    new_mapping: bool,
}

impl From<SuggestionWire> for MaterialSuggestion {
    fn from(wire: SuggestionWire) -> Self {
        Self {
            activity_uuid: wire.activity_uuid,
            activity_name: wire.activity_name,
            reference_product: wire.reference_product,
            location: wire.location,
            unit: wire.unit,
            confidence: wire.confidence,
            confidence_level: ConfidenceLevel::from_score(wire.confidence),
            new_mapping: wire.new_mapping,
        }
    }
}

impl MaterialSuggestion {
    /// Build a suggestion from an operator-chosen alternative
    pub fn from_alternative(activity: &EcoinventActivity) -> Self {
        let confidence = activity.similarity.unwrap_or(0.0);
        Self {
            activity_uuid: activity.uuid.clone(),
            activity_name: activity.name.clone(),
            reference_product: activity.reference_product.clone(),
            location: activity.location.clone(),
            unit: activity.unit.clone(),
            confidence,
            confidence_level: ConfidenceLevel::from_score(confidence),
            new_mapping: true,
        }
    }
}

/// Material the backend could not map with confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequiringReview {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    /// Number of product rows referencing this material
    #[serde(default)]
    pub occurrences: u32,
    /// Server-ordered, best first
    #[serde(default)]
    pub suggestions: Vec<MaterialSuggestion>,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

impl MaterialRequiringReview {
    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }

    pub fn top_suggestion(&self) -> Option<&MaterialSuggestion> {
        self.suggestions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(ConfidenceLevel::from_score(1.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.6999), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.4), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.3999), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(f64::NAN), ConfidenceLevel::Low);
    }

    #[test]
    fn test_every_score_lands_in_exactly_one_bucket() {
        for step in 0..=1000 {
            let c = step as f64 / 1000.0;
            let level = ConfidenceLevel::from_score(c);
            assert_eq!(level == ConfidenceLevel::High, c >= 0.7);
            assert_eq!(level == ConfidenceLevel::Medium, (0.4..0.7).contains(&c));
            assert_eq!(level == ConfidenceLevel::Low, c < 0.4);
        }
    }

    #[test]
    fn test_suggestion_level_recomputed_on_decode() {
        let suggestion: MaterialSuggestion = serde_json::from_value(json!({
            "activityUuid": "a-1",
            "activityName": "steel production, converter",
            "confidence": 0.55,
            "confidenceLevel": "high"
        }))
        .unwrap();
        assert_eq!(suggestion.confidence_level, ConfidenceLevel::Medium);
        assert!(!suggestion.new_mapping);
    }

    #[test]
    fn test_alternative_is_flagged_and_bucketed() {
        let activity = EcoinventActivity {
            uuid: "b-2".to_string(),
            name: "aluminium, primary".to_string(),
            reference_product: Some("aluminium".to_string()),
            location: Some("GLO".to_string()),
            unit: Some("kg".to_string()),
            similarity: Some(0.82),
        };

        let suggestion = MaterialSuggestion::from_alternative(&activity);

        assert!(suggestion.new_mapping);
        assert_eq!(suggestion.confidence_level, ConfidenceLevel::High);
        assert_eq!(suggestion.activity_uuid, "b-2");

        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["newMapping"], true);
        assert_eq!(json["confidenceLevel"], "high");
    }

    #[test]
    fn test_material_id_accepts_numbers() {
        let material: MaterialRequiringReview = serde_json::from_value(json!({
            "id": 12,
            "name": "PET granulate"
        }))
        .unwrap();
        assert_eq!(material.id, "12");
        assert!(!material.has_suggestions());
    }
}
