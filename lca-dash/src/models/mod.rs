//! Data models for the LCA dashboard client
//!
//! Wire types use camelCase field names, matching the backend JSON.

pub mod auth;
pub mod materials;
pub mod products;
pub mod upload_job;

pub use auth::{AuthResponse, Role, Session, User};
pub use materials::{ConfidenceLevel, EcoinventActivity, MaterialRequiringReview, MaterialSuggestion};
pub use products::{Impact, MaterialImpact, Product, ProductDetail, ProductImpacts, ProductMaterial, ProductPage};
pub use upload_job::{
    JobProgress, JobResult, JobStatus, JobStatusResponse, UploadJob, UploadOutcome, UploadSummary,
    ValidationFailure,
};

use serde::{Deserialize, Deserializer};

/// Backend ids arrive as strings or integers depending on the table
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Optional variant of [`id_string`]
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}
