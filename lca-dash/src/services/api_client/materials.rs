//! Material mapping endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, AuthPolicy};
use crate::error::ClientError;
use crate::models::EcoinventActivity;
use crate::services::review_list::SelectedMappings;

#[derive(Serialize)]
struct ConfirmMappingRequest<'a> {
    mappings: &'a SelectedMappings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestAlternativesRequest<'a> {
    material_name: &'a str,
}

#[derive(Deserialize)]
struct SuggestAlternativesResponse {
    #[serde(default)]
    alternatives: Vec<EcoinventActivity>,
}

/// Acknowledgement of a mapping confirmation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated: Option<u64>,
}

impl ApiClient {
    /// `POST /products/materials/confirm-mapping` with the full snapshot
    pub async fn confirm_mappings(
        &self,
        mappings: &SelectedMappings,
    ) -> Result<ConfirmResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/products/materials/confirm-mapping"))
            .json(&ConfirmMappingRequest { mappings });
        let response = self.send(request, AuthPolicy::ExpireOn401).await?;

        // Some deployments answer 204 or a bare message
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(ConfirmResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// `POST /products/materials/suggest-alternatives`
    pub async fn suggest_alternatives(
        &self,
        material_name: &str,
    ) -> Result<Vec<EcoinventActivity>, ClientError> {
        let request = self
            .http
            .post(self.url("/products/materials/suggest-alternatives"))
            .json(&SuggestAlternativesRequest { material_name });
        let response: SuggestAlternativesResponse =
            self.send_json(request, AuthPolicy::ExpireOn401).await?;
        Ok(response.alternatives)
    }
}
