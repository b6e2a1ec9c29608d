//! Material-mapping review
//!
//! Holds the materials a finished upload could not map, the operator's
//! current selection, and the confirm step. Filtering is recomputed on every
//! call; lists are tens to low hundreds of materials.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use lca_common::DashEvent;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::models::{ConfidenceLevel, MaterialRequiringReview, MaterialSuggestion};
use crate::services::ApiClient;

/// Material id → chosen suggestion. Absent ids are unmapped.
pub type SelectedMappings = BTreeMap<String, MaterialSuggestion>;

/// Filter dimension for the review list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewFilter {
    #[default]
    All,
    Mapped,
    Unmapped,
    NoSuggestions,
    WithSuggestions,
}

impl FromStr for ReviewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "all" => Ok(ReviewFilter::All),
            "mapped" => Ok(ReviewFilter::Mapped),
            "unmapped" => Ok(ReviewFilter::Unmapped),
            "nosuggestions" => Ok(ReviewFilter::NoSuggestions),
            "withsuggestions" => Ok(ReviewFilter::WithSuggestions),
            _ => Err(format!(
                "unknown filter '{}' (all, mapped, unmapped, no-suggestions, with-suggestions)",
                s
            )),
        }
    }
}

/// Counts shown above the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewCounts {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub without_suggestions: usize,
}

/// Review state for one upload
#[derive(Debug, Clone, Default)]
pub struct ReviewList {
    materials: Vec<MaterialRequiringReview>,
    selected: SelectedMappings,
}

impl ReviewList {
    pub fn new(materials: Vec<MaterialRequiringReview>) -> Self {
        Self {
            materials,
            selected: SelectedMappings::new(),
        }
    }

    pub fn materials(&self) -> &[MaterialRequiringReview] {
        &self.materials
    }

    pub fn material(&self, material_id: &str) -> Option<&MaterialRequiringReview> {
        self.materials.iter().find(|m| m.id == material_id)
    }

    pub fn selected(&self) -> &SelectedMappings {
        &self.selected
    }

    pub fn is_mapped(&self, material_id: &str) -> bool {
        self.selected.contains_key(material_id)
    }

    /// Materials passing `filter` whose name contains `search`
    /// (case-insensitive; blank search matches everything)
    pub fn filtered(&self, filter: ReviewFilter, search: &str) -> Vec<&MaterialRequiringReview> {
        let needle = search.trim().to_lowercase();
        self.materials
            .iter()
            .filter(|m| needle.is_empty() || m.name.to_lowercase().contains(&needle))
            .filter(|m| match filter {
                ReviewFilter::All => true,
                ReviewFilter::Mapped => self.is_mapped(&m.id),
                ReviewFilter::Unmapped => !self.is_mapped(&m.id),
                ReviewFilter::NoSuggestions => !m.has_suggestions(),
                ReviewFilter::WithSuggestions => m.has_suggestions(),
            })
            .collect()
    }

    pub fn counts(&self) -> ReviewCounts {
        let mapped = self
            .materials
            .iter()
            .filter(|m| self.is_mapped(&m.id))
            .count();
        ReviewCounts {
            total: self.materials.len(),
            mapped,
            unmapped: self.materials.len() - mapped,
            without_suggestions: self.materials.iter().filter(|m| !m.has_suggestions()).count(),
        }
    }

    /// Upsert the mapping for a material; returns the replaced choice
    pub fn select(
        &mut self,
        material_id: &str,
        suggestion: MaterialSuggestion,
    ) -> Result<Option<MaterialSuggestion>, WorkflowError> {
        if self.material(material_id).is_none() {
            return Err(WorkflowError::UnknownMaterial(material_id.to_string()));
        }
        Ok(self.selected.insert(material_id.to_string(), suggestion))
    }

    /// Select one of the material's own suggestions by position
    pub fn select_suggestion(
        &mut self,
        material_id: &str,
        index: usize,
    ) -> Result<Option<MaterialSuggestion>, WorkflowError> {
        let suggestion = self
            .material(material_id)
            .ok_or_else(|| WorkflowError::UnknownMaterial(material_id.to_string()))?
            .suggestions
            .get(index)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownSuggestion {
                material_id: material_id.to_string(),
                index,
            })?;
        self.select(material_id, suggestion)
    }

    /// Remove the mapping for a material
    pub fn unmap(&mut self, material_id: &str) -> Option<MaterialSuggestion> {
        self.selected.remove(material_id)
    }

    /// Pick the top suggestion for every unmapped material at or above
    /// `min_level`; returns how many were selected
    pub fn select_top_suggestions(&mut self, min_level: ConfidenceLevel) -> usize {
        let picks: Vec<(String, MaterialSuggestion)> = self
            .materials
            .iter()
            .filter(|m| !self.selected.contains_key(&m.id))
            .filter_map(|m| {
                m.top_suggestion()
                    .filter(|s| s.confidence_level >= min_level)
                    .map(|s| (m.id.clone(), s.clone()))
            })
            .collect();

        let count = picks.len();
        self.selected.extend(picks);
        count
    }

    /// Confirmation needs at least one selection, not full coverage
    pub fn can_confirm(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Search alternatives for a material name and turn them into
    /// operator-sourced suggestions
    pub async fn find_alternatives(
        client: &ApiClient,
        material_name: &str,
    ) -> Result<Vec<MaterialSuggestion>, WorkflowError> {
        let activities = client.suggest_alternatives(material_name).await?;
        tracing::debug!(
            material = %material_name,
            count = activities.len(),
            "Alternatives received"
        );
        Ok(activities
            .iter()
            .map(MaterialSuggestion::from_alternative)
            .collect())
    }

    /// Search alternatives by the material's name and select the one with
    /// `activity_uuid` as a new mapping
    pub async fn select_alternative(
        &mut self,
        client: &ApiClient,
        material_id: &str,
        activity_uuid: &str,
    ) -> Result<Option<MaterialSuggestion>, WorkflowError> {
        let name = self
            .material(material_id)
            .ok_or_else(|| WorkflowError::UnknownMaterial(material_id.to_string()))?
            .name
            .clone();

        let alternative = Self::find_alternatives(client, &name)
            .await?
            .into_iter()
            .find(|a| a.activity_uuid == activity_uuid)
            .ok_or_else(|| WorkflowError::UnknownAlternative {
                material_id: material_id.to_string(),
                activity_uuid: activity_uuid.to_string(),
            })?;
        self.select(material_id, alternative)
    }

    /// Submit the whole selection in one request
    ///
    /// On success the review is reset and the number of confirmed mappings
    /// returned. On failure nothing local changes.
    pub async fn confirm(&mut self, client: &ApiClient) -> Result<usize, WorkflowError> {
        if !self.can_confirm() {
            return Err(WorkflowError::NothingSelected);
        }

        let count = self.selected.len();
        match client.confirm_mappings(&self.selected).await {
            Ok(response) => {
                tracing::info!(
                    count,
                    message = response.message.as_deref().unwrap_or(""),
                    "Material mappings confirmed"
                );
                client.events().emit_lossy(DashEvent::MappingsConfirmed {
                    count,
                    timestamp: Utc::now(),
                });
                self.reset();
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, count, "Mapping confirmation failed");
                client.events().emit_lossy(DashEvent::MappingConfirmFailed {
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }

    /// Drop materials and selection
    pub fn reset(&mut self) {
        self.materials.clear();
        self.selected.clear();
    }
}
