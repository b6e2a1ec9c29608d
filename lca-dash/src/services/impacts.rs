//! Per-method impact breakdowns for product detail views

use lca_common::impact_format::{format_impact_value, format_percentage, render_bar, share_of};

use crate::models::{Impact, MaterialImpact};

/// One material's contribution to a method total
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactContribution {
    pub material: String,
    pub value: f64,
    /// Percentage of the summed magnitudes for the method
    pub share: f64,
}

/// All contributions to one impact method
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactBreakdown {
    pub method: String,
    pub unit: String,
    /// Signed sum of contributions
    pub total: f64,
    /// Largest magnitude first
    pub contributions: Vec<ImpactContribution>,
}

/// Display-ready table row
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactRow {
    pub label: String,
    pub value: String,
    pub unit: String,
    pub share: String,
    pub bar: String,
}

impl ImpactRow {
    pub fn for_impact(impact: &Impact) -> Self {
        Self {
            label: impact.method.clone(),
            value: format_impact_value(impact.value),
            unit: impact.unit.clone(),
            share: String::new(),
            bar: String::new(),
        }
    }
}

impl ImpactBreakdown {
    /// One row per contributing material
    pub fn rows(&self, bar_width: usize) -> Vec<ImpactRow> {
        self.contributions
            .iter()
            .map(|c| ImpactRow {
                label: c.material.clone(),
                value: format_impact_value(c.value),
                unit: self.unit.clone(),
                share: format_percentage(c.share),
                bar: render_bar(c.share, bar_width),
            })
            .collect()
    }
}

/// Group material impacts by method
///
/// Methods keep the order in which they first appear. Contributions from the
/// same material are summed. A unit that disagrees with the method's first
/// unit is logged and the value still counted.
pub fn aggregate_impacts(material_impacts: &[MaterialImpact]) -> Vec<ImpactBreakdown> {
    let mut breakdowns: Vec<ImpactBreakdown> = Vec::new();

    for material in material_impacts {
        for impact in &material.impacts {
            let index = match breakdowns.iter().position(|b| b.method == impact.method) {
                Some(index) => index,
                None => {
                    breakdowns.push(ImpactBreakdown {
                        method: impact.method.clone(),
                        unit: impact.unit.clone(),
                        total: 0.0,
                        contributions: Vec::new(),
                    });
                    breakdowns.len() - 1
                }
            };
            let breakdown = &mut breakdowns[index];

            if breakdown.unit != impact.unit {
                tracing::warn!(
                    method = %impact.method,
                    expected = %breakdown.unit,
                    found = %impact.unit,
                    material = %material.material,
                    "Impact unit mismatch"
                );
            }

            breakdown.total += impact.value;
            match breakdown
                .contributions
                .iter_mut()
                .find(|c| c.material == material.material)
            {
                Some(existing) => existing.value += impact.value,
                None => breakdown.contributions.push(ImpactContribution {
                    material: material.material.clone(),
                    value: impact.value,
                    share: 0.0,
                }),
            }
        }
    }

    for breakdown in &mut breakdowns {
        let magnitude: f64 = breakdown.contributions.iter().map(|c| c.value.abs()).sum();
        for contribution in &mut breakdown.contributions {
            contribution.share = share_of(contribution.value, magnitude);
        }
        breakdown
            .contributions
            .sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
    }

    breakdowns
}
