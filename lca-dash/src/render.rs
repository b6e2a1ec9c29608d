//! Terminal output formatting

use lca_common::events::NotificationLevel;
use lca_common::impact_format::format_impact_value;
use lca_common::DashEvent;
use lca_dash::models::{
    MaterialRequiringReview, MaterialSuggestion, ProductDetail, ProductImpacts, ProductPage,
    Session, UploadJob, ValidationFailure,
};
use lca_dash::services::{ImpactBreakdown, ImpactRow, ReviewCounts, ReviewList};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub struct CliFormatter;

impl CliFormatter {
    /// Example: `[✓] Logged in as ops@example.com`
    pub fn format_event(event: &DashEvent) -> String {
        let symbol = match event.level() {
            NotificationLevel::Success => "✓",
            NotificationLevel::Info => "i",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        };
        format!("[{}] {}", symbol, event.message())
    }

    pub fn format_session(session: &Session) -> String {
        let mut output = format!(
            "{} <{}> ({:?})",
            session.user.display_name(),
            session.user.email,
            session.user.role
        );
        if let Some(admin) = &session.impersonator {
            output.push_str(&format!("\nimpersonated by {}", admin.user.email));
        }
        output
    }

    pub fn format_validation_failure(file_name: &str, failure: &ValidationFailure) -> String {
        let mut output = format!("\n{} was rejected:\n", file_name);
        for error in &failure.errors {
            output.push_str(&format!("  ✗ {}\n", error));
        }
        if !failure.validation_rules.is_empty() {
            output.push_str("\nValidation rules:\n");
            for rule in &failure.validation_rules {
                output.push_str(&format!("  - {}\n", rule));
            }
        }
        if !failure.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &failure.suggestions {
                output.push_str(&format!("  - {}\n", suggestion));
            }
        }
        output
    }

    /// Final state of a finished job
    pub fn format_job(job: &UploadJob) -> String {
        let mut output = String::new();
        output.push_str(&format!("\nJob {} ({})\n", job.job_id, job.status.as_str()));
        output.push_str(RULE);
        output.push('\n');
        if let Some(file) = &job.file_name {
            output.push_str(&format!("File: {}\n", file));
        }
        if !job.message.is_empty() {
            output.push_str(&format!("Message: {}\n", job.message));
        }
        if let Some(summary) = job.summary() {
            output.push_str(&format!(
                "Products: {}  Materials: {}  Matched: {}  Need review: {}\n",
                summary.total_products,
                summary.total_materials,
                summary.materials_matched,
                summary.materials_unmatched
            ));
        }
        for error in &job.errors {
            output.push_str(&format!("  ✗ {}\n", error));
        }
        for suggestion in &job.suggestions {
            output.push_str(&format!("  - {}\n", suggestion));
        }
        output
    }

    pub fn format_history(entries: &[UploadJob]) -> String {
        if entries.is_empty() {
            return "No finished uploads yet".to_string();
        }
        let mut output = format!("{:<38} {:<10} {:<20} {}\n", "JOB", "STATUS", "FINISHED", "FILE");
        for job in entries {
            let finished = job
                .updated_at
                .unwrap_or(job.created_at)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            output.push_str(&format!(
                "{:<38} {:<10} {:<20} {}\n",
                job.job_id,
                job.status.as_str(),
                finished,
                job.file_name.as_deref().unwrap_or("-")
            ));
        }
        output
    }

    pub fn format_review_counts(counts: &ReviewCounts) -> String {
        format!(
            "{} materials: {} mapped, {} unmapped, {} without suggestions",
            counts.total, counts.mapped, counts.unmapped, counts.without_suggestions
        )
    }

    pub fn format_review(review: &ReviewList, materials: &[&MaterialRequiringReview]) -> String {
        let mut output = String::new();
        output.push_str(&Self::format_review_counts(&review.counts()));
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');

        for material in materials {
            let marker = if review.is_mapped(&material.id) { "●" } else { "○" };
            output.push_str(&format!(
                "{} [{}] {} (×{})\n",
                marker, material.id, material.name, material.occurrences
            ));
            if let Some(chosen) = review.selected().get(&material.id) {
                output.push_str(&format!("    → {}\n", chosen.activity_name));
            }
            if material.suggestions.is_empty() {
                output.push_str("    no suggestions\n");
            }
            for (index, suggestion) in material.suggestions.iter().enumerate() {
                output.push_str(&format!(
                    "    {}. {} [{}, {:.0}%]{}\n",
                    index,
                    suggestion.activity_name,
                    suggestion.confidence_level.as_str(),
                    suggestion.confidence * 100.0,
                    suggestion
                        .location
                        .as_deref()
                        .map(|loc| format!(" {}", loc))
                        .unwrap_or_default()
                ));
            }
        }
        output
    }

    pub fn format_alternatives(material_name: &str, alternatives: &[MaterialSuggestion]) -> String {
        if alternatives.is_empty() {
            return format!("No ecoinvent activities found for \"{}\"", material_name);
        }
        let mut output = format!("Alternatives for \"{}\":\n", material_name);
        for alternative in alternatives {
            output.push_str(&format!(
                "  {} {} [{}] {}\n",
                alternative.activity_uuid,
                alternative.activity_name,
                alternative.location.as_deref().unwrap_or("GLO"),
                alternative.confidence_level.as_str()
            ));
        }
        output
    }

    pub fn format_product_page(page: &ProductPage) -> String {
        let mut output = format!(
            "Page {} ({} of {} products)\n",
            page.page,
            page.products.len(),
            page.total
        );
        for product in &page.products {
            output.push_str(&format!(
                "  {:<10} {:<40} {:<16} {} materials\n",
                product.id,
                product.name,
                product.sku.as_deref().unwrap_or("-"),
                product.materials_count
            ));
        }
        output
    }

    pub fn format_product(detail: &ProductDetail) -> String {
        let product = &detail.product;
        let mut output = format!("{} ({})\n", product.name, product.id);
        if let Some(category) = &product.category {
            output.push_str(&format!("Category: {}\n", category));
        }
        output.push_str(RULE);
        output.push('\n');
        for material in &detail.materials {
            output.push_str(&format!(
                "  {:<40} {:>10} {:<6} {}\n",
                material.name,
                format_impact_value(material.quantity),
                material.unit,
                material.activity_uuid.as_deref().unwrap_or("unmapped")
            ));
        }
        output
    }

    pub fn format_impacts(
        impacts: &ProductImpacts,
        breakdowns: &[ImpactBreakdown],
        bar_width: usize,
    ) -> String {
        let mut output = format!("Impacts for product {}\n", impacts.product_id);
        output.push_str(RULE);
        output.push('\n');
        for impact in &impacts.impacts {
            let row = ImpactRow::for_impact(impact);
            output.push_str(&format!("  {:<40} {:>10} {}\n", row.label, row.value, row.unit));
        }

        for breakdown in breakdowns {
            output.push_str(&format!("\n{} ({})\n", breakdown.method, breakdown.unit));
            for row in breakdown.rows(bar_width) {
                output.push_str(&format!(
                    "  {:<30} {:>10} {:>8} {}\n",
                    row.label, row.value, row.share, row.bar
                ));
            }
        }
        output
    }
}
