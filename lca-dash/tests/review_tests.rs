//! Material review confirm and alternatives search

mod helpers;

use helpers::{dash_state, review_materials, MockBackend};
use lca_common::DashEvent;
use lca_dash::models::{ConfidenceLevel, MaterialRequiringReview};
use lca_dash::services::{ReviewFilter, ReviewList};
use lca_dash::{ClientError, WorkflowError};
use serde_json::json;
use tempfile::TempDir;

const CONFIRM: &str = "POST /products/materials/confirm-mapping";
const ALTERNATIVES: &str = "POST /products/materials/suggest-alternatives";

fn review() -> ReviewList {
    let materials: Vec<MaterialRequiringReview> =
        serde_json::from_value(review_materials()).unwrap();
    ReviewList::new(materials)
}

#[tokio::test]
async fn test_confirm_sends_snapshot_and_resets() {
    let backend = MockBackend::start().await;
    backend.respond(CONFIRM, 200, json!({ "message": "Mappings saved", "updated": 2 }));

    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());
    let mut rx = state.events.subscribe();

    let mut review = review();
    review.select_suggestion("m1", 0).unwrap();
    review.select_suggestion("m2", 0).unwrap();

    let confirmed = review.confirm(&state.client).await.unwrap();
    assert_eq!(confirmed, 2);
    assert!(review.selected().is_empty());
    assert!(review.materials().is_empty());

    let body = backend.requests_to(CONFIRM)[0].json();
    assert_eq!(body["mappings"]["m1"]["activityUuid"], "a-1");
    assert_eq!(body["mappings"]["m2"]["activityUuid"], "c-1");
    assert_eq!(body["mappings"]["m2"]["confidenceLevel"], "medium");
    assert!(body["mappings"].get("3").is_none());

    assert!(matches!(rx.try_recv(), Ok(DashEvent::MappingsConfirmed { count: 2, .. })));
}

#[tokio::test]
async fn test_failed_confirm_keeps_selection() {
    let backend = MockBackend::start().await;
    backend.respond(CONFIRM, 500, json!({ "error": "write conflict" }));

    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());
    let mut rx = state.events.subscribe();

    let mut review = review();
    review.select_suggestion("m1", 1).unwrap();
    let before = review.selected().clone();

    let err = review.confirm(&state.client).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Client(ClientError::Api { status: 500, ref message }) if message == "write conflict"
    ));
    assert_eq!(review.selected(), &before);
    assert_eq!(review.counts().total, 3);
    assert!(matches!(rx.try_recv(), Ok(DashEvent::MappingConfirmFailed { .. })));
}

#[tokio::test]
async fn test_confirm_with_nothing_selected_sends_nothing() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());

    let mut review = review();
    assert!(!review.can_confirm());
    assert!(matches!(
        review.confirm(&state.client).await,
        Err(WorkflowError::NothingSelected)
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_alternative_becomes_new_mapping() {
    let backend = MockBackend::start().await;
    backend.respond(
        ALTERNATIVES,
        200,
        json!({
            "alternatives": [
                { "uuid": "p-7", "name": "polyethylene, granulate", "location": "RER", "similarity": 0.81 },
                { "uuid": "p-8", "name": "polypropylene, granulate", "similarity": 0.3 }
            ]
        }),
    );

    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());

    let alternatives = ReviewList::find_alternatives(&state.client, "Mystery polymer")
        .await
        .unwrap();
    assert_eq!(alternatives.len(), 2);
    assert!(alternatives.iter().all(|a| a.new_mapping));
    assert_eq!(alternatives[0].confidence_level, ConfidenceLevel::High);
    assert_eq!(alternatives[1].confidence_level, ConfidenceLevel::Low);

    let request = &backend.requests_to(ALTERNATIVES)[0];
    assert_eq!(request.json(), json!({ "materialName": "Mystery polymer" }));

    let mut review = review();
    review.select("3", alternatives[0].clone()).unwrap();
    let mapped: Vec<&str> = review
        .filtered(ReviewFilter::Mapped, "")
        .into_iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(mapped, vec!["3"]);
}

#[tokio::test]
async fn test_selected_alternative_confirms_as_new_mapping() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            ALTERNATIVES,
            200,
            json!({
                "alternatives": [
                    { "uuid": "p-7", "name": "polyethylene, granulate", "similarity": 0.81 },
                    { "uuid": "p-8", "name": "polypropylene, granulate", "similarity": 0.3 }
                ]
            }),
        )
        .respond(CONFIRM, 200, json!({ "message": "Mappings saved" }));

    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());

    let mut review = review();
    review.select_suggestion("m1", 0).unwrap();
    review
        .select_alternative(&state.client, "3", "p-8")
        .await
        .unwrap();

    // Searched by the material's name, not its id
    let search = &backend.requests_to(ALTERNATIVES)[0];
    assert_eq!(search.json(), json!({ "materialName": "Mystery polymer" }));

    assert_eq!(review.confirm(&state.client).await.unwrap(), 2);
    let body = backend.requests_to(CONFIRM)[0].json();
    assert_eq!(body["mappings"]["3"]["activityUuid"], "p-8");
    assert_eq!(body["mappings"]["3"]["newMapping"], true);
    assert_eq!(body["mappings"]["m1"]["newMapping"], false);
}

#[tokio::test]
async fn test_unknown_alternative_leaves_selection_alone() {
    let backend = MockBackend::start().await;
    backend.respond(ALTERNATIVES, 200, json!({ "alternatives": [] }));

    let dir = TempDir::new().unwrap();
    let state = dash_state(&backend, dir.path());

    let mut review = review();
    let err = review
        .select_alternative(&state.client, "3", "p-7")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::UnknownAlternative { ref material_id, ref activity_uuid }
            if material_id == "3" && activity_uuid == "p-7"
    ));
    assert!(review.selected().is_empty());

    assert!(matches!(
        review.select_alternative(&state.client, "nope", "p-7").await,
        Err(WorkflowError::UnknownMaterial(_))
    ));
    assert_eq!(backend.requests_to(ALTERNATIVES).len(), 1);
}

#[test]
fn test_mapped_and_unmapped_partition_any_search() {
    let mut review = review();
    review.select_suggestion("m2", 0).unwrap();

    for search in ["", "steel", "COTTON", "poly", "zzz", " "] {
        let all = review.filtered(ReviewFilter::All, search).len();
        let mapped = review.filtered(ReviewFilter::Mapped, search).len();
        let unmapped = review.filtered(ReviewFilter::Unmapped, search).len();
        assert_eq!(mapped + unmapped, all, "search {:?}", search);
    }
}
