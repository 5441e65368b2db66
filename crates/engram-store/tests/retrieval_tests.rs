//! End-to-end retrieval paths against an in-memory backend.

mod common;

use serde_json::json;

use engram_store::{GraphSearch, StoreError};

#[tokio::test]
async fn exact_match_round_trip() {
    let store = common::memory_store().await;
    common::seed_entity(&store, "t1", "Ada Lovelace", "person").await;
    common::seed_entity(&store, "t1", "Analytical Engine", "artifact").await;

    let rows = store
        .execute_exact_match_query(
            "entity",
            vec![("name".to_string(), json!("Ada Lovelace"))],
            "t1",
            Some(10),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Ada Lovelace"));
    assert_eq!(rows[0]["tenant_id"], json!("t1"));
    assert_eq!(rows[0]["is_deleted"], json!(false));
}

#[tokio::test]
async fn tenants_are_isolated() {
    let store = common::memory_store().await;
    common::seed_entity(&store, "t1", "shared-name", "person").await;
    common::seed_entity(&store, "t2", "shared-name", "person").await;

    let rows = store
        .execute_exact_match_query(
            "entity",
            vec![("name".to_string(), json!("shared-name"))],
            "t1",
            None,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tenant_id"], json!("t1"));
}

#[tokio::test]
async fn injection_shaped_values_stay_inert() {
    let store = common::memory_store().await;
    let hostile = "'; DELETE entity; --";
    common::seed_entity(&store, "t1", hostile, "person").await;
    common::seed_entity(&store, "t1", "bystander", "person").await;

    // The hostile string is an ordinary value: it matches itself and
    // nothing else, and the rest of the table survives.
    let rows = store
        .execute_exact_match_query(
            "entity",
            vec![("name".to_string(), json!(hostile))],
            "t1",
            None,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let all = store
        .execute_exact_match_query("entity", vec![], "t1", None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn unsafe_filter_field_fails_before_io() {
    let store = common::memory_store().await;
    let err = store
        .execute_exact_match_query(
            "entity",
            vec![("name; DROP TABLE entity".to_string(), json!("x"))],
            "t1",
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn unknown_table_fails_before_io() {
    let store = common::memory_store().await;
    let err = store
        .execute_exact_match_query("no_such_table", vec![], "t1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn vector_query_ranks_by_similarity() {
    let store = common::memory_store().await;
    common::seed_chunk(&store, "t1", "aligned", vec![1.0, 0.0]).await;
    common::seed_chunk(&store, "t1", "orthogonal", vec![0.0, 1.0]).await;

    let rows = store
        .execute_vector_query("t1", vec![1.0, 0.0], Some(5))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["text"], json!("aligned"));
    let top = rows[0]["similarity_score"].as_f64().unwrap();
    let bottom = rows[1]["similarity_score"].as_f64().unwrap();
    assert!((top - 1.0).abs() < 1e-9);
    assert!(bottom.abs() < 1e-9);
}

#[tokio::test]
async fn vector_query_skips_rows_without_embeddings() {
    let store = common::memory_store().await;
    common::seed_chunk(&store, "t1", "with-vector", vec![0.5, 0.5]).await;
    common::seed_chunk_without_embedding(&store, "t1", "no-vector").await;

    let rows = store
        .execute_vector_query("t1", vec![0.5, 0.5], None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["text"], json!("with-vector"));
}

#[tokio::test]
async fn fulltext_query_scores_matching_rows() {
    let store = common::memory_store().await;
    common::seed_chunk(&store, "t1", "the quick brown fox", vec![1.0, 0.0]).await;
    common::seed_chunk(&store, "t1", "a sleepy cat", vec![0.0, 1.0]).await;

    let rows = store
        .execute_fulltext_query("t1", "fox", None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["text"], json!("the quick brown fox"));
    let score = rows[0]["relevance_score"]
        .as_f64()
        .expect("numeric relevance score");
    assert!(score > 0.0);
}

#[tokio::test]
async fn fulltext_query_is_tenant_scoped() {
    let store = common::memory_store().await;
    common::seed_chunk(&store, "t1", "shared term fox", vec![1.0, 0.0]).await;
    common::seed_chunk(&store, "t2", "shared term fox", vec![1.0, 0.0]).await;

    let rows = store
        .execute_fulltext_query("t1", "fox", None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tenant_id"], json!("t1"));
}

#[tokio::test]
async fn combined_query_with_vector_leg() {
    let store = common::memory_store().await;
    common::seed_chunk(&store, "t1", "aligned", vec![1.0, 0.0]).await;
    common::seed_chunk(&store, "t1", "opposite", vec![-1.0, 0.0]).await;

    let results = store
        .execute_combined_query(
            "t1",
            engram_store::CombinedSearch {
                embedding: Some(vec![1.0, 0.0]),
                limit: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(results.main.len(), 2);
    assert_eq!(results.main[0]["text"], json!("aligned"));
    assert!(results.graph.is_empty());
}

#[tokio::test]
async fn upsert_with_id_is_idempotent() {
    let store = common::memory_store().await;
    for status in ["queued", "running"] {
        store
            .upsert_record(
                "job",
                Some("job-1"),
                json!({
                    "tenant_id": "t1",
                    "source_id": "external-1",
                    "status": status,
                    "attempts": 0,
                    "payload": {},
                }),
            )
            .await
            .unwrap();
    }

    let rows = store
        .execute_exact_match_query("job", vec![], "t1", None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], json!("running"));
}

#[tokio::test]
async fn upsert_rejects_non_object_content() {
    let store = common::memory_store().await;
    let err = store
        .upsert_record("job", None, json!("not an object"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn graph_depth_bounds_fail_before_any_execution() {
    let store = common::memory_store().await;
    let mut search = GraphSearch::new(vec!["entity:1".to_string()]);
    search.min_depth = 0;
    search.max_depth = 11;
    let err = store.execute_graph_query("t1", search).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn graph_query_requires_seeds() {
    let store = common::memory_store().await;
    let err = store
        .execute_graph_query("t1", GraphSearch::new(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
