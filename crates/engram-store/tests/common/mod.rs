//! Shared fixtures for store integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::{json, Value};

use engram_query::Statement;
use engram_schema::ModelRegistry;
use engram_store::Store;

/// Fresh in-memory store with the default schema applied.
pub async fn memory_store() -> Store {
    let store = Store::memory().await.expect("in-memory store");
    store
        .init_schema(ModelRegistry::global())
        .await
        .expect("schema init");
    store
}

/// Insert an entity row through the parameterized upsert path.
pub async fn seed_entity(store: &Store, tenant_id: &str, name: &str, entity_type: &str) {
    store
        .upsert_record(
            "entity",
            None,
            json!({
                "tenant_id": tenant_id,
                "name": name,
                "entity_type": entity_type,
                "data": {},
            }),
        )
        .await
        .expect("seed entity");
}

/// Insert an entity row under a fixed record key so tests can reference
/// it as `entity:<key>`.
pub async fn seed_keyed_entity(store: &Store, tenant_id: &str, key: &str) {
    store
        .upsert_record(
            "entity",
            Some(key),
            json!({
                "tenant_id": tenant_id,
                "name": key,
                "entity_type": "node",
                "data": {},
            }),
        )
        .await
        .expect("seed keyed entity");
}

/// Connect two entities with an edge row.
pub async fn link(store: &Store, tenant_id: &str, from_key: &str, to_key: &str) {
    store
        .create_relation(
            &format!("entity:{from_key}"),
            &format!("entity:{to_key}"),
            json!({
                "tenant_id": tenant_id,
                "relation_type": "connected",
                "data": {},
            }),
        )
        .await
        .expect("link entities");
}

/// Seed a chain of entities `hub -> k1 -> k2 -> ...`, creating each node
/// and the edge from its predecessor.
pub async fn seed_chain(store: &Store, tenant_id: &str, hub: &str, keys: &[&str]) {
    let mut previous = hub.to_string();
    for key in keys {
        seed_keyed_entity(store, tenant_id, key).await;
        link(store, tenant_id, &previous, key).await;
        previous = (*key).to_string();
    }
}

/// Insert a chunk row with an embedding. The source reference is built
/// server-side with `type::thing` so the record-typed field coerces.
pub async fn seed_chunk(store: &Store, tenant_id: &str, text: &str, embedding: Vec<f64>) {
    let mut params: HashMap<String, Value> = HashMap::new();
    params.insert("tenant".to_string(), json!(tenant_id));
    params.insert("text".to_string(), json!(text));
    params.insert("embedding".to_string(), json!(embedding));
    let statement = Statement {
        text: "CREATE chunk CONTENT { \
               tenant_id: $tenant, \
               source_id: type::thing('source', rand::ulid()), \
               chunk_index: 0, \
               text: $text, \
               embedding: $embedding }"
            .to_string(),
        params,
    };
    store.execute(&statement).await.expect("seed chunk");
}

/// Insert a chunk row with no stored vector; the `embedding` field is
/// omitted so it stays NONE.
pub async fn seed_chunk_without_embedding(store: &Store, tenant_id: &str, text: &str) {
    let mut params: HashMap<String, Value> = HashMap::new();
    params.insert("tenant".to_string(), json!(tenant_id));
    params.insert("text".to_string(), json!(text));
    let statement = Statement {
        text: "CREATE chunk CONTENT { \
               tenant_id: $tenant, \
               source_id: type::thing('source', rand::ulid()), \
               chunk_index: 0, \
               text: $text }"
            .to_string(),
        params,
    };
    store.execute(&statement).await.expect("seed chunk");
}
