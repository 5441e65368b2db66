//! Built-in domain models for the Engram memory store.
//!
//! These are the tables the surrounding application layer declares: ingested
//! sources, knowledge-graph entities and relations, text chunks (the vector
//! and fulltext surface), and ingestion jobs. All are tenant-scoped.

use crate::model::{DeclaredType, FieldSpec, ModelSpec};

/// The default model set registered at startup.
pub fn default_models() -> Vec<ModelSpec> {
    vec![source(), entity(), relation(), chunk(), job()]
}

fn source() -> ModelSpec {
    ModelSpec::tenant_scoped("source")
        .field(FieldSpec::text("name").indexed("idx_source_name"))
        .field(FieldSpec::text("source_type").indexed("idx_source_type"))
        .field(FieldSpec::text("uri").nullable())
        .field(FieldSpec::mapping("data"))
}

fn entity() -> ModelSpec {
    ModelSpec::tenant_scoped("entity")
        .graph_node()
        .field(FieldSpec::text("name").indexed("idx_entity_name"))
        .field(FieldSpec::text("entity_type").indexed("idx_entity_type"))
        .field(FieldSpec::mapping("data"))
}

fn relation() -> ModelSpec {
    // Edge rows are written with RELATE, so the endpoints live in the
    // `in`/`out` fields the database populates, typed as entity records.
    ModelSpec::tenant_scoped("relation")
        .graph_edge()
        .field(FieldSpec::reference("in", "entity"))
        .field(FieldSpec::reference("out", "entity"))
        .field(FieldSpec::text("relation_type").indexed("idx_relation_type"))
        .field(FieldSpec::decimal("weight").nullable())
        .field(FieldSpec::mapping("data"))
}

fn chunk() -> ModelSpec {
    ModelSpec::tenant_scoped("chunk")
        .field(FieldSpec::text("source_id"))
        .field(FieldSpec::integer("chunk_index"))
        .field(FieldSpec::text("text").fulltext().indexed("idx_chunk_text"))
        .field(
            FieldSpec::list("embedding", DeclaredType::Decimal)
                .nullable()
                .vector(),
        )
}

fn job() -> ModelSpec {
    // source_id here is the external identifier handed to the worker, not a
    // reference into the source table.
    ModelSpec::tenant_scoped("job")
        .field(FieldSpec::text("source_id").plain())
        .field(FieldSpec::text("status").indexed("idx_job_status"))
        .field(FieldSpec::integer("attempts"))
        .field(FieldSpec::mapping("payload"))
        .field(FieldSpec::text("error").nullable())
}
