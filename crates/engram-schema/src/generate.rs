//! DDL generation from model descriptors.
//!
//! Every emitted statement is an `IF NOT EXISTS` form, so applying the
//! schema twice neither errors nor duplicates definitions. Tables (with
//! their fields) render before indexes, indexes before the global custom
//! functions.

use crate::registry::ModelRegistry;

/// Analyzer backing all fulltext search indexes.
pub const TEXT_ANALYZER: &str = "engram_text";

/// Name of the provisioned cosine-similarity function, without the `fn::`
/// prefix SurrealDB adds at call sites.
pub const COSINE_FUNCTION: &str = "cosine_similarity";

/// Render the ordered, idempotent DDL for every registered model.
pub fn generate(registry: &ModelRegistry) -> Vec<String> {
    let mut statements = Vec::new();

    for model in registry.models() {
        let mut table_stmt = format!("DEFINE TABLE IF NOT EXISTS {} SCHEMAFULL", model.table);
        if model.graph_edge {
            // Edge tables must be declared as relations or RELATE refuses
            // to write into them under SCHEMAFULL.
            let in_table = model.field("in").and_then(|f| f.reference.as_deref());
            let out_table = model.field("out").and_then(|f| f.reference.as_deref());
            if let (Some(in_table), Some(out_table)) = (in_table, out_table) {
                table_stmt.push_str(&format!(" TYPE RELATION IN {in_table} OUT {out_table}"));
            } else {
                table_stmt.push_str(" TYPE RELATION");
            }
        }
        statements.push(table_stmt);
        for field in &model.fields {
            // `id` is implicit on every SurrealDB table, and `in`/`out` are
            // declared by the TYPE RELATION clause.
            if field.name == "id" || (model.graph_edge && matches!(field.name.as_str(), "in" | "out"))
            {
                continue;
            }
            let mut stmt = format!(
                "DEFINE FIELD IF NOT EXISTS {} ON {} TYPE {}",
                field.name,
                model.table,
                field.ty.render()
            );
            match field.name.as_str() {
                "created_at" | "updated_at" => stmt.push_str(" DEFAULT time::now()"),
                "is_deleted" => stmt.push_str(" DEFAULT false"),
                _ => {}
            }
            statements.push(stmt);
        }
    }

    for model in registry.models() {
        for index in &model.indexes {
            statements.push(format!(
                "DEFINE INDEX IF NOT EXISTS {} ON {} FIELDS {}",
                index.name, model.table, index.field
            ));
        }
    }

    let has_fulltext = registry.models().any(|m| !m.fulltext_fields.is_empty());
    if has_fulltext {
        statements.push(format!(
            "DEFINE ANALYZER IF NOT EXISTS {TEXT_ANALYZER} TOKENIZERS class FILTERS lowercase"
        ));
        for model in registry.models() {
            for field in &model.fulltext_fields {
                statements.push(format!(
                    "DEFINE INDEX IF NOT EXISTS idx_{}_{}_search ON {} FIELDS {} \
                     SEARCH ANALYZER {TEXT_ANALYZER} BM25 HIGHLIGHTS",
                    model.table, field, model.table, field
                ));
            }
        }
    }

    statements.push(cosine_function_ddl());
    statements
}

/// The store-level cosine-similarity function.
///
/// Mismatched lengths and zero-magnitude inputs score 0.0 rather than
/// erroring, matching the in-process implementation used for
/// post-processing.
fn cosine_function_ddl() -> String {
    format!(
        "DEFINE FUNCTION IF NOT EXISTS fn::{COSINE_FUNCTION}($a: array<float>, $b: array<float>) {{\n\
         \tIF array::len($a) != array::len($b) {{ RETURN 0.0; }};\n\
         \tLET $na = vector::magnitude($a);\n\
         \tLET $nb = vector::magnitude($b);\n\
         \tIF $na == 0.0 OR $nb == 0.0 {{ RETURN 0.0; }};\n\
         \tRETURN vector::dot($a, $b) / ($na * $nb);\n\
         }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::default_models;

    fn registry() -> ModelRegistry {
        ModelRegistry::build(&default_models()).unwrap()
    }

    #[test]
    fn every_statement_is_idempotent() {
        for stmt in generate(&registry()) {
            assert!(
                stmt.contains("IF NOT EXISTS"),
                "statement is not idempotent: {stmt}"
            );
        }
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate(&registry()), generate(&registry()));
    }

    #[test]
    fn tables_render_before_their_indexes() {
        let statements = generate(&registry());
        let table_pos = statements
            .iter()
            .position(|s| s.starts_with("DEFINE TABLE IF NOT EXISTS chunk"))
            .unwrap();
        let index_pos = statements
            .iter()
            .position(|s| s.starts_with("DEFINE INDEX IF NOT EXISTS idx_chunk_text"))
            .unwrap();
        assert!(table_pos < index_pos);
    }

    #[test]
    fn cosine_function_renders_once_and_last() {
        let statements = generate(&registry());
        let functions: Vec<_> = statements
            .iter()
            .filter(|s| s.contains("fn::cosine_similarity"))
            .collect();
        assert_eq!(functions.len(), 1);
        assert!(statements.last().unwrap().contains("fn::cosine_similarity"));
    }

    #[test]
    fn fulltext_field_gets_a_search_index() {
        let statements = generate(&registry());
        assert!(statements
            .iter()
            .any(|s| s.contains("idx_chunk_text_search") && s.contains("SEARCH ANALYZER")));
        assert!(statements
            .iter()
            .any(|s| s.starts_with("DEFINE ANALYZER IF NOT EXISTS engram_text")));
    }

    #[test]
    fn timestamps_default_to_now() {
        let statements = generate(&registry());
        assert!(statements
            .iter()
            .any(|s| s.contains("created_at ON chunk") && s.contains("DEFAULT time::now()")));
    }

    #[test]
    fn edge_table_declares_its_relation_endpoints() {
        let statements = generate(&registry());
        assert!(statements.iter().any(|s| {
            s.starts_with("DEFINE TABLE IF NOT EXISTS relation")
                && s.contains("TYPE RELATION IN entity OUT entity")
        }));
        for stmt in &statements {
            assert!(!stmt.starts_with("DEFINE FIELD IF NOT EXISTS in ON relation"));
            assert!(!stmt.starts_with("DEFINE FIELD IF NOT EXISTS out ON relation"));
        }
    }

    #[test]
    fn id_field_is_not_defined_explicitly() {
        for stmt in generate(&registry()) {
            assert!(!stmt.starts_with("DEFINE FIELD IF NOT EXISTS id ON"));
        }
    }
}
