//! Declarative domain models and the descriptors derived from them.
//!
//! Applications declare a [`ModelSpec`] per table at process start; the
//! registry derives an immutable [`ModelDescriptor`] from each one. There is
//! no runtime reflection: the declaration carries everything the query layer
//! needs (types, nullability, vector/fulltext flags, index names), and
//! derivation is a deterministic, fallible transform.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Safe identifier pattern shared by tables, fields, and index names.
static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Check whether a name is safe to embed in a statement as an identifier.
pub fn is_safe_identifier(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// Type as written in a model declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclaredType {
    Text,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Optional(Box<DeclaredType>),
    List(Box<DeclaredType>),
    Mapping,
    /// Explicit reference to a record in the named table. Used where the
    /// `*_id` naming convention does not apply, such as the `in`/`out`
    /// endpoints of an edge table.
    Reference(String),
}

/// Semantic type after derivation, as rendered into DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    Option(Box<SemanticType>),
    Array(Box<SemanticType>),
    Object,
    /// Reference to a record in the named table.
    Record(String),
}

impl SemanticType {
    /// Render as a SurrealDB type expression.
    pub fn render(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Timestamp => "datetime".to_string(),
            Self::Option(inner) => format!("option<{}>", inner.render()),
            Self::Array(inner) => format!("array<{}>", inner.render()),
            Self::Object => "object".to_string(),
            Self::Record(table) => format!("record<{table}>"),
        }
    }

    /// The table this type refers to, if it is (or wraps) a record reference.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Record(table) => Some(table),
            Self::Option(inner) | Self::Array(inner) => inner.reference(),
            _ => None,
        }
    }
}

/// One field in a model declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub ty: DeclaredType,
    pub nullable: bool,
    pub vector: bool,
    pub fulltext: bool,
    pub index: Option<String>,
    /// Suppress record-reference inference for `*_id` fields that hold
    /// external identifiers rather than references to our own tables.
    pub plain_text: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            vector: false,
            fulltext: false,
            index: None,
            plain_text: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Decimal)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Boolean)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::DateTime)
    }

    pub fn mapping(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Mapping)
    }

    pub fn list(name: impl Into<String>, inner: DeclaredType) -> Self {
        Self::new(name, DeclaredType::List(Box::new(inner)))
    }

    pub fn reference(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Reference(table.into()))
    }

    /// Mark the field as nullable (`option<T>` in the generated schema).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Claim the model's single vector-field slot.
    pub fn vector(mut self) -> Self {
        self.vector = true;
        self
    }

    /// Flag the field for full-text search.
    pub fn fulltext(mut self) -> Self {
        self.fulltext = true;
        self
    }

    /// Declare a named index over this field.
    pub fn indexed(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Keep a `*_id` text field as a plain string (external identifier).
    pub fn plain(mut self) -> Self {
        self.plain_text = true;
        self
    }
}

/// A declared domain model: one table plus its fields and graph role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub table: String,
    pub fields: Vec<FieldSpec>,
    pub graph_node: bool,
    pub graph_edge: bool,
}

impl ModelSpec {
    /// A bare model with no fields.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            graph_node: false,
            graph_edge: false,
        }
    }

    /// A model pre-populated with the tenant-scoped base fields every
    /// Engram table carries: `id`, `tenant_id`, `created_at`, `updated_at`,
    /// `is_deleted`.
    pub fn tenant_scoped(table: impl Into<String>) -> Self {
        let table = table.into();
        let tenant_index = format!("idx_{table}_tenant_id");
        Self::new(table)
            .field(FieldSpec::text("id").plain())
            .field(FieldSpec::text("tenant_id").plain().indexed(tenant_index))
            .field(FieldSpec::datetime("created_at"))
            .field(FieldSpec::datetime("updated_at"))
            .field(FieldSpec::boolean("is_deleted"))
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Mark this model as the graph node table.
    pub fn graph_node(mut self) -> Self {
        self.graph_node = true;
        self
    }

    /// Mark this model as the graph edge table.
    pub fn graph_edge(mut self) -> Self {
        self.graph_edge = true;
        self
    }

    /// Derive the immutable descriptor for this model.
    pub fn derive(&self) -> Result<ModelDescriptor, SchemaError> {
        if !is_safe_identifier(&self.table) {
            return Err(SchemaError::InvalidIdentifier(self.table.clone()));
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(self.fields.len());
        let mut indexes: Vec<IndexDef> = Vec::new();
        let mut vector_field: Option<String> = None;
        let mut fulltext_fields: Vec<String> = Vec::new();

        for spec in &self.fields {
            if !is_safe_identifier(&spec.name) {
                return Err(SchemaError::InvalidIdentifier(spec.name.clone()));
            }
            if let DeclaredType::Reference(table) = &spec.ty {
                if !is_safe_identifier(table) {
                    return Err(SchemaError::InvalidIdentifier(table.clone()));
                }
            }
            if fields.iter().any(|f| f.name == spec.name) {
                return Err(SchemaError::DuplicateField {
                    table: self.table.clone(),
                    field: spec.name.clone(),
                });
            }

            let ty = resolve_type(&spec.ty, &spec.name, spec.plain_text, spec.nullable);
            let reference = ty.reference().map(str::to_string);

            if spec.vector {
                if let Some(first) = &vector_field {
                    return Err(SchemaError::DuplicateVectorField {
                        table: self.table.clone(),
                        first: first.clone(),
                        second: spec.name.clone(),
                    });
                }
                vector_field = Some(spec.name.clone());
            }
            if spec.fulltext {
                fulltext_fields.push(spec.name.clone());
            }
            if let Some(index) = &spec.index {
                if !is_safe_identifier(index) {
                    return Err(SchemaError::InvalidIdentifier(index.clone()));
                }
                if indexes.iter().any(|i| &i.name == index) {
                    return Err(SchemaError::DuplicateIndex {
                        table: self.table.clone(),
                        index: index.clone(),
                    });
                }
                indexes.push(IndexDef {
                    name: index.clone(),
                    field: spec.name.clone(),
                });
            }

            fields.push(FieldDescriptor {
                name: spec.name.clone(),
                ty,
                nullable: spec.nullable,
                reference,
                is_vector: spec.vector,
                is_fulltext: spec.fulltext,
                index: spec.index.clone(),
            });
        }

        Ok(ModelDescriptor {
            table: self.table.clone(),
            fields,
            indexes,
            vector_field,
            fulltext_fields,
            graph_node: self.graph_node,
            graph_edge: self.graph_edge,
        })
    }
}

/// Map a declared type to its semantic type.
///
/// A text field named `foo_id` becomes a reference to table `foo` unless the
/// declaration opts out with `plain()`; a list of text named `foo_ids`
/// becomes an array of references. `id` and `tenant_id` never infer.
fn resolve_type(ty: &DeclaredType, name: &str, plain: bool, nullable: bool) -> SemanticType {
    let inner = resolve_bare(ty, name, plain);
    if nullable {
        SemanticType::Option(Box::new(inner))
    } else {
        inner
    }
}

fn resolve_bare(ty: &DeclaredType, name: &str, plain: bool) -> SemanticType {
    match ty {
        DeclaredType::Text => match infer_reference(name, plain) {
            Some(table) => SemanticType::Record(table),
            None => SemanticType::String,
        },
        DeclaredType::Integer => SemanticType::Int,
        DeclaredType::Decimal => SemanticType::Float,
        DeclaredType::Boolean => SemanticType::Bool,
        DeclaredType::DateTime => SemanticType::Timestamp,
        DeclaredType::Optional(inner) => {
            SemanticType::Option(Box::new(resolve_bare(inner, name, plain)))
        }
        DeclaredType::List(inner) => {
            if let DeclaredType::Text = **inner {
                if !plain {
                    if let Some(prefix) = name.strip_suffix("_ids") {
                        if is_safe_identifier(prefix) {
                            return SemanticType::Array(Box::new(SemanticType::Record(
                                prefix.to_string(),
                            )));
                        }
                    }
                }
            }
            SemanticType::Array(Box::new(resolve_bare(inner, name, plain)))
        }
        DeclaredType::Mapping => SemanticType::Object,
        DeclaredType::Reference(table) => SemanticType::Record(table.clone()),
    }
}

fn infer_reference(name: &str, plain: bool) -> Option<String> {
    if plain || name == "id" || name == "tenant_id" {
        return None;
    }
    let prefix = name.strip_suffix("_id")?;
    if prefix.is_empty() || !is_safe_identifier(prefix) {
        return None;
    }
    Some(prefix.to_string())
}

/// Derived persistence metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: SemanticType,
    pub nullable: bool,
    pub reference: Option<String>,
    pub is_vector: bool,
    pub is_fulltext: bool,
    pub index: Option<String>,
}

/// A single-field index declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub field: String,
}

/// Derived persistence metadata for one table. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub table: String,
    pub fields: Vec<FieldDescriptor>,
    pub indexes: Vec<IndexDef>,
    pub vector_field: Option<String>,
    pub fulltext_fields: Vec<String>,
    pub graph_node: bool,
    pub graph_edge: bool,
}

impl ModelDescriptor {
    /// Look up a field descriptor by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The single fulltext field, when exactly the query layer needs one.
    pub fn fulltext_field(&self) -> Option<&str> {
        self.fulltext_fields.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("name", true; "plain word")]
    #[test_case("_private", true; "leading underscore")]
    #[test_case("field_2", true; "trailing digit")]
    #[test_case("2field", false; "leading digit")]
    #[test_case("drop table", false; "embedded space")]
    #[test_case("a;b", false; "semicolon")]
    #[test_case("", false; "empty")]
    fn identifier_pattern(name: &str, ok: bool) {
        assert_eq!(is_safe_identifier(name), ok);
    }

    #[test]
    fn type_mapping_is_deterministic() {
        let spec = ModelSpec::new("sample")
            .field(FieldSpec::text("title"))
            .field(FieldSpec::integer("count"))
            .field(FieldSpec::decimal("score"))
            .field(FieldSpec::boolean("flag"))
            .field(FieldSpec::datetime("seen_at"))
            .field(FieldSpec::text("note").nullable())
            .field(FieldSpec::list("tags", DeclaredType::Text))
            .field(FieldSpec::mapping("data"));
        let desc = spec.derive().unwrap();

        assert_eq!(desc.field("title").unwrap().ty, SemanticType::String);
        assert_eq!(desc.field("count").unwrap().ty, SemanticType::Int);
        assert_eq!(desc.field("score").unwrap().ty, SemanticType::Float);
        assert_eq!(desc.field("flag").unwrap().ty, SemanticType::Bool);
        assert_eq!(desc.field("seen_at").unwrap().ty, SemanticType::Timestamp);
        assert_eq!(
            desc.field("note").unwrap().ty,
            SemanticType::Option(Box::new(SemanticType::String))
        );
        assert_eq!(
            desc.field("tags").unwrap().ty,
            SemanticType::Array(Box::new(SemanticType::String))
        );
        assert_eq!(desc.field("data").unwrap().ty, SemanticType::Object);
    }

    #[test]
    fn record_reference_inferred_from_id_suffix() {
        let desc = ModelSpec::new("event")
            .field(FieldSpec::text("entity_id"))
            .derive()
            .unwrap();
        let field = desc.field("entity_id").unwrap();
        assert_eq!(field.ty, SemanticType::Record("entity".to_string()));
        assert_eq!(field.reference.as_deref(), Some("entity"));
    }

    #[test]
    fn explicit_reference_resolves_without_name_convention() {
        let desc = ModelSpec::new("relation")
            .field(FieldSpec::reference("in", "entity"))
            .derive()
            .unwrap();
        let field = desc.field("in").unwrap();
        assert_eq!(field.ty, SemanticType::Record("entity".to_string()));
        assert_eq!(field.reference.as_deref(), Some("entity"));
    }

    #[test]
    fn unsafe_reference_table_is_rejected() {
        let err = ModelSpec::new("relation")
            .field(FieldSpec::reference("in", "bad table"))
            .derive()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier(_)));
    }

    #[test]
    fn plain_opts_out_of_reference_inference() {
        let desc = ModelSpec::new("job")
            .field(FieldSpec::text("source_id").plain())
            .derive()
            .unwrap();
        assert_eq!(desc.field("source_id").unwrap().ty, SemanticType::String);
        assert!(desc.field("source_id").unwrap().reference.is_none());
    }

    #[test]
    fn id_and_tenant_id_never_infer() {
        let desc = ModelSpec::tenant_scoped("entity").derive().unwrap();
        assert_eq!(desc.field("id").unwrap().ty, SemanticType::String);
        assert_eq!(desc.field("tenant_id").unwrap().ty, SemanticType::String);
    }

    #[test]
    fn ids_list_becomes_record_array() {
        let desc = ModelSpec::new("event")
            .field(FieldSpec::list("artifact_ids", DeclaredType::Text))
            .derive()
            .unwrap();
        assert_eq!(
            desc.field("artifact_ids").unwrap().ty,
            SemanticType::Array(Box::new(SemanticType::Record("artifact".to_string())))
        );
    }

    #[test]
    fn second_vector_field_is_rejected() {
        let err = ModelSpec::new("chunk")
            .field(FieldSpec::list("embedding", DeclaredType::Decimal).vector())
            .field(FieldSpec::list("other", DeclaredType::Decimal).vector())
            .derive()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateVectorField { .. }));
    }

    #[test]
    fn index_name_collision_is_rejected() {
        let err = ModelSpec::new("entity")
            .field(FieldSpec::text("name").indexed("idx_dup"))
            .field(FieldSpec::text("entity_type").indexed("idx_dup"))
            .derive()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateIndex { .. }));
    }

    #[test]
    fn unsafe_field_name_is_rejected() {
        let err = ModelSpec::new("entity")
            .field(FieldSpec::text("bad name"))
            .derive()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier(_)));
    }

    #[test]
    fn nullable_wraps_in_option() {
        let desc = ModelSpec::new("chunk")
            .field(FieldSpec::list("embedding", DeclaredType::Decimal).nullable().vector())
            .derive()
            .unwrap();
        assert_eq!(
            desc.field("embedding").unwrap().ty.render(),
            "option<array<float>>"
        );
        assert_eq!(desc.vector_field.as_deref(), Some("embedding"));
    }
}
