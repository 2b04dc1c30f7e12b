use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root of every schema `$ref` produced by the reflector. Emitters rewrite it
/// for dialects that keep definitions elsewhere.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A JSON Schema type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    /// The first non-null member of the set.
    pub fn primary(&self) -> Option<SchemaType> {
        match self {
            TypeSet::Single(t) => Some(*t),
            TypeSet::Multiple(types) => types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .or_else(|| types.first().copied()),
        }
    }

    pub fn contains(&self, ty: SchemaType) -> bool {
        match self {
            TypeSet::Single(t) => *t == ty,
            TypeSet::Multiple(types) => types.contains(&ty),
        }
    }
}

/// A reference or inline schema. A reference carries nothing but its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    /// Reference to a named component schema.
    pub fn component(name: &str) -> Self {
        SchemaOrRef::Ref {
            ref_path: format!("{SCHEMA_REF_PREFIX}{name}"),
        }
    }

    pub fn inline(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }

    /// The schema that accepts any value.
    pub fn any() -> Self {
        SchemaOrRef::inline(Schema::default())
    }

    /// Component name for references created by [`SchemaOrRef::component`].
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            SchemaOrRef::Ref { ref_path } => ref_path.strip_prefix(SCHEMA_REF_PREFIX),
            SchemaOrRef::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(s) => Some(s),
            SchemaOrRef::Ref { .. } => None,
        }
    }

    /// Visit this node and every nested node, depth first.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut SchemaOrRef)) {
        f(self);
        if let SchemaOrRef::Schema(schema) = self {
            schema.walk_children_mut(f);
        }
    }
}

impl From<Schema> for SchemaOrRef {
    fn from(schema: Schema) -> Self {
        SchemaOrRef::inline(schema)
    }
}

/// `exclusiveMinimum` / `exclusiveMaximum`: a flag modifying the plain bound
/// (2.0, 3.0) or the bound itself (3.1+).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exclusive {
    Flag(bool),
    Bound(#[serde(serialize_with = "serialize_bound")] f64),
}

fn serialize_bound<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serialize_number(&Some(*value), serializer)
}

/// Serialize bounds without a fractional part as integers (`1`, not `1.0`).
#[allow(clippy::ref_option)] // serde serialize_with mandates &Option<T>
pub(crate) fn serialize_number<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            #[allow(clippy::cast_possible_truncation)]
            let int_val = *v as i64;
            serializer.serialize_some(&int_val)
        }
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// A JSON Schema object, the common node type of both dialects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    // Object properties
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    // Array items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    // Composition
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    // Enum values
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    // Numeric constraints
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub minimum: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub maximum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Exclusive>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Exclusive>,
    #[serde(
        rename = "multipleOf",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub multiple_of: Option<f64>,

    // String constraints
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Array constraints
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    // Read/Write only
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// `x-` vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Schema {
    pub fn typed(ty: SchemaType) -> Self {
        Schema {
            schema_type: Some(TypeSet::Single(ty)),
            ..Schema::default()
        }
    }

    pub fn formatted(ty: SchemaType, format: &str) -> Self {
        Schema {
            format: Some(format.to_string()),
            ..Schema::typed(ty)
        }
    }

    pub fn array(items: SchemaOrRef) -> Self {
        Schema {
            items: Some(Box::new(items)),
            ..Schema::typed(SchemaType::Array)
        }
    }

    pub fn map(values: SchemaOrRef) -> Self {
        Schema {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Schema::typed(SchemaType::Object)
        }
    }

    /// The primary (non-null) type of this schema, if declared.
    pub fn primary_type(&self) -> Option<SchemaType> {
        self.schema_type.as_ref().and_then(TypeSet::primary)
    }

    fn walk_children_mut(&mut self, f: &mut dyn FnMut(&mut SchemaOrRef)) {
        for prop in self.properties.values_mut() {
            prop.walk_mut(f);
        }
        if let Some(items) = self.items.as_mut() {
            items.walk_mut(f);
        }
        if let Some(AdditionalProperties::Schema(values)) = self.additional_properties.as_mut() {
            values.walk_mut(f);
        }
        for sub in self
            .all_of
            .iter_mut()
            .chain(self.one_of.iter_mut())
            .chain(self.any_of.iter_mut())
        {
            sub.walk_mut(f);
        }
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_serializes_alone() {
        let node = SchemaOrRef::component("models.Item");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"$ref": "#/components/schemas/models.Item"}));
        assert_eq!(node.ref_name(), Some("models.Item"));
    }

    #[test]
    fn test_primary_type_skips_null() {
        let set = TypeSet::Multiple(vec![SchemaType::Null, SchemaType::String]);
        assert_eq!(set.primary(), Some(SchemaType::String));
        assert!(set.contains(SchemaType::Null));
    }

    #[test]
    fn test_walk_reaches_nested_refs() {
        let mut inner = Schema::typed(SchemaType::Object);
        inner
            .properties
            .insert("child".into(), SchemaOrRef::component("a.Node"));
        let mut node = SchemaOrRef::inline(Schema::array(SchemaOrRef::inline(inner)));

        let mut seen = Vec::new();
        node.walk_mut(&mut |n| {
            if let Some(name) = n.ref_name() {
                seen.push(name.to_string());
            }
        });
        assert_eq!(seen, vec!["a.Node"]);
    }

    #[test]
    fn test_extensions_flatten() {
        let mut schema = Schema::typed(SchemaType::String);
        schema
            .extensions
            .insert("x-nullable".into(), serde_json::Value::Bool(true));
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json, serde_json::json!({"type": "string", "x-nullable": true}));
    }
}
