//! Per-dialect emission rules, selected once per build.

use log::debug;

use crate::document::OpenApiVersion;
use crate::ir::{HttpMethod, ParamLocation};
use crate::schema::{Exclusive, SCHEMA_REF_PREFIX, Schema, SchemaOrRef, SchemaType, TypeSet};

/// Where request payloads go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadPlacement {
    /// A synthetic `in: body` parameter (2.0).
    BodyParameter,
    /// A `requestBody` with a content map (3.x).
    RequestBody,
}

/// Where parameter constraints go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintPlacement {
    Parameter,
    Schema,
}

/// How a nullable schema is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullableStyle {
    /// `x-nullable: true` (2.0)
    Extension,
    /// `nullable: true` (3.0)
    Flag,
    /// `type: [T, "null"]` (3.1+)
    TypeUnion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    pub version: OpenApiVersion,
    pub schema_root: &'static str,
    pub parameter_root: &'static str,
    pub response_root: &'static str,
    pub payload: PayloadPlacement,
    pub constraints: ConstraintPlacement,
    pub nullable: NullableStyle,
}

impl TargetProfile {
    pub fn for_version(version: OpenApiVersion) -> Self {
        match version {
            OpenApiVersion::V2_0 => Self {
                version,
                schema_root: "#/definitions/",
                parameter_root: "#/parameters/",
                response_root: "#/responses/",
                payload: PayloadPlacement::BodyParameter,
                constraints: ConstraintPlacement::Parameter,
                nullable: NullableStyle::Extension,
            },
            _ => Self {
                version,
                schema_root: SCHEMA_REF_PREFIX,
                parameter_root: "#/components/parameters/",
                response_root: "#/components/responses/",
                payload: PayloadPlacement::RequestBody,
                constraints: ConstraintPlacement::Schema,
                nullable: if version.uses_json_schema_2020() {
                    NullableStyle::TypeUnion
                } else {
                    NullableStyle::Flag
                },
            },
        }
    }

    pub fn supports_method(&self, method: HttpMethod) -> bool {
        match method {
            HttpMethod::Trace => !self.version.is_v2(),
            HttpMethod::Query => self.version >= OpenApiVersion::V3_2,
            _ => true,
        }
    }

    pub fn supports_location(&self, location: ParamLocation) -> bool {
        !(self.version.is_v2() && location == ParamLocation::Cookie)
    }

    pub fn parameter_ref(&self, name: &str) -> String {
        format!("{}{name}", self.parameter_root)
    }

    pub fn response_ref(&self, name: &str) -> String {
        format!("{}{name}", self.response_root)
    }

    /// Rewrite a canonical schema node into this dialect: reference roots,
    /// nullability, exclusive bounds and keywords the dialect lacks.
    pub fn finish_schema(&self, node: &SchemaOrRef) -> SchemaOrRef {
        let mut out = node.clone();
        out.walk_mut(&mut |n| match n {
            SchemaOrRef::Ref { ref_path } => {
                if let Some(name) = ref_path.strip_prefix(SCHEMA_REF_PREFIX) {
                    *ref_path = format!("{}{name}", self.schema_root);
                }
            }
            SchemaOrRef::Schema(schema) => self.finish_keywords(schema),
        });
        out
    }

    fn finish_keywords(&self, schema: &mut Schema) {
        match self.nullable {
            NullableStyle::TypeUnion => {
                to_type_union(schema);
                to_exclusive_bounds(schema);
            }
            NullableStyle::Flag => collapse_type_set(schema),
            NullableStyle::Extension => {
                collapse_type_set(schema);
                if schema.nullable.take() == Some(true) {
                    schema
                        .extensions
                        .insert("x-nullable".to_string(), serde_json::Value::Bool(true));
                }
                if schema.write_only.take().is_some() {
                    debug!("writeOnly has no 2.0 equivalent, dropped");
                }
                if schema.deprecated.take() == Some(true) {
                    schema
                        .extensions
                        .insert("x-deprecated".to_string(), serde_json::Value::Bool(true));
                }
            }
        }
    }
}

/// 3.1+: `nullable` becomes a `null` member of the type set.
fn to_type_union(schema: &mut Schema) {
    if schema.nullable.take() != Some(true) {
        return;
    }
    match schema.schema_type.take() {
        Some(TypeSet::Single(SchemaType::Null)) => {
            schema.schema_type = Some(TypeSet::Single(SchemaType::Null));
        }
        Some(TypeSet::Single(t)) => {
            schema.schema_type = Some(TypeSet::Multiple(vec![t, SchemaType::Null]));
        }
        Some(TypeSet::Multiple(mut types)) => {
            if !types.contains(&SchemaType::Null) {
                types.push(SchemaType::Null);
            }
            schema.schema_type = Some(TypeSet::Multiple(types));
        }
        None if schema.all_of.len() == 1 => {
            let inner = schema.all_of.remove(0);
            schema.any_of = vec![inner, SchemaOrRef::inline(Schema::typed(SchemaType::Null))];
        }
        // An untyped schema already admits null.
        None => {}
    }
}

/// 3.1+: boolean exclusive flags become numeric bounds.
fn to_exclusive_bounds(schema: &mut Schema) {
    if let Some(Exclusive::Flag(flag)) = schema.exclusive_minimum {
        schema.exclusive_minimum = None;
        if flag {
            schema.exclusive_minimum = schema.minimum.take().map(Exclusive::Bound);
        }
    }
    if let Some(Exclusive::Flag(flag)) = schema.exclusive_maximum {
        schema.exclusive_maximum = None;
        if flag {
            schema.exclusive_maximum = schema.maximum.take().map(Exclusive::Bound);
        }
    }
}

/// Before 3.1 a type is a single name; `null` members turn into nullability.
fn collapse_type_set(schema: &mut Schema) {
    match schema.schema_type.take() {
        Some(TypeSet::Multiple(types)) => {
            if types.contains(&SchemaType::Null) {
                schema.nullable = Some(true);
            }
            schema.schema_type = types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .or_else(|| types.first().copied())
                .map(TypeSet::Single);
        }
        other => schema.schema_type = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nullable_int() -> SchemaOrRef {
        SchemaOrRef::inline(Schema {
            nullable: Some(true),
            ..Schema::formatted(SchemaType::Integer, "int64")
        })
    }

    #[test]
    fn test_method_support() {
        let v2 = TargetProfile::for_version(OpenApiVersion::V2_0);
        let v31 = TargetProfile::for_version(OpenApiVersion::V3_1);
        let v32 = TargetProfile::for_version(OpenApiVersion::V3_2);
        assert!(!v2.supports_method(HttpMethod::Trace));
        assert!(v31.supports_method(HttpMethod::Trace));
        assert!(!v31.supports_method(HttpMethod::Query));
        assert!(v32.supports_method(HttpMethod::Query));
        assert!(!v2.supports_location(ParamLocation::Cookie));
    }

    #[test]
    fn test_ref_roots() {
        let node = SchemaOrRef::component("models.Item");
        let v2 = TargetProfile::for_version(OpenApiVersion::V2_0);
        let v30 = TargetProfile::for_version(OpenApiVersion::V3_0);
        assert_eq!(
            v2.finish_schema(&node),
            SchemaOrRef::Ref {
                ref_path: "#/definitions/models.Item".into()
            }
        );
        assert_eq!(v30.finish_schema(&node), node);
        assert_eq!(v2.parameter_ref("limit"), "#/parameters/limit");
        assert_eq!(v30.response_ref("NotFound"), "#/components/responses/NotFound");
    }

    #[test]
    fn test_nullable_per_dialect() {
        let v2 = TargetProfile::for_version(OpenApiVersion::V2_0).finish_schema(&nullable_int());
        let v30 = TargetProfile::for_version(OpenApiVersion::V3_0).finish_schema(&nullable_int());
        let v31 = TargetProfile::for_version(OpenApiVersion::V3_1).finish_schema(&nullable_int());

        let v2 = v2.as_schema().unwrap();
        assert_eq!(v2.nullable, None);
        assert_eq!(v2.extensions["x-nullable"], serde_json::Value::Bool(true));

        assert_eq!(v30.as_schema().unwrap().nullable, Some(true));

        let v31 = v31.as_schema().unwrap();
        assert_eq!(v31.nullable, None);
        assert_eq!(
            v31.schema_type,
            Some(TypeSet::Multiple(vec![SchemaType::Integer, SchemaType::Null]))
        );
    }

    #[test]
    fn test_single_type_kept_before_31() {
        let node = SchemaOrRef::inline(Schema::array(SchemaOrRef::inline(Schema::formatted(
            SchemaType::Integer,
            "int64",
        ))));
        for version in [OpenApiVersion::V2_0, OpenApiVersion::V3_0] {
            let out = TargetProfile::for_version(version).finish_schema(&node);
            assert_eq!(out, node, "{version}");
        }

        let union = SchemaOrRef::inline(Schema {
            schema_type: Some(TypeSet::Multiple(vec![SchemaType::Null, SchemaType::String])),
            ..Schema::default()
        });
        let out = TargetProfile::for_version(OpenApiVersion::V3_0).finish_schema(&union);
        let s = out.as_schema().unwrap();
        assert_eq!(s.schema_type, Some(TypeSet::Single(SchemaType::String)));
        assert_eq!(s.nullable, Some(true));
    }

    #[test]
    fn test_exclusive_bounds_in_31() {
        let node = SchemaOrRef::inline(Schema {
            minimum: Some(0.0),
            exclusive_minimum: Some(Exclusive::Flag(true)),
            maximum: Some(10.0),
            exclusive_maximum: Some(Exclusive::Flag(false)),
            ..Schema::typed(SchemaType::Number)
        });
        let out = TargetProfile::for_version(OpenApiVersion::V3_1).finish_schema(&node);
        let s = out.as_schema().unwrap();
        assert_eq!(s.minimum, None);
        assert_eq!(s.exclusive_minimum, Some(Exclusive::Bound(0.0)));
        assert_eq!(s.maximum, Some(10.0));
        assert_eq!(s.exclusive_maximum, None);

        let kept = TargetProfile::for_version(OpenApiVersion::V3_0).finish_schema(&node);
        assert_eq!(kept, node);
    }

    #[test]
    fn test_nested_refs_rewritten() {
        let node = SchemaOrRef::inline(Schema::array(SchemaOrRef::component("models.Item")));
        let out = TargetProfile::for_version(OpenApiVersion::V2_0).finish_schema(&node);
        assert_eq!(
            out.as_schema().unwrap().items.as_deref(),
            Some(&SchemaOrRef::Ref {
                ref_path: "#/definitions/models.Item".into()
            })
        );
    }
}
