//! Declarative constraints and explicit overrides.
//!
//! A [`Constraints`] set is built from a parsed annotation (or by hand),
//! validated as a whole, and then placed either on a schema node (3.x) or
//! directly on a 2.0 parameter. Application never mutates its input node:
//! schemas are cloned first, and references are wrapped in `allOf` so the
//! shared definition they point to stays untouched.

use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::document::v2;
use crate::error::{ConstraintError, ConstraintErrors};
use crate::schema::{Exclusive, Schema, SchemaOrRef, SchemaType, TypeSet};
use crate::tag::{TagOptions, parse_options};

/// Validation rules and metadata attachable to a schema or parameter.
///
/// Enum, default and example values stay raw until placement, where they are
/// coerced according to the target schema type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub description: Option<String>,
    pub title: Option<String>,
    pub format: Option<String>,
    /// Explicit type override, `|`-separated for unions (`string|null`).
    pub type_override: Option<String>,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub example: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<bool>,
    pub exclusive_maximum: Option<bool>,
    pub multiple_of: Option<f64>,

    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub pattern: Option<String>,

    pub min_items: Option<i64>,
    pub max_items: Option<i64>,
    pub unique_items: Option<bool>,

    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub nullable: Option<bool>,
    pub deprecated: Option<bool>,
    pub required: Option<bool>,

    parse_errors: Vec<ConstraintError>,
}

impl Constraints {
    /// Parse an annotation string such as `"minimum=1,maximum=10"`.
    pub fn parse(annotation: &str) -> Self {
        Self::from_options(&parse_options(annotation))
    }

    pub fn from_options(options: &TagOptions) -> Self {
        let mut c = Constraints::default();
        for (key, value) in options.iter() {
            match key {
                "description" => c.description = Some(value.to_string()),
                "title" => c.title = Some(value.to_string()),
                "format" => c.format = Some(value.to_string()),
                "type" => c.type_override = Some(value.to_string()),
                "enum" => {
                    c.enum_values = value
                        .split('|')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                "default" => c.default = Some(value.to_string()),
                "example" => c.example = Some(value.to_string()),
                "minimum" => c.minimum = c.number(key, value),
                "maximum" => c.maximum = c.number(key, value),
                "exclusiveMinimum" => c.exclusive_minimum = c.flag(key, value),
                "exclusiveMaximum" => c.exclusive_maximum = c.flag(key, value),
                "multipleOf" => c.multiple_of = c.number(key, value),
                "minLength" => c.min_length = c.integer(key, value),
                "maxLength" => c.max_length = c.integer(key, value),
                "pattern" => c.pattern = Some(value.to_string()),
                "minItems" => c.min_items = c.integer(key, value),
                "maxItems" => c.max_items = c.integer(key, value),
                "uniqueItems" => c.unique_items = c.flag(key, value),
                "readOnly" => c.read_only = c.flag(key, value),
                "writeOnly" => c.write_only = c.flag(key, value),
                "nullable" => c.nullable = c.flag(key, value),
                "deprecated" => c.deprecated = c.flag(key, value),
                "required" => c.required = c.flag(key, value),
                other => debug!("ignoring unknown annotation key {other}"),
            }
        }
        if let Some(ty) = c.type_override.clone()
            && parse_type_set(&ty).is_none()
        {
            c.parse_errors
                .push(ConstraintError::new("type", format!("unknown type \"{ty}\"")));
        }
        c
    }

    fn number(&mut self, key: &str, value: &str) -> Option<f64> {
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                self.parse_errors.push(ConstraintError::new(
                    key,
                    format!("\"{value}\" is not a number"),
                ));
                None
            }
        }
    }

    fn integer(&mut self, key: &str, value: &str) -> Option<i64> {
        match value.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.parse_errors.push(ConstraintError::new(
                    key,
                    format!("\"{value}\" is not an integer"),
                ));
                None
            }
        }
    }

    fn flag(&mut self, key: &str, value: &str) -> Option<bool> {
        match value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.parse_errors.push(ConstraintError::new(
                    key,
                    format!("\"{value}\" is not a boolean"),
                ));
                None
            }
        }
    }

    /// Check every rule; all violations are collected.
    pub fn validate(&self) -> ConstraintErrors {
        let mut errors = self.parse_errors.clone();

        if let (Some(min), Some(max)) = (self.minimum, self.maximum)
            && min > max
        {
            errors.push(ConstraintError::new(
                "minimum",
                format!("minimum ({min}) must not exceed maximum ({max})"),
            ));
        }

        check_bounds(
            &mut errors,
            ("minLength", self.min_length),
            ("maxLength", self.max_length),
        );
        check_bounds(
            &mut errors,
            ("minItems", self.min_items),
            ("maxItems", self.max_items),
        );

        if let Some(m) = self.multiple_of
            && m <= 0.0
        {
            errors.push(ConstraintError::new(
                "multipleOf",
                format!("multipleOf ({m}) must be greater than zero"),
            ));
        }

        if let Some(ref pattern) = self.pattern
            && let Err(e) = Regex::new(pattern)
        {
            let detail = e.to_string();
            let summary = detail.lines().last().unwrap_or(detail.as_str()).trim();
            errors.push(ConstraintError::new(
                "pattern",
                format!("invalid regular expression \"{pattern}\": {summary}"),
            ));
        }

        ConstraintErrors(errors)
    }

    /// Whether the set carries anything that lands on a schema node.
    fn touches_schema(&self) -> bool {
        *self
            != Constraints {
                format: self.format.clone(),
                type_override: self.type_override.clone(),
                required: self.required,
                parse_errors: self.parse_errors.clone(),
                ..Constraints::default()
            }
    }
}

fn check_bounds(
    errors: &mut Vec<ConstraintError>,
    (min_key, min): (&str, Option<i64>),
    (max_key, max): (&str, Option<i64>),
) {
    for (key, bound) in [(min_key, min), (max_key, max)] {
        if let Some(v) = bound
            && v < 0
        {
            errors.push(ConstraintError::new(
                key,
                format!("{key} ({v}) must be non-negative"),
            ));
        }
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo >= 0
        && hi >= 0
        && lo > hi
    {
        errors.push(ConstraintError::new(
            min_key,
            format!("{min_key} ({lo}) must not exceed {max_key} ({hi})"),
        ));
    }
}

/// Parse `string` or `integer|null` into a type set.
pub fn parse_type_set(raw: &str) -> Option<TypeSet> {
    let types = raw
        .split('|')
        .map(SchemaType::parse)
        .collect::<Option<Vec<_>>>()?;
    match types.as_slice() {
        [] => None,
        [single] => Some(TypeSet::Single(*single)),
        _ => Some(TypeSet::Multiple(types)),
    }
}

/// Coerce a raw annotation value into JSON for a schema of type `ty`.
pub fn coerce_value(raw: &str, ty: Option<SchemaType>) -> Value {
    let coerced = match ty {
        Some(SchemaType::Integer) => raw.trim().parse::<i64>().ok().map(Value::from),
        Some(SchemaType::Number) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Some(SchemaType::Boolean) => raw.trim().parse::<bool>().ok().map(Value::Bool),
        Some(SchemaType::Array | SchemaType::Object) => serde_json::from_str(raw).ok(),
        Some(SchemaType::String | SchemaType::Null) | None => None,
    };
    coerced.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Apply explicit overrides. Precedence: full schema override, then
/// type/format override, then the inferred node.
pub fn apply_overrides(
    node: &SchemaOrRef,
    type_override: Option<&str>,
    format_override: Option<&str>,
    schema_override: Option<&SchemaOrRef>,
) -> SchemaOrRef {
    if let Some(schema) = schema_override {
        return schema.clone();
    }

    let type_set = type_override.and_then(parse_type_set);
    if type_set.is_none() && format_override.is_none() {
        return node.clone();
    }

    let mut schema = match (node, &type_set) {
        // An explicit type replaces whatever the reference pointed to.
        (SchemaOrRef::Ref { .. }, Some(_)) => Schema::default(),
        (SchemaOrRef::Ref { .. }, None) => wrap_ref(node),
        (SchemaOrRef::Schema(s), _) => s.as_ref().clone(),
    };

    if let Some(set) = type_set {
        schema.schema_type = Some(set);
        schema.format = None;
    }
    if let Some(format) = format_override {
        schema.format = Some(format.to_string());
    }
    SchemaOrRef::inline(schema)
}

/// Place constraints on a schema node (3.x placement and record fields).
pub fn apply_to_schema(node: &SchemaOrRef, c: &Constraints) -> SchemaOrRef {
    if !c.touches_schema() {
        return node.clone();
    }

    let mut schema = match node {
        SchemaOrRef::Ref { .. } => wrap_ref(node),
        SchemaOrRef::Schema(s) => s.as_ref().clone(),
    };
    let ty = schema.primary_type();

    if let Some(ref d) = c.description {
        schema.description = Some(d.clone());
    }
    if let Some(ref t) = c.title {
        schema.title = Some(t.clone());
    }
    if !c.enum_values.is_empty() {
        schema.enum_values = c.enum_values.iter().map(|v| coerce_value(v, ty)).collect();
    }
    if let Some(ref d) = c.default {
        schema.default_value = Some(coerce_value(d, ty));
    }
    if let Some(ref e) = c.example {
        schema.example = Some(coerce_value(e, ty));
    }

    if c.minimum.is_some() {
        schema.minimum = c.minimum;
    }
    if c.maximum.is_some() {
        schema.maximum = c.maximum;
    }
    if let Some(flag) = c.exclusive_minimum {
        schema.exclusive_minimum = Some(Exclusive::Flag(flag));
    }
    if let Some(flag) = c.exclusive_maximum {
        schema.exclusive_maximum = Some(Exclusive::Flag(flag));
    }
    if c.multiple_of.is_some() {
        schema.multiple_of = c.multiple_of;
    }

    if let Some(v) = non_negative(c.min_length) {
        schema.min_length = Some(v);
    }
    if let Some(v) = non_negative(c.max_length) {
        schema.max_length = Some(v);
    }
    if let Some(ref p) = c.pattern {
        schema.pattern = Some(p.clone());
    }

    if let Some(v) = non_negative(c.min_items) {
        schema.min_items = Some(v);
    }
    if let Some(v) = non_negative(c.max_items) {
        schema.max_items = Some(v);
    }
    if c.unique_items.is_some() {
        schema.unique_items = c.unique_items;
    }

    if c.read_only == Some(true) {
        schema.read_only = Some(true);
    }
    if c.write_only == Some(true) {
        schema.write_only = Some(true);
    }
    if c.nullable == Some(true) {
        schema.nullable = Some(true);
    }
    if c.deprecated == Some(true) {
        schema.deprecated = Some(true);
    }

    SchemaOrRef::inline(schema)
}

/// Project a parameter schema onto the 2.0 parameter's own fields: type,
/// format, array items and any constraints the schema already carries.
///
/// Union types contribute their primary, non-null branch. Returns `false`
/// when the schema has no shape a non-body parameter can express.
pub fn project_onto_parameter(param: &mut v2::Parameter, node: &SchemaOrRef) -> bool {
    let Some(schema) = node.as_schema() else {
        return false;
    };
    let Some(ty) = schema.primary_type() else {
        return false;
    };
    let Some(param_type) = v2::ParameterType::from_schema_type(ty) else {
        return false;
    };

    param.param_type = Some(param_type);
    param.format = schema.format.clone();
    if param_type == v2::ParameterType::Array {
        param.items = schema.items.as_deref().and_then(project_items);
        param.collection_format = Some("csv".to_string());
    }
    if schema.nullable == Some(true)
        || schema
            .schema_type
            .as_ref()
            .is_some_and(|t| t.contains(SchemaType::Null))
    {
        param.nullable = Some(true);
    }

    param.enum_values = schema.enum_values.clone();
    param.default_value = schema.default_value.clone();
    param.minimum = schema.minimum;
    param.maximum = schema.maximum;
    param.exclusive_minimum = schema.exclusive_minimum;
    param.exclusive_maximum = schema.exclusive_maximum;
    param.multiple_of = schema.multiple_of;
    param.min_length = schema.min_length;
    param.max_length = schema.max_length;
    param.pattern = schema.pattern.clone();
    param.min_items = schema.min_items;
    param.max_items = schema.max_items;
    param.unique_items = schema.unique_items;
    if param.description.is_none() {
        param.description = schema.description.clone();
    }
    if param.example.is_none() {
        param.example = schema.example.clone();
    }
    true
}

fn project_items(node: &SchemaOrRef) -> Option<v2::Items> {
    let schema = node.as_schema()?;
    let item_type = schema
        .primary_type()
        .and_then(v2::ParameterType::from_schema_type)?;
    Some(v2::Items {
        item_type: Some(item_type),
        format: schema.format.clone(),
        items: schema
            .items
            .as_deref()
            .and_then(project_items)
            .map(Box::new),
        enum_values: schema.enum_values.clone(),
    })
}

/// Place constraints directly on a 2.0 parameter (2.0 placement).
pub fn apply_to_parameter(param: &mut v2::Parameter, c: &Constraints) {
    let ty = param.param_type.and_then(|t| match t {
        v2::ParameterType::String | v2::ParameterType::File => Some(SchemaType::String),
        v2::ParameterType::Number => Some(SchemaType::Number),
        v2::ParameterType::Integer => Some(SchemaType::Integer),
        v2::ParameterType::Boolean => Some(SchemaType::Boolean),
        v2::ParameterType::Array => Some(SchemaType::Array),
    });

    if let Some(ref d) = c.description {
        param.description = Some(d.clone());
    }
    if !c.enum_values.is_empty() {
        param.enum_values = c.enum_values.iter().map(|v| coerce_value(v, ty)).collect();
    }
    if let Some(ref d) = c.default {
        param.default_value = Some(coerce_value(d, ty));
    }
    if let Some(ref e) = c.example {
        param.example = Some(coerce_value(e, ty));
    }
    if c.minimum.is_some() {
        param.minimum = c.minimum;
    }
    if c.maximum.is_some() {
        param.maximum = c.maximum;
    }
    if let Some(flag) = c.exclusive_minimum {
        param.exclusive_minimum = Some(Exclusive::Flag(flag));
    }
    if let Some(flag) = c.exclusive_maximum {
        param.exclusive_maximum = Some(Exclusive::Flag(flag));
    }
    if c.multiple_of.is_some() {
        param.multiple_of = c.multiple_of;
    }
    if let Some(v) = non_negative(c.min_length) {
        param.min_length = Some(v);
    }
    if let Some(v) = non_negative(c.max_length) {
        param.max_length = Some(v);
    }
    if let Some(ref p) = c.pattern {
        param.pattern = Some(p.clone());
    }
    if let Some(v) = non_negative(c.min_items) {
        param.min_items = Some(v);
    }
    if let Some(v) = non_negative(c.max_items) {
        param.max_items = Some(v);
    }
    if c.unique_items.is_some() {
        param.unique_items = c.unique_items;
    }
    if c.nullable == Some(true) {
        param.nullable = Some(true);
    }
    if c.deprecated == Some(true) {
        param.deprecated = Some(true);
    }
}

fn wrap_ref(node: &SchemaOrRef) -> Schema {
    Schema {
        all_of: vec![node.clone()],
        ..Schema::default()
    }
}

fn non_negative(v: Option<i64>) -> Option<u64> {
    v.and_then(|n| u64::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int64() -> SchemaOrRef {
        SchemaOrRef::inline(Schema::formatted(SchemaType::Integer, "int64"))
    }

    #[test]
    fn test_parse_recognised_keys() {
        let c = Constraints::parse(
            "description=Page size,minimum=1,maximum=100,enum=10|50|100,default=50,readOnly",
        );
        assert_eq!(c.description.as_deref(), Some("Page size"));
        assert_eq!(c.minimum, Some(1.0));
        assert_eq!(c.maximum, Some(100.0));
        assert_eq!(c.enum_values, vec!["10", "50", "100"]);
        assert_eq!(c.default.as_deref(), Some("50"));
        assert_eq!(c.read_only, Some(true));
        assert!(c.validate().is_empty());
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let c = Constraints::parse("minimum=10,maximum=1,minLength=-1,pattern=[unclosed");
        let errors = c.validate();
        assert_eq!(errors.len(), 3, "got: {errors}");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["minimum", "minLength", "pattern"]);
    }

    #[test]
    fn test_validate_length_and_item_order() {
        let c = Constraints::parse("minLength=5,maxLength=2,minItems=3,maxItems=1");
        let errors = c.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.to_string().contains("minLength (5) must not exceed maxLength (2)"));
        assert!(errors.to_string().contains("minItems (3) must not exceed maxItems (1)"));
    }

    #[test]
    fn test_validate_multiple_of_and_parse_errors() {
        let c = Constraints::parse("multipleOf=0,maximum=ten,type=text");
        let errors = c.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["maximum", "type", "multipleOf"]);
    }

    #[test]
    fn test_apply_to_schema_copies() {
        let original = int64();
        let c = Constraints::parse("minimum=1,enum=1|2|3,example=2");
        let applied = apply_to_schema(&original, &c);
        assert_eq!(original, int64());

        let s = applied.as_schema().unwrap();
        assert_eq!(s.minimum, Some(1.0));
        assert_eq!(s.enum_values, vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(s.example, Some(Value::from(2)));
    }

    #[test]
    fn test_apply_to_ref_wraps() {
        let node = SchemaOrRef::component("models.Item");
        let applied = apply_to_schema(&node, &Constraints::parse("description=The item"));
        let s = applied.as_schema().unwrap();
        assert_eq!(s.all_of, vec![node]);
        assert_eq!(s.description.as_deref(), Some("The item"));
    }

    #[test]
    fn test_empty_constraints_keep_node() {
        let node = SchemaOrRef::component("models.Item");
        assert_eq!(apply_to_schema(&node, &Constraints::parse("required")), node);
    }

    #[test]
    fn test_override_precedence() {
        let inferred = int64();
        let explicit = SchemaOrRef::inline(Schema::typed(SchemaType::Boolean));

        let full = apply_overrides(&inferred, Some("string"), Some("uuid"), Some(&explicit));
        assert_eq!(full, explicit);

        let typed = apply_overrides(&inferred, Some("string"), Some("uuid"), None);
        let s = typed.as_schema().unwrap();
        assert_eq!(s.schema_type, Some(TypeSet::Single(SchemaType::String)));
        assert_eq!(s.format.as_deref(), Some("uuid"));

        assert_eq!(apply_overrides(&inferred, None, None, None), inferred);
    }

    #[test]
    fn test_type_override_drops_inferred_format() {
        let s = apply_overrides(&int64(), Some("string|null"), None, None);
        let s = s.as_schema().unwrap();
        assert_eq!(
            s.schema_type,
            Some(TypeSet::Multiple(vec![SchemaType::String, SchemaType::Null]))
        );
        assert_eq!(s.format, None);
    }

    #[test]
    fn test_project_union_picks_primary() {
        let node = apply_overrides(&int64(), Some("null|integer"), Some("int64"), None);
        let mut param = v2::Parameter::new("id", v2::ParameterLocation::Path);
        assert!(project_onto_parameter(&mut param, &node));
        assert_eq!(param.param_type, Some(v2::ParameterType::Integer));
        assert_eq!(param.format.as_deref(), Some("int64"));
        assert_eq!(param.nullable, Some(true));
    }

    #[test]
    fn test_project_array_items() {
        let node = SchemaOrRef::inline(Schema::array(SchemaOrRef::inline(Schema::typed(
            SchemaType::String,
        ))));
        let mut param = v2::Parameter::new("tags", v2::ParameterLocation::Query);
        assert!(project_onto_parameter(&mut param, &node));
        assert_eq!(param.param_type, Some(v2::ParameterType::Array));
        assert_eq!(
            param.items.as_ref().and_then(|i| i.item_type),
            Some(v2::ParameterType::String)
        );
    }

    #[test]
    fn test_project_ref_fails() {
        let mut param = v2::Parameter::new("filter", v2::ParameterLocation::Query);
        assert!(!project_onto_parameter(
            &mut param,
            &SchemaOrRef::component("models.Filter")
        ));
    }

    #[test]
    fn test_apply_to_parameter() {
        let mut param = v2::Parameter::new("limit", v2::ParameterLocation::Query);
        param.param_type = Some(v2::ParameterType::Integer);
        apply_to_parameter(&mut param, &Constraints::parse("minimum=1,maximum=100,default=20"));
        assert_eq!(param.minimum, Some(1.0));
        assert_eq!(param.maximum, Some(100.0));
        assert_eq!(param.default_value, Some(Value::from(20)));
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("7", Some(SchemaType::Integer)), Value::from(7));
        assert_eq!(coerce_value("true", Some(SchemaType::Boolean)), Value::Bool(true));
        assert_eq!(
            coerce_value("[1,2]", Some(SchemaType::Array)),
            serde_json::json!([1, 2])
        );
        assert_eq!(coerce_value("x", Some(SchemaType::Integer)), Value::from("x"));
        assert_eq!(coerce_value("7", None), Value::from("7"));
    }
}
