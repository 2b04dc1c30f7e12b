use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::NamingStrategy;
use crate::constraint::{Constraints, apply_overrides, apply_to_schema};
use crate::describe::{Describe, Field, Primitive, RecordDesc, SpecialType, TypeDesc, TypeKey, TypeKind};
use crate::error::Issue;
use crate::schema::{Schema, SchemaOrRef, SchemaType};
use crate::tag::parse_wire_tag;

use super::naming::{TypePath, qualified_name, schema_name, special_by_path};
use super::registry::SchemaRegistry;

/// Compiles type descriptions into schema nodes.
///
/// Named records are registered once and referenced everywhere else; a record
/// met again while it is still expanding yields a reference to its reserved
/// name, which is how self-referential types terminate.
#[derive(Debug, Default)]
pub struct Reflector {
    registry: SchemaRegistry,
    strategy: NamingStrategy,
    embedding: HashSet<TypeKey>,
    issues: Vec<Issue>,
}

impl Reflector {
    pub fn new(strategy: NamingStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    pub fn generate<T: Describe>(&mut self) -> SchemaOrRef {
        self.generate_desc(&T::describe(), None)
    }

    /// Generate `T`, registering it under `name` if it is a new named record.
    pub fn generate_named<T: Describe>(&mut self, name: &str) -> SchemaOrRef {
        self.generate_desc(&T::describe(), Some(name))
    }

    pub fn generate_desc(&mut self, desc: &TypeDesc, name: Option<&str>) -> SchemaOrRef {
        self.generate_tracked(desc, name).0
    }

    /// Named definitions in registration order.
    pub fn definitions(&self) -> IndexMap<String, Schema> {
        self.registry.definitions()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Hand recorded issues over to the caller.
    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    /// Generate and report whether an optional layer was unwrapped.
    fn generate_tracked(&mut self, desc: &TypeDesc, name: Option<&str>) -> (SchemaOrRef, bool) {
        let (desc, nullable) = unwrap_indirection(desc);
        let node = self.generate_inner(&desc, name);
        if nullable {
            (mark_nullable(node), true)
        } else {
            (node, false)
        }
    }

    fn generate_inner(&mut self, desc: &TypeDesc, name: Option<&str>) -> SchemaOrRef {
        let special = match desc.kind {
            TypeKind::Special(s) => Some(s),
            _ => special_by_path(&desc.key),
        };
        if let Some(special) = special {
            return SchemaOrRef::inline(special_schema(special));
        }

        match &desc.kind {
            TypeKind::Record(rec) if rec.anonymous => self.generate_anonymous(desc, rec),
            TypeKind::Record(rec) => self.generate_record(desc, rec, name),
            TypeKind::Sequence(item) => {
                let items = self.generate_desc(&item(), None);
                SchemaOrRef::inline(Schema::array(items))
            }
            TypeKind::Map(value) => {
                let values = self.generate_desc(&value(), None);
                SchemaOrRef::inline(Schema::map(values))
            }
            TypeKind::Primitive(p) => SchemaOrRef::inline(primitive_schema(*p)),
            TypeKind::Any => SchemaOrRef::any(),
            TypeKind::Special(_) | TypeKind::Optional(_) | TypeKind::Pointer(_) => {
                warn!("unrepresentable type {:?}, using an unconstrained schema", desc.key);
                SchemaOrRef::any()
            }
        }
    }

    fn generate_record(
        &mut self,
        desc: &TypeDesc,
        rec: &RecordDesc,
        name: Option<&str>,
    ) -> SchemaOrRef {
        let key = desc.key;

        if self.registry.get(&key).is_some()
            && let Some(existing) = self.registry.name_for(&key)
        {
            debug!("cache hit for {key:?} ({existing})");
            return SchemaOrRef::component(existing);
        }

        if self.registry.is_in_progress(&key) {
            return match self.registry.name_for(&key) {
                Some(reserved) => {
                    debug!("cycle through {key:?}, referencing {reserved}");
                    SchemaOrRef::component(reserved)
                }
                None => {
                    warn!("cycle through unnamed type {key:?}, using an unconstrained schema");
                    SchemaOrRef::any()
                }
            };
        }

        let name = self.reserve_name(&key, name);
        self.registry.bind_name(key, &name);
        self.registry.mark_in_progress(key);
        let schema = self.expand_record(rec, &name);
        self.registry.set(key, Some(&name), schema);
        self.registry.clear_in_progress(&key);
        debug!("registered {key:?} as {name}");

        SchemaOrRef::component(&name)
    }

    fn generate_anonymous(&mut self, desc: &TypeDesc, rec: &RecordDesc) -> SchemaOrRef {
        let key = desc.key;
        if let Some(cached) = self.registry.get(&key) {
            return SchemaOrRef::inline(cached.clone());
        }
        if self.registry.is_in_progress(&key) {
            warn!("cycle through anonymous type {key:?}, using an unconstrained schema");
            return SchemaOrRef::any();
        }

        let owner = TypePath::parse(key.path()).display;
        self.registry.mark_in_progress(key);
        let schema = self.expand_record(rec, &owner);
        self.registry.set(key, None, schema.clone());
        self.registry.clear_in_progress(&key);

        SchemaOrRef::inline(schema)
    }

    /// Pick the final component name for `key`. A name held by a different
    /// type is widened to the full module path, then suffixed.
    fn reserve_name(&self, key: &TypeKey, requested: Option<&str>) -> String {
        if let Some(bound) = self.registry.name_for(key) {
            return bound.to_string();
        }

        let base = match requested {
            Some(name) => name.to_string(),
            None => schema_name(key, self.strategy),
        };
        if self.is_free(&base, key) {
            return base;
        }

        let widened = match requested {
            Some(_) => base.clone(),
            None => qualified_name(key),
        };
        if widened != base && self.is_free(&widened, key) {
            debug!("name {base} is taken, using {widened} for {key:?}");
            return widened;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{widened}_{n}");
            if self.is_free(&candidate, key) {
                debug!("name {base} is taken, using {candidate} for {key:?}");
                return candidate;
            }
            n += 1;
        }
    }

    fn is_free(&self, name: &str, key: &TypeKey) -> bool {
        self.registry.key_for(name).is_none_or(|bound| bound == *key)
    }

    fn expand_record(&mut self, rec: &RecordDesc, owner: &str) -> Schema {
        let mut schema = Schema::typed(SchemaType::Object);
        schema.description = rec.description.clone();
        let mut embedded = Vec::new();

        for field in &rec.fields {
            if !field.public {
                continue;
            }
            let wire = field.wire.as_deref().map(parse_wire_tag).unwrap_or_default();
            if wire.skip {
                continue;
            }
            if field.embedded
                && wire.name.is_none()
                && let Some(inner) = self.expand_embedded(field, owner)
            {
                embedded.push(inner);
                continue;
            }

            let name = wire.name.clone().unwrap_or_else(|| field.name.clone());
            let (mut node, optional) = self.generate_tracked(&(field.ty)(), None);

            let mut explicit_required = None;
            if let Some(annotation) = field.annotation.as_deref() {
                let constraints = Constraints::parse(annotation);
                let errors = constraints.validate();
                if !errors.is_empty() {
                    self.issues.push(Issue::Constraint {
                        location: format!("field {owner}.{name}"),
                        errors,
                    });
                }
                node = apply_overrides(
                    &node,
                    constraints.type_override.as_deref(),
                    constraints.format.as_deref(),
                    None,
                );
                node = apply_to_schema(&node, &constraints);
                explicit_required = constraints.required;
            }

            let required = explicit_required.unwrap_or(!optional && !wire.omit_empty);
            if required && !schema.required.contains(&name) {
                schema.required.push(name.clone());
            }
            schema.properties.insert(name, node);
        }

        for inner in embedded {
            merge_embedded(&mut schema, inner);
        }
        schema
    }

    /// Expand an embedded record in place. Returns `None` for non-record
    /// fields, which are then treated as ordinary fields.
    fn expand_embedded(&mut self, field: &Field, owner: &str) -> Option<Schema> {
        let (desc, _) = unwrap_indirection(&(field.ty)());
        let TypeKind::Record(rec) = &desc.kind else {
            debug!("embedded field {owner}.{} is not a record", field.name);
            return None;
        };
        if !self.embedding.insert(desc.key) {
            warn!("{:?} embeds itself, skipping {owner}.{}", desc.key, field.name);
            return Some(Schema::default());
        }
        let schema = self.expand_record(rec, owner);
        self.embedding.remove(&desc.key);
        Some(schema)
    }
}

/// Strip optional and pointer layers, noting whether any was optional.
fn unwrap_indirection(desc: &TypeDesc) -> (TypeDesc, bool) {
    let mut current = desc.clone();
    let mut nullable = false;
    loop {
        match current.kind {
            TypeKind::Optional(inner) => {
                nullable = true;
                current = inner();
            }
            TypeKind::Pointer(inner) => current = inner(),
            _ => return (current, nullable),
        }
    }
}

/// References get a single-member `allOf` wrapper that carries the flag.
fn mark_nullable(node: SchemaOrRef) -> SchemaOrRef {
    match node {
        SchemaOrRef::Schema(mut schema) => {
            schema.nullable = Some(true);
            SchemaOrRef::Schema(schema)
        }
        reference @ SchemaOrRef::Ref { .. } => SchemaOrRef::inline(Schema {
            all_of: vec![reference],
            nullable: Some(true),
            ..Schema::default()
        }),
    }
}

/// Parent properties win; embedded required entries follow their property.
fn merge_embedded(parent: &mut Schema, inner: Schema) {
    let Schema {
        properties,
        required,
        ..
    } = inner;
    for (name, node) in properties {
        if parent.properties.contains_key(&name) {
            continue;
        }
        if required.contains(&name) {
            parent.required.push(name.clone());
        }
        parent.properties.insert(name, node);
    }
}

fn primitive_schema(p: Primitive) -> Schema {
    match p {
        Primitive::Bool => Schema::typed(SchemaType::Boolean),
        Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::U8 | Primitive::U16 => {
            Schema::formatted(SchemaType::Integer, "int32")
        }
        Primitive::I64
        | Primitive::I128
        | Primitive::Isize
        | Primitive::U32
        | Primitive::U64
        | Primitive::U128
        | Primitive::Usize => Schema::formatted(SchemaType::Integer, "int64"),
        Primitive::F32 => Schema::formatted(SchemaType::Number, "float"),
        Primitive::F64 => Schema::formatted(SchemaType::Number, "double"),
        Primitive::Char | Primitive::Str => Schema::typed(SchemaType::String),
    }
}

fn special_schema(s: SpecialType) -> Schema {
    let format = match s {
        SpecialType::DateTime => "date-time",
        SpecialType::Date => "date",
        SpecialType::Uuid => "uuid",
        SpecialType::Bytes => "byte",
    };
    Schema::formatted(SchemaType::String, format)
}
