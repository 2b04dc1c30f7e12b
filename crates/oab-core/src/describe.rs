//! Type descriptions: the reflector's input.
//!
//! Rust has no runtime reflection, so types describe themselves through
//! [`Describe`]. Nested types are held as `fn() -> TypeDesc` so self-referential
//! records can be described without building an infinite value; the reflector
//! only calls the function when it expands the field.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;

/// Lazily produces a nested type description.
pub type DescribeFn = fn() -> TypeDesc;

/// Implemented by every type that can appear in a generated schema.
pub trait Describe: 'static {
    fn describe() -> TypeDesc;
}

/// Intrinsic identity of a described type.
///
/// Equality and hashing use only the `TypeId`; the path is kept for naming.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    path: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type path, e.g. `app::models::Item`.
    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// A type description: identity plus the kind-specific shape.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    pub key: TypeKey,
    pub kind: TypeKind,
}

/// The closed set of kinds the reflector understands.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(Primitive),
    /// Nullable indirection (`Option<T>`).
    Optional(DescribeFn),
    /// Non-nullable indirection (`Box<T>`, `Rc<T>`, `Arc<T>`).
    Pointer(DescribeFn),
    Sequence(DescribeFn),
    /// String-keyed map; the function describes the value type.
    Map(DescribeFn),
    Record(RecordDesc),
    Special(SpecialType),
    /// Accepts anything.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    Str,
}

/// Well-known types with a fixed string representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialType {
    DateTime,
    Date,
    Uuid,
    Bytes,
}

/// Fields of a record type.
#[derive(Debug, Clone, Default)]
pub struct RecordDesc {
    pub fields: Vec<Field>,
    pub description: Option<String>,
    /// Anonymous records are inlined instead of registered under a name.
    pub anonymous: bool,
}

/// One record field plus its declarative metadata.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: DescribeFn,
    pub public: bool,
    /// Merge the field's record properties into the parent.
    pub embedded: bool,
    /// Wire tag: `"name"`, `"name,omitempty"` or `"-"`.
    pub wire: Option<String>,
    /// Schema annotation: `"minimum=1,maximum=10"`.
    pub annotation: Option<String>,
}

impl Field {
    pub fn new<T: Describe>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: T::describe,
            public: true,
            embedded: false,
            wire: None,
            annotation: None,
        }
    }

    /// An embedded (flattened) record field.
    pub fn embed<T: Describe>(name: impl Into<String>) -> Self {
        Self {
            embedded: true,
            ..Self::new::<T>(name)
        }
    }

    pub fn wire(mut self, tag: impl Into<String>) -> Self {
        self.wire = Some(tag.into());
        self
    }

    pub fn annotate(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }
}

impl TypeDesc {
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            kind,
        }
    }

    pub fn record<T: 'static>(fields: Vec<Field>) -> Self {
        Self::of::<T>(TypeKind::Record(RecordDesc {
            fields,
            ..RecordDesc::default()
        }))
    }

    /// A record that is always inlined and never named.
    pub fn anonymous<T: 'static>(fields: Vec<Field>) -> Self {
        Self::of::<T>(TypeKind::Record(RecordDesc {
            fields,
            description: None,
            anonymous: true,
        }))
    }

    /// Attach a description to a record; other kinds are returned unchanged.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        if let TypeKind::Record(ref mut rec) = self.kind {
            rec.description = Some(description.into());
        }
        self
    }
}

macro_rules! describe_primitive {
    ($($ty:ty => $prim:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::of::<$ty>(TypeKind::Primitive(Primitive::$prim))
                }
            }
        )*
    };
}

describe_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => Str,
    &'static str => Str,
}

macro_rules! describe_wrapper {
    ($kind:ident: $($ty:ident),*) => {
        $(
            impl<T: Describe> Describe for $ty<T> {
                fn describe() -> TypeDesc {
                    TypeDesc::of::<$ty<T>>(TypeKind::$kind(T::describe))
                }
            }
        )*
    };
}

describe_wrapper!(Optional: Option);
describe_wrapper!(Pointer: Box, Rc, Arc);
describe_wrapper!(Sequence: Vec, VecDeque, HashSet, BTreeSet);

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDesc {
        TypeDesc::of::<[T]>(TypeKind::Sequence(T::describe))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDesc {
        TypeDesc::of::<[T; N]>(TypeKind::Sequence(T::describe))
    }
}

impl<V: Describe> Describe for HashMap<String, V> {
    fn describe() -> TypeDesc {
        TypeDesc::of::<HashMap<String, V>>(TypeKind::Map(V::describe))
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn describe() -> TypeDesc {
        TypeDesc::of::<BTreeMap<String, V>>(TypeKind::Map(V::describe))
    }
}

impl<V: Describe> Describe for IndexMap<String, V> {
    fn describe() -> TypeDesc {
        TypeDesc::of::<IndexMap<String, V>>(TypeKind::Map(V::describe))
    }
}

impl Describe for () {
    fn describe() -> TypeDesc {
        TypeDesc::of::<()>(TypeKind::Any)
    }
}

impl Describe for serde_json::Value {
    fn describe() -> TypeDesc {
        TypeDesc::of::<serde_json::Value>(TypeKind::Any)
    }
}

impl Describe for SystemTime {
    fn describe() -> TypeDesc {
        TypeDesc::of::<SystemTime>(TypeKind::Special(SpecialType::DateTime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Describe for Node {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Node>(vec![
                Field::new::<String>("label"),
                Field::new::<Vec<Node>>("children"),
            ])
        }
    }

    #[test]
    fn test_key_identity_ignores_name() {
        assert_eq!(TypeKey::of::<Node>(), TypeKey::of::<Node>());
        assert_ne!(TypeKey::of::<Node>(), TypeKey::of::<String>());
        assert!(TypeKey::of::<Node>().path().ends_with("Node"));
    }

    #[test]
    fn test_recursive_description_is_lazy() {
        let desc = Node::describe();
        let TypeKind::Record(rec) = desc.kind else {
            panic!("expected record");
        };
        assert_eq!(rec.fields.len(), 2);
        let children = (rec.fields[1].ty)();
        match children.kind {
            TypeKind::Sequence(inner) => assert_eq!(inner().key, TypeKey::of::<Node>()),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_wrapper_kinds() {
        assert!(matches!(Option::<i32>::describe().kind, TypeKind::Optional(_)));
        assert!(matches!(Box::<i32>::describe().kind, TypeKind::Pointer(_)));
        assert!(matches!(
            HashMap::<String, i64>::describe().kind,
            TypeKind::Map(_)
        ));
        assert!(matches!(
            <[u8; 4]>::describe().kind,
            TypeKind::Sequence(_)
        ));
    }

    #[test]
    fn test_field_builder_flags() {
        let f = Field::new::<i64>("id")
            .wire("item_id,omitempty")
            .annotate("minimum=1")
            .private();
        assert_eq!(f.wire.as_deref(), Some("item_id,omitempty"));
        assert_eq!(f.annotation.as_deref(), Some("minimum=1"));
        assert!(!f.public);
        assert!(Field::embed::<Node>("base").embedded);
    }
}
