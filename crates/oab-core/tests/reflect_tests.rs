use oab_core::config::NamingStrategy;
use oab_core::schema::{SchemaType, TypeSet};
use oab_core::{Describe, Field, Reflector, SchemaOrRef, TypeDesc};

mod store {
    use oab_core::{Describe, Field, TypeDesc};

    pub struct Item;

    impl Describe for Item {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Item>(vec![
                Field::new::<i64>("id").annotate("minimum=1,readOnly"),
                Field::new::<String>("name").annotate("minLength=1,maxLength=64"),
                Field::new::<Vec<String>>("tags").wire("tags,omitempty"),
            ])
        }
    }

    pub struct Category;

    impl Describe for Category {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Category>(vec![
                Field::new::<String>("name"),
                Field::new::<Option<Box<Category>>>("parent"),
                Field::new::<Vec<Item>>("items"),
            ])
        }
    }
}

mod legacy {
    pub mod store {
        use oab_core::{Describe, Field, TypeDesc};

        pub struct Item;

        impl Describe for Item {
            fn describe() -> TypeDesc {
                TypeDesc::record::<Item>(vec![Field::new::<String>("sku")])
            }
        }
    }
}

struct Profile;

impl Describe for Profile {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Profile>(vec![
            Field::new::<Option<String>>("nickname"),
            Field::new::<String>("bio").wire("bio,omitempty"),
            Field::new::<String>("email")
                .wire("email,omitempty")
                .annotate("required=true,format=email"),
            Field::new::<String>("display_name").wire("displayName"),
        ])
    }
}

struct Envelope;

impl Describe for Envelope {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Envelope>(vec![
            Field::new::<store::Item>("primary"),
            Field::new::<Vec<store::Item>>("others"),
            Field::new::<std::collections::HashMap<String, store::Item>>("by_name"),
        ])
    }
}

#[test]
fn same_type_through_different_paths_is_stored_once() {
    let mut r = Reflector::default();
    let direct = r.generate::<store::Item>();
    r.generate::<Envelope>();

    assert_eq!(direct, SchemaOrRef::component("store.Item"));
    let defs = r.definitions();
    let names: Vec<&str> = defs.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["store.Item", "reflect_tests.Envelope"]);

    let envelope = &defs["reflect_tests.Envelope"];
    assert_eq!(envelope.properties["primary"], direct);
    let others = envelope.properties["others"].as_schema().expect("array");
    assert_eq!(others.items.as_deref(), Some(&direct));
}

#[test]
fn self_referential_type_terminates_with_a_reference_cycle() {
    let mut r = Reflector::default();
    let root = r.generate::<store::Category>();
    assert_eq!(root, SchemaOrRef::component("store.Category"));

    let defs = r.definitions();
    let category = &defs["store.Category"];
    let parent = category.properties["parent"].as_schema().expect("optional ref");
    assert_eq!(parent.all_of, vec![root]);
    assert_eq!(parent.nullable, Some(true));
    assert!(defs.contains_key("store.Item"));
}

#[test]
fn colliding_names_rewrite_the_second_type() {
    let mut r = Reflector::default();
    let first = r.generate::<store::Item>();
    let second = r.generate::<legacy::store::Item>();

    assert_eq!(first.ref_name(), Some("store.Item"));
    assert_eq!(second.ref_name(), Some("reflect_tests.legacy.store.Item"));

    let defs = r.definitions();
    assert_eq!(defs.len(), 2);
    assert!(defs["reflect_tests.legacy.store.Item"].properties.contains_key("sku"));
}

#[test]
fn bare_names_collide_across_modules() {
    let mut r = Reflector::new(NamingStrategy::BareName);
    assert_eq!(r.generate::<store::Item>().ref_name(), Some("Item"));
    assert_eq!(
        r.generate::<legacy::store::Item>().ref_name(),
        Some("reflect_tests.legacy.store.Item")
    );
}

#[test]
fn required_set_follows_optionality_tags_and_overrides() {
    let mut r = Reflector::default();
    r.generate::<Profile>();
    let profile = &r.definitions()["reflect_tests.Profile"];

    assert_eq!(profile.required, vec!["email", "displayName"]);
    let names: Vec<&str> = profile.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["nickname", "bio", "email", "displayName"]);
    assert_eq!(
        profile.properties["email"].as_schema().and_then(|s| s.format.as_deref()),
        Some("email")
    );
}

#[test]
fn field_constraints_land_on_the_field_schema() {
    let mut r = Reflector::default();
    r.generate::<store::Item>();
    let item = &r.definitions()["store.Item"];

    let id = item.properties["id"].as_schema().expect("inline");
    assert_eq!(id.minimum, Some(1.0));
    assert_eq!(id.read_only, Some(true));
    assert_eq!(id.schema_type, Some(TypeSet::Single(SchemaType::Integer)));

    let name = item.properties["name"].as_schema().expect("inline");
    assert_eq!((name.min_length, name.max_length), (Some(1), Some(64)));
    assert_eq!(item.required, vec!["id", "name"]);
    assert!(r.issues().is_empty());
}
