use serde_json::{Value, json};

use oab_core::ir::SecuritySchemeNode;
use oab_core::{
    Body, Describe, DocumentBuilder, Field, HttpMethod, OpenApiVersion, Param, Reply, TypeDesc,
};

mod models {
    use oab_core::{Describe, Field, TypeDesc};

    pub struct Item;

    impl Describe for Item {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Item>(vec![Field::new::<i64>("id"), Field::new::<String>("name")])
        }
    }
}

struct Profile;

impl Describe for Profile {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Profile>(vec![
            Field::new::<Option<String>>("nickname"),
            Field::new::<f64>("score").annotate("minimum=0,exclusiveMinimum"),
            Field::new::<String>("password").annotate("writeOnly,deprecated"),
        ])
    }
}

struct Shelf;

impl Describe for Shelf {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Shelf>(vec![
            Field::new::<String>("label"),
            Field::new::<Option<models::Item>>("featured"),
        ])
    }
}

fn items_api() -> DocumentBuilder {
    let mut b = DocumentBuilder::new();
    b.title("Items")
        .info_version("1.0.0")
        .server("https://api.example.com/v1")
        .get("/items/{id}", |op| {
            op.id("getItem")
                .param(Param::path::<i64>("id").constraints("minimum=1"))
                .json_response::<models::Item>(200, "The item");
        });
    b
}

fn to_json(b: &DocumentBuilder, version: OpenApiVersion) -> Value {
    let doc = b.build_as(version).expect("should build");
    assert_eq!(doc.version(), version.as_str());
    serde_json::to_value(&doc).expect("should serialize")
}

#[test]
fn item_lookup_in_three_one() {
    let json = to_json(&items_api(), OpenApiVersion::V3_1);
    assert_eq!(json["openapi"], "3.1.0");
    assert_eq!(json["servers"][0]["url"], "https://api.example.com/v1");

    let op = &json["paths"]["/items/{id}"]["get"];
    assert_eq!(op["operationId"], "getItem");
    assert_eq!(
        op["parameters"][0],
        json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64", "minimum": 1 }
        })
    );
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/models.Item"
    );

    insta::assert_json_snapshot!(json["components"]["schemas"]["models.Item"], @r#"
    {
      "type": "object",
      "properties": {
        "id": {
          "type": "integer",
          "format": "int64"
        },
        "name": {
          "type": "string"
        }
      },
      "required": [
        "id",
        "name"
      ]
    }
    "#);
}

#[test]
fn item_lookup_in_two_zero() {
    let json = to_json(&items_api(), OpenApiVersion::V2_0);
    assert_eq!(json["swagger"], "2.0");
    assert_eq!(json["host"], "api.example.com");
    assert_eq!(json["basePath"], "/v1");
    assert!(json.get("servers").is_none());
    assert!(json.get("components").is_none());

    let op = &json["paths"]["/items/{id}"]["get"];
    let param = &op["parameters"][0];
    assert_eq!(param["in"], "path");
    assert_eq!(param["required"], true);
    assert_eq!(param["type"], "integer");
    assert_eq!(param["format"], "int64");
    assert_eq!(param["minimum"], 1);
    assert!(param.get("schema").is_none());

    let response = &op["responses"]["200"];
    assert!(response.get("content").is_none());
    assert_eq!(response["schema"]["$ref"], "#/definitions/models.Item");
    assert_eq!(op["produces"], json!(["application/json"]));
    assert!(json["definitions"]["models.Item"].is_object());
}

#[test]
fn item_lookup_in_three_zero_uses_component_refs() {
    let json = to_json(&items_api(), OpenApiVersion::V3_0);
    assert_eq!(json["openapi"], "3.0.3");
    let op = &json["paths"]["/items/{id}"]["get"];
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/models.Item"
    );
}

#[test]
fn nullable_and_bounds_follow_the_dialect() {
    let mut b = DocumentBuilder::new();
    b.component_schema::<Profile>();

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let profile = &v31["components"]["schemas"]["dialect_tests.Profile"]["properties"];
    assert_eq!(profile["nickname"], json!({ "type": ["string", "null"] }));
    assert_eq!(profile["score"]["exclusiveMinimum"], 0);
    assert!(profile["score"].get("minimum").is_none());
    assert_eq!(profile["password"]["writeOnly"], true);

    let v30 = to_json(&b, OpenApiVersion::V3_0);
    let profile = &v30["components"]["schemas"]["dialect_tests.Profile"]["properties"];
    assert_eq!(profile["nickname"], json!({ "type": "string", "nullable": true }));
    assert_eq!(profile["score"]["minimum"], 0);
    assert_eq!(profile["score"]["exclusiveMinimum"], true);

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    let profile = &v20["definitions"]["dialect_tests.Profile"]["properties"];
    assert_eq!(profile["nickname"], json!({ "type": "string", "x-nullable": true }));
    assert!(profile["password"].get("writeOnly").is_none());
    assert_eq!(profile["password"]["x-deprecated"], true);
}

#[test]
fn request_body_becomes_a_body_parameter_in_two_zero() {
    let mut b = DocumentBuilder::new();
    b.post("/items", |op| {
        op.id("createItem")
            .body(Body::json::<models::Item>().description("New item"))
            .json_response::<models::Item>(201, "Created");
    });

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let body = &v31["paths"]["/items"]["post"]["requestBody"];
    assert_eq!(body["required"], true);
    assert_eq!(
        body["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/models.Item"
    );

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    let op = &v20["paths"]["/items"]["post"];
    assert!(op.get("requestBody").is_none());
    assert_eq!(op["consumes"], json!(["application/json"]));
    let param = &op["parameters"][0];
    assert_eq!(param["name"], "body");
    assert_eq!(param["in"], "body");
    assert_eq!(param["description"], "New item");
    assert_eq!(param["schema"]["$ref"], "#/definitions/models.Item");
}

#[test]
fn form_fields_fold_into_a_multipart_body_in_three_x() {
    let mut b = DocumentBuilder::new();
    b.post("/avatars", |op| {
        op.id("uploadAvatar")
            .param(Param::form::<String>("caption").required(true))
            .param(Param::file("image"))
            .response(201, Reply::empty("Uploaded"));
    });

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let op = &v31["paths"]["/avatars"]["post"];
    assert!(op.get("parameters").is_none());
    let schema = &op["requestBody"]["content"]["multipart/form-data"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["image"]["format"], "binary");
    assert_eq!(schema["required"], json!(["caption"]));
    assert_eq!(op["requestBody"]["required"], true);

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    let op = &v20["paths"]["/avatars"]["post"];
    assert_eq!(op["consumes"], json!(["multipart/form-data"]));
    assert_eq!(op["parameters"][0]["in"], "formData");
    assert_eq!(op["parameters"][0]["type"], "string");
    assert_eq!(op["parameters"][1]["type"], "file");
}

#[test]
fn bearer_scheme_maps_to_an_authorization_header_in_two_zero() {
    let mut b = items_api();
    b.security_scheme("bearerAuth", SecuritySchemeNode::bearer(Some("JWT")))
        .security("bearerAuth", &[]);

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    assert_eq!(
        v31["components"]["securitySchemes"]["bearerAuth"],
        json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" })
    );
    assert_eq!(v31["security"], json!([{ "bearerAuth": [] }]));

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    assert_eq!(
        v20["securityDefinitions"]["bearerAuth"],
        json!({ "type": "apiKey", "name": "Authorization", "in": "header" })
    );
}

#[test]
fn webhooks_are_dropped_for_targets_without_them() {
    let mut b = DocumentBuilder::new();
    b.webhook("itemCreated", HttpMethod::Post, |op| {
        op.json_body::<models::Item>()
            .response(200, Reply::empty("Acknowledged"));
    });

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    assert!(v31["webhooks"]["itemCreated"]["post"].is_object());

    let v30 = to_json(&b, OpenApiVersion::V3_0);
    assert!(v30.get("webhooks").is_none());
    assert!(v30["components"]["schemas"]["models.Item"].is_object());
}

#[test]
fn schema_content_is_the_same_in_every_dialect() {
    let mut b = items_api();
    b.get("/items", |op| {
        op.id("listItems")
            .json_response::<Vec<models::Item>>(200, "All items");
    });

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let v30 = to_json(&b, OpenApiVersion::V3_0);
    let v20 = to_json(&b, OpenApiVersion::V2_0);

    let item = json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer", "format": "int64" },
            "name": { "type": "string" }
        },
        "required": ["id", "name"]
    });
    assert_eq!(v31["components"]["schemas"]["models.Item"], item);
    assert_eq!(v30["components"]["schemas"]["models.Item"], item);
    assert_eq!(v20["definitions"]["models.Item"], item);

    let list = |root: &str| {
        json!({ "type": "array", "items": { "$ref": format!("{root}models.Item") } })
    };
    let json_schema = "/paths/~1items/get/responses/200/content/application~1json/schema";
    assert_eq!(v31.pointer(json_schema), Some(&list("#/components/schemas/")));
    assert_eq!(v30.pointer(json_schema), Some(&list("#/components/schemas/")));
    assert_eq!(
        v20.pointer("/paths/~1items/get/responses/200/schema"),
        Some(&list("#/definitions/"))
    );

    let id = json!({ "type": "integer", "format": "int64", "minimum": 1 });
    let param = "/paths/~1items~1{id}/get/parameters/0";
    assert_eq!(v31.pointer(&format!("{param}/schema")), Some(&id));
    assert_eq!(v30.pointer(&format!("{param}/schema")), Some(&id));
    let v20_param = v20.pointer(param).expect("2.0 parameter");
    assert_eq!(v20_param["type"], id["type"]);
    assert_eq!(v20_param["format"], id["format"]);
    assert_eq!(v20_param["minimum"], id["minimum"]);
}

#[test]
fn optional_record_field_stays_nullable() {
    let mut b = DocumentBuilder::new();
    b.component_schema::<Shelf>();

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let shelf = &v31["components"]["schemas"]["dialect_tests.Shelf"];
    assert_eq!(
        shelf["properties"]["featured"],
        json!({ "anyOf": [{ "$ref": "#/components/schemas/models.Item" }, { "type": "null" }] })
    );
    assert_eq!(shelf["required"], json!(["label"]));

    let v30 = to_json(&b, OpenApiVersion::V3_0);
    assert_eq!(
        v30["components"]["schemas"]["dialect_tests.Shelf"]["properties"]["featured"],
        json!({ "allOf": [{ "$ref": "#/components/schemas/models.Item" }], "nullable": true })
    );

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    assert_eq!(
        v20["definitions"]["dialect_tests.Shelf"]["properties"]["featured"],
        json!({ "allOf": [{ "$ref": "#/definitions/models.Item" }], "x-nullable": true })
    );
}

#[test]
fn referenced_form_field_joins_the_request_body() {
    let mut b = DocumentBuilder::new();
    b.component_parameter("Caption", Param::form::<String>("caption").required(true))
        .post("/notes", |op| {
            op.id("createNote")
                .param_ref("Caption")
                .response(201, Reply::empty("Created"));
        });
    assert!(b.issues().is_empty(), "{:?}", b.issues());

    let v31 = to_json(&b, OpenApiVersion::V3_1);
    let op = &v31["paths"]["/notes"]["post"];
    assert!(op.get("parameters").is_none());
    let body = &op["requestBody"];
    assert_eq!(body["required"], true);
    let schema = &body["content"]["application/x-www-form-urlencoded"]["schema"];
    assert_eq!(schema["properties"]["caption"], json!({ "type": "string" }));
    assert_eq!(schema["required"], json!(["caption"]));
    assert!(v31.pointer("/components/parameters").is_none());

    let v20 = to_json(&b, OpenApiVersion::V2_0);
    let op = &v20["paths"]["/notes"]["post"];
    assert_eq!(op["parameters"][0]["$ref"], "#/parameters/Caption");
    assert_eq!(op["consumes"], json!(["application/x-www-form-urlencoded"]));
    assert_eq!(v20["parameters"]["Caption"]["in"], "formData");
}
