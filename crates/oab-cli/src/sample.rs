//! The bundled pet store API used by `oab sample` and `oab routes`.

use oab_core::config::OabConfig;
use oab_core::ir::{OAuthFlowNode, OAuthFlowType, SecuritySchemeNode};
use oab_core::{Body, Describe, DocumentBuilder, Field, HttpMethod, Param, Reply, TypeDesc};

pub struct Category;

impl Describe for Category {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Category>(vec![
            Field::new::<i64>("id").annotate("readOnly"),
            Field::new::<String>("name").annotate("minLength=1,maxLength=64"),
            Field::new::<Option<Box<Category>>>("parent"),
        ])
    }
}

pub struct PetBase;

impl Describe for PetBase {
    fn describe() -> TypeDesc {
        TypeDesc::record::<PetBase>(vec![
            Field::new::<String>("name").annotate("minLength=1,example=Rex"),
            Field::new::<String>("status")
                .annotate("enum=available|pending|sold,default=available"),
            Field::new::<Vec<String>>("tags")
                .wire("tags,omitempty")
                .annotate("uniqueItems,maxItems=16"),
        ])
    }
}

pub struct Pet;

impl Describe for Pet {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Pet>(vec![
            Field::new::<i64>("id").annotate("readOnly,minimum=1"),
            Field::embed::<PetBase>("base"),
            Field::new::<Option<Category>>("category"),
            Field::new::<std::time::SystemTime>("created_at").wire("createdAt"),
            Field::new::<String>("internal_notes").private(),
        ])
        .with_description("A pet available for adoption")
    }
}

pub struct NewPet;

impl Describe for NewPet {
    fn describe() -> TypeDesc {
        TypeDesc::record::<NewPet>(vec![
            Field::embed::<PetBase>("base"),
            Field::new::<Option<i64>>("category_id").wire("categoryId,omitempty"),
        ])
    }
}

pub struct ApiError;

impl Describe for ApiError {
    fn describe() -> TypeDesc {
        TypeDesc::record::<ApiError>(vec![
            Field::new::<i32>("code"),
            Field::new::<String>("message"),
        ])
        .with_description("Error payload")
    }
}

pub struct Adoption;

impl Describe for Adoption {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Adoption>(vec![
            Field::new::<i64>("pet_id").wire("petId"),
            Field::new::<String>("adopter").annotate("format=email"),
        ])
    }
}

/// Build the pet store on top of `config`. Webhooks are only declared for
/// targets that support them.
pub fn petstore(config: &OabConfig) -> DocumentBuilder {
    let mut b = DocumentBuilder::from_config(config);
    b.tag("pets", Some("Everything about pets"))
        .security_scheme("bearerAuth", SecuritySchemeNode::bearer(Some("JWT")))
        .security_scheme(
            "petstoreAuth",
            SecuritySchemeNode::oauth2(vec![
                OAuthFlowNode::new(OAuthFlowType::AuthorizationCode)
                    .authorization_url("https://auth.example.com/authorize")
                    .token_url("https://auth.example.com/token")
                    .scope("pets:read", "Read pets")
                    .scope("pets:write", "Modify pets"),
            ]),
        )
        .security("bearerAuth", &[])
        .component_parameter(
            "PageLimit",
            Param::query::<u32>("limit")
                .constraints("minimum=1,maximum=100,default=20")
                .description("Page size"),
        )
        .component_response("NotFound", Reply::json::<ApiError>("Pet not found"))
        .get("/pets", |op| {
            op.summary("List pets")
                .tag("pets")
                .param_ref("PageLimit")
                .param(
                    Param::query::<String>("status")
                        .constraints("enum=available|pending|sold"),
                )
                .param(Param::header::<String>("X-Request-Id").constraints("format=uuid"))
                .response(
                    200,
                    Reply::json::<Vec<Pet>>("A page of pets")
                        .header::<i64>("X-Total-Count", "Total number of pets"),
                )
                .json_response::<ApiError>("default", "Unexpected error");
        })
        .post("/pets", |op| {
            op.summary("Add a pet")
                .tag("pets")
                .security("petstoreAuth", &["pets:write"])
                .body(Body::json::<NewPet>().description("Pet to add"))
                .json_response::<Pet>(201, "Created")
                .json_response::<ApiError>("default", "Unexpected error");
        })
        .get("/pets/{petId}", |op| {
            op.summary("Find a pet by id")
                .tag("pets")
                .param(Param::path::<i64>("petId").constraints("minimum=1"))
                .json_response::<Pet>(200, "The pet")
                .response_ref(404, "NotFound");
        })
        .delete("/pets/{petId}", |op| {
            op.summary("Remove a pet")
                .tag("pets")
                .param(Param::path::<i64>("petId").constraints("minimum=1"))
                .response(204, Reply::empty("Removed"))
                .response_ref(404, "NotFound");
        })
        .post("/pets/{petId}/photos", |op| {
            op.summary("Upload a photo")
                .tag("pets")
                .param(Param::path::<i64>("petId"))
                .param(Param::form::<String>("caption").description("Photo caption"))
                .param(Param::file("photo").required(true))
                .response(201, Reply::empty("Uploaded"));
        })
        .get("/health", |op| {
            op.summary("Liveness probe")
                .no_security()
                .response(200, Reply::empty("Alive"));
        });

    if b.active_version().supports_webhooks() {
        b.webhook("petAdopted", HttpMethod::Post, |op| {
            op.summary("A pet found a home")
                .json_body::<Adoption>()
                .response(200, Reply::empty("Acknowledged"));
        });
    }
    b
}
