//! OpenAPI document for the catalog routes.
//!
//! Routes describe themselves with [`OperationDoc`] while they are mounted;
//! [`ApiDoc::build`] turns the collected operations and schemas into a
//! `utoipa` document.

use std::collections::BTreeMap;

use http::Method;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{
    HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathsBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::{ResponseBuilder, ResponsesBuilder};
use utoipa::openapi::schema::{ComponentsBuilder, ObjectBuilder, Schema, SchemaType, Type};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::{OpenApi, OpenApiBuilder, Ref, RefOr, Required};
use utoipa::{PartialSchema, ToSchema};

const BEARER: &str = "bearerAuth";
const JSON: &str = "application/json";

#[derive(Debug, Clone)]
struct ResponseDoc {
    status: u16,
    description: String,
    content_type: &'static str,
    schema: Option<String>,
}

#[derive(Debug, Clone)]
struct ParamDoc {
    name: &'static str,
    in_path: bool,
    description: &'static str,
}

/// One documented operation.
#[derive(Debug, Clone)]
pub struct OperationDoc {
    method: Method,
    path: String,
    operation_id: String,
    summary: String,
    tag: &'static str,
    authenticated: bool,
    params: Vec<ParamDoc>,
    request: Option<(&'static str, String)>,
    responses: Vec<ResponseDoc>,
}

impl OperationDoc {
    #[must_use]
    pub fn new(method: Method, path: &str, operation_id: &str, summary: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            operation_id: operation_id.to_owned(),
            summary: summary.to_owned(),
            tag: "Products",
            authenticated: true,
            params: Vec::new(),
            request: None,
            responses: Vec::new(),
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }

    #[must_use]
    pub fn path_param(mut self, name: &'static str, description: &'static str) -> Self {
        self.params.push(ParamDoc {
            name,
            in_path: true,
            description,
        });
        self
    }

    #[must_use]
    pub fn query_param(mut self, name: &'static str, description: &'static str) -> Self {
        self.params.push(ParamDoc {
            name,
            in_path: false,
            description,
        });
        self
    }

    #[must_use]
    pub fn json_request<T: ToSchema + 'static>(mut self, doc: &mut ApiDoc) -> Self {
        self.request = Some((JSON, doc.ensure_schema::<T>()));
        self
    }

    /// Same schema as JSON, also accepted as `multipart/form-data`.
    #[must_use]
    pub fn json_or_multipart_request<T: ToSchema + 'static>(mut self, doc: &mut ApiDoc) -> Self {
        self.request = Some(("multipart/form-data", doc.ensure_schema::<T>()));
        self
    }

    #[must_use]
    pub fn json_response<T: ToSchema + 'static>(
        mut self,
        doc: &mut ApiDoc,
        status: u16,
        description: &str,
    ) -> Self {
        let schema = doc.ensure_schema::<T>();
        self.responses.push(ResponseDoc {
            status,
            description: description.to_owned(),
            content_type: JSON,
            schema: Some(schema),
        });
        self
    }

    /// Problem responses for the given statuses.
    #[must_use]
    pub fn problems(mut self, doc: &mut ApiDoc, statuses: &[u16]) -> Self {
        let schema = doc.ensure_schema::<catalog_errors::Problem>();
        for status in statuses {
            let description = http::StatusCode::from_u16(*status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Error");
            self.responses.push(ResponseDoc {
                status: *status,
                description: description.to_owned(),
                content_type: catalog_errors::APPLICATION_PROBLEM_JSON,
                schema: Some(schema.clone()),
            });
        }
        self
    }
}

/// Collected operations and component schemas.
#[derive(Default)]
pub struct ApiDoc {
    operations: Vec<OperationDoc>,
    schemas: BTreeMap<String, RefOr<Schema>>,
}

impl ApiDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` and everything it references; returns the component name.
    pub fn ensure_schema<T: ToSchema + 'static>(&mut self) -> String {
        let name = T::name().to_string();
        let mut collected = vec![(name.clone(), <T as PartialSchema>::schema())];
        T::schemas(&mut collected);
        for (n, schema) in collected {
            self.schemas.entry(n).or_insert(schema);
        }
        name
    }

    pub fn register(&mut self, op: OperationDoc) {
        tracing::debug!(
            method = %op.method,
            path = %op.path,
            operation_id = %op.operation_id,
            "registered API operation"
        );
        self.operations.push(op);
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn build(&self, title: &str, version: &str) -> OpenApi {
        let mut paths = PathsBuilder::new();
        for spec in &self.operations {
            let mut op = OperationBuilder::new()
                .operation_id(Some(spec.operation_id.clone()))
                .summary(Some(spec.summary.clone()))
                .tag(spec.tag);

            for p in &spec.params {
                let (location, required) = if p.in_path {
                    (ParameterIn::Path, Required::True)
                } else {
                    (ParameterIn::Query, Required::False)
                };
                let param = ParameterBuilder::new()
                    .name(p.name)
                    .parameter_in(location)
                    .required(required)
                    .description(Some(p.description))
                    .schema(Some(Schema::Object(
                        ObjectBuilder::new()
                            .schema_type(SchemaType::Type(Type::String))
                            .build(),
                    )))
                    .build();
                op = op.parameter(param);
            }

            if let Some((content_type, schema)) = &spec.request {
                let mut body = RequestBodyBuilder::new().required(Some(Required::True));
                let content = || {
                    ContentBuilder::new()
                        .schema(Some(RefOr::Ref(Ref::from_schema_name(schema.clone()))))
                        .build()
                };
                body = body.content(*content_type, content());
                if *content_type != JSON {
                    body = body.content(JSON, content());
                }
                op = op.request_body(Some(body.build()));
            }

            let mut responses = ResponsesBuilder::new();
            for r in &spec.responses {
                let mut content = ContentBuilder::new();
                if let Some(name) = &r.schema {
                    content = content.schema(Some(RefOr::Ref(Ref::from_schema_name(name.clone()))));
                }
                responses = responses.response(
                    r.status.to_string(),
                    ResponseBuilder::new()
                        .description(r.description.clone())
                        .content(r.content_type, content.build())
                        .build(),
                );
            }
            op = op.responses(responses.build());

            if spec.authenticated {
                op = op.security(SecurityRequirement::new(BEARER, Vec::<String>::new()));
            }

            let method = match spec.method {
                Method::POST => HttpMethod::Post,
                Method::PUT => HttpMethod::Put,
                Method::PATCH => HttpMethod::Patch,
                Method::DELETE => HttpMethod::Delete,
                _ => HttpMethod::Get,
            };
            paths = paths.path(
                spec.path.clone(),
                PathItemBuilder::new().operation(method, op.build()).build(),
            );
        }

        let mut components = ComponentsBuilder::new().security_scheme(
            BEARER,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        for (name, schema) in &self.schemas {
            components = components.schema(name.clone(), schema.clone());
        }

        OpenApiBuilder::new()
            .info(InfoBuilder::new().title(title).version(version).build())
            .paths(paths.build())
            .components(Some(components.build()))
            .build()
    }
}
