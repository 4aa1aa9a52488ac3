use axum::{http::header, response::IntoResponse};

const OPENAPI_SPEC: &str = include_str!("../../openapi.yaml");

/// Serves the `OpenAPI` document with the running crate version stamped in.
pub async fn openapi_yaml() -> impl IntoResponse {
    let document = OPENAPI_SPEC.replace("version: 0.0.0", &format!("version: {}", env!("CARGO_PKG_VERSION")));

    ([(header::CONTENT_TYPE, "text/yaml")], document)
}
