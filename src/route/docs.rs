use std::sync::Arc;

use aide::{
	axum::{routing::get, ApiRouter, IntoApiResponse},
	openapi::OpenApi,
};
use axum::{response::IntoResponse, Extension};

/// Serves the generated `OpenAPI` document. The document itself is attached
/// as an extension once every other route has been registered.
pub fn routes<S>() -> ApiRouter<S>
where
	S: Clone + Send + Sync + 'static,
{
	ApiRouter::new().route("/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	axum::Json(api.as_ref()).into_response()
}
