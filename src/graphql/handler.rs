use super::schema::RequestScope;
use crate::app::AppContext;
use crate::http::{RequestOrigin, Tenant};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Code given to errors raised before any resolver ran (parse, validation,
/// input coercion)
const REQUEST_ERROR_CODE: &str = "VALIDATION_ERROR";

/// POST …/graphql.json
pub async fn graphql_handler(
    State(ctx): State<AppContext>,
    tenant: Tenant,
    RequestOrigin(origin): RequestOrigin,
    body: Bytes,
) -> Response {
    let request: async_graphql::Request = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed GraphQL request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errors": [{
                        "message": format!("Invalid GraphQL request: {}", e),
                        "extensions": { "code": REQUEST_ERROR_CODE }
                    }]
                })),
            )
                .into_response();
        }
    };

    let scope = RequestScope {
        charges: ctx.charges.clone(),
        tenant,
        origin,
    };
    let mut response = ctx.schema.execute(request.data(scope)).await;

    for error in &mut response.errors {
        let extensions = error.extensions.get_or_insert_with(Default::default);
        if extensions.get("code").is_none() {
            extensions.set("code", REQUEST_ERROR_CODE);
        }
    }

    Json(response).into_response()
}
