// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::require_auth, state::AppState};

pub mod admin;
pub mod health;
pub mod protected;
pub mod user;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let authenticated = Router::new()
        .route("/protected", get(protected::protected))
        .route("/user/profile", get(user::profile))
        .route("/user/data", post(user::update_data))
        .route("/admin/users", get(admin::list_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(authenticated)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
}

/// CORS policy for the browser frontend.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health,
        protected::protected,
        user::profile,
        user::update_data,
        admin::list_users
    ),
    components(
        schemas(
            health::RootResponse,
            health::HealthResponse,
            protected::ProtectedResponse,
            user::ProfileResponse,
            user::UserDataResponse,
            admin::AdminUsersResponse,
            admin::AdminUserItem
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Public service status"),
        (name = "Protected", description = "Endpoints requiring a valid Clerk token"),
        (name = "User", description = "Data shaped from the caller's claims"),
        (name = "Admin", description = "Endpoints restricted to admin emails")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_skips_invalid_origins() {
        // Must not panic on a header value containing a newline.
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }

    #[test]
    fn openapi_lists_all_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/health", "/protected", "/user/profile", "/user/data", "/admin/users"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
