pub mod middleware;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use common::{HEALTH_PATH, LIST_PATH};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::service::bucket::{health_handler, list_objects_handler};
use crate::service::object::{
    delete_object_handler, get_object_handler, method_not_allowed, options_handler,
    put_object_handler,
};
use crate::utils::state::AppState;
use middleware::{attach_error_details, preflight_no_content};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            &format!("/{HEALTH_PATH}"),
            get(health_handler)
                .options(options_handler)
                .fallback(method_not_allowed),
        )
        .route(
            &format!("/{LIST_PATH}"),
            get(list_objects_handler)
                .options(options_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/{*key}",
            get(get_object_handler)
                .put(put_object_handler)
                .delete(delete_object_handler)
                .options(options_handler)
                .fallback(method_not_allowed),
        )
        .fallback(fallback)
        .layer(from_fn_with_state(state.clone(), attach_error_details))
        // PUT enforces `max_file_size` itself.
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer(&state.config))
        .layer(from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match config.cors_allow_origin.as_str() {
        "*" => AllowOrigin::any(),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("invalid CORS origin `{origin}`, allowing any origin");
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(config.cors_max_age_secs))
}

/// `OPTIONS` is answered everywhere, anything else on an unknown path is a 404.
async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        options_handler().await.into_response()
    } else {
        AppError::NotFound("no such route".to_string()).into_response()
    }
}
