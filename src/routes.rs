// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::context::AppContext;
use crate::handlers::custom_sources::refresh_custom_source;
use crate::handlers::data::{get_data, DataQuery};
use crate::handlers::error::ApiError;
use crate::handlers::health::health;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, error, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND", "Not Found".to_string())
    } else if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, api_error.code, api_error.message.clone())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Method Not Allowed".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": error,
            "message": message,
        })),
        code,
    ))
}

pub fn routes(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let ctx_filter = warp::any().map(move || ctx.clone());

    let data_route = warp::path!("api" / "data")
        .and(warp::get())
        .and(warp::query::<DataQuery>())
        .and(ctx_filter.clone())
        .and_then(get_data);

    let health_route = warp::path!("api" / "health")
        .and(warp::get())
        .and_then(health);

    let refresh_route = warp::path!("api" / "custom-sources" / String / "refresh")
        .and(warp::post())
        .and(ctx_filter.clone())
        .and_then(refresh_custom_source);

    info!("All routes configured successfully.");

    data_route
        .or(health_route)
        .or(refresh_route)
        .recover(handle_rejection)
}
