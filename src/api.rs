// src/api.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use warp::{
    http::StatusCode,
    reject::{MethodNotAllowed, Rejection},
    reply::{self, Reply},
    Filter,
};

use crate::error::LookupError;
use crate::fetch::SheetSource;
use crate::lookup::{Lookup, LookupOutcome};

const FOUND_MESSAGE: &str = "Diploma encontrado exitosamente";
const NOT_FOUND_MESSAGE: &str = "No se encontró ningún diploma registrado para esta cédula";
const SERVER_ERROR_MESSAGE: &str = "Error interno del servidor. Intente de nuevo más tarde.";

#[derive(Debug, Default, Deserialize)]
struct IdQuery {
    id: Option<String>,
    cedula: Option<String>,
}

impl IdQuery {
    /// `id` if it has content, otherwise `cedula`.
    fn identifier(&self) -> &str {
        non_blank(&self.id)
            .or_else(|| non_blank(&self.cedula))
            .unwrap_or_default()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    found_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            found_in: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            found_in: None,
            data: None,
        }
    }
}

fn json_with_status<T: Serialize>(body: &T, status: StatusCode) -> reply::Response {
    reply::with_status(reply::json(body), status).into_response()
}

/// All routes of the service: JSON API, health probe and the static form.
pub fn routes<S>(
    lookup: Arc<Lookup<S>>,
    public_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone
where
    S: SheetSource + 'static,
{
    let with_lookup = warp::any().map(move || lookup.clone());

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let verify_get = warp::path!("api" / "verify-diploma")
        .and(warp::get())
        .and(warp::query::<IdQuery>())
        .and(with_lookup.clone())
        .and_then(|q: IdQuery, lookup: Arc<Lookup<S>>| verify(q, lookup, false));

    let verify_post = warp::path!("api" / "verify-diploma")
        .and(warp::post())
        .and(warp::body::content_length_limit(4 * 1024))
        .and(warp::body::json::<IdQuery>())
        .and(with_lookup.clone())
        .and_then(|q: IdQuery, lookup: Arc<Lookup<S>>| verify(q, lookup, false));

    let search_direct = warp::path!("api" / "search-direct")
        .and(warp::get())
        .and(warp::query::<IdQuery>())
        .and(with_lookup.clone())
        .and_then(|q: IdQuery, lookup: Arc<Lookup<S>>| verify(q, lookup, true));

    let statistics = warp::path!("api" / "statistics")
        .and(warp::get())
        .and(with_lookup.clone())
        .and_then(published_statistics);

    let stats = warp::path!("api" / "stats")
        .and(warp::get())
        .and(with_lookup)
        .and_then(live_stats);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    let api = health
        .or(verify_get)
        .or(verify_post)
        .or(search_direct)
        .or(statistics)
        .or(stats)
        .with(cors);

    api.or(warp::fs::dir(public_dir))
        .recover(handle_rejection)
        .with(warp::log("diploma_verify::api"))
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "diploma-verification"
    })))
}

async fn verify<S: SheetSource>(
    query: IdQuery,
    lookup: Arc<Lookup<S>>,
    report_sheet: bool,
) -> Result<reply::Response, Rejection> {
    let id = query.identifier();
    info!(id, "verification request");

    match lookup.lookup(id).await {
        Ok(LookupOutcome::Found(m)) => {
            let mut body = ApiResponse::ok(FOUND_MESSAGE, &m.record);
            if report_sheet {
                body.found_in = Some(m.sheet.clone());
            }
            Ok(json_with_status(&body, StatusCode::OK))
        }
        Ok(LookupOutcome::NotFound) => Ok(json_with_status(
            &ApiResponse::failure(NOT_FOUND_MESSAGE),
            StatusCode::NOT_FOUND,
        )),
        Err(err) => Ok(lookup_error_reply(&err)),
    }
}

fn lookup_error_reply(err: &LookupError) -> reply::Response {
    if err.is_input_error() {
        return json_with_status(&ApiResponse::failure(err.to_string()), StatusCode::BAD_REQUEST);
    }
    if let LookupError::Unavailable { failures } = err {
        for f in failures {
            error!(sheet = %f.sheet, error = %f.error, "sheet fetch failed");
        }
    }
    json_with_status(
        &ApiResponse::failure(SERVER_ERROR_MESSAGE),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

async fn published_statistics<S: SheetSource>(
    lookup: Arc<Lookup<S>>,
) -> Result<reply::Response, Rejection> {
    let body = ApiResponse::ok(
        "Estadísticas obtenidas exitosamente",
        &lookup.config().statistics,
    );
    Ok(json_with_status(&body, StatusCode::OK))
}

async fn live_stats<S: SheetSource>(lookup: Arc<Lookup<S>>) -> Result<reply::Response, Rejection> {
    match lookup.statistics().await {
        Ok(stats) => {
            let data = serde_json::json!({
                "total_diplomas": stats.total,
                "por_tipo": stats.by_degree,
                "hojas": stats.sheets,
                "ultima_actualizacion": Utc::now().to_rfc3339(),
            });
            Ok(json_with_status(
                &ApiResponse::ok("Estadísticas calculadas", data),
                StatusCode::OK,
            ))
        }
        Err(err) => Ok(lookup_error_reply(&err)),
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint no encontrado".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Cuerpo inválido: {}", e))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Parámetros inválidos".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Cuerpo demasiado grande".to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Método no permitido".to_string())
    } else {
        warn!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
    };
    Ok(json_with_status(&ApiResponse::failure(message), status))
}
