use std::{collections::BTreeMap, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Local;
use server_api::{submit, submit_columns, ApiContext};
use shared::{
    domain::header,
    error::{ApiError, ErrorCode},
    form::FieldValue,
    protocol::{CatalogResponse, SubmissionReceipt},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod app_state;
mod config;
mod render;
mod session;

use app_state::AppState;
use config::{load_settings, sheets_backend};
use render::PageRenderer;
use session::{SessionStore, SESSION_COOKIE};

const MAX_BODY_BYTES: usize = 256 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let sheets = sheets_backend(&settings)?;
    let state = AppState {
        api: ApiContext { sheets },
        sessions: SessionStore::new(Duration::from_secs(settings.session_ttl_seconds)),
        pages: PageRenderer::new()?,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address `{}`", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(show_form))
        .route("/submit", post(submit_form))
        .route("/reset", post(reset_form))
        .route("/api/submissions", post(api_submit))
        .route("/api/fields", get(api_fields))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn show_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (id, session) = state.sessions.open(session_id(&jar)).await;
    let jar = jar.add(session_cookie(id));
    let mut session = session.lock().await;
    let notice = session.take_notice();

    match state
        .pages
        .render(&session.form, notice.as_ref(), session.submissions)
    {
        Ok(page) => (jar, Html(page)).into_response(),
        Err(err) => render_failure(err),
    }
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let (id, session) = state.sessions.open(session_id(&jar)).await;
    let jar = jar.add(session_cookie(id));
    let mut session = session.lock().await;
    session.form.apply_pairs(pairs);

    match submit(&state.api, &mut session, Local::now().naive_local()).await {
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err(err) => {
            // The answers stay in the session; show them again with the error.
            let notice = session.take_notice();
            match state
                .pages
                .render(&session.form, notice.as_ref(), session.submissions)
            {
                Ok(page) => (status_for(err.code), jar, Html(page)).into_response(),
                Err(render_err) => render_failure(render_err),
            }
        }
    }
}

async fn reset_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (id, session) = state.sessions.open(session_id(&jar)).await;
    server_api::reset(&mut *session.lock().await);
    (jar.add(session_cookie(id)), Redirect::to("/"))
}

async fn api_submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BTreeMap<String, FieldValue>>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>, (StatusCode, Json<ApiError>)> {
    let Json(columns) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
        )
    })?;
    let record = submit_columns(&state.api, columns, Local::now().naive_local())
        .await
        .map_err(|e| (status_for(e.code), Json(e)))?;
    Ok(Json(SubmissionReceipt {
        timestamp: record.timestamp().to_string(),
        columns: header().len(),
    }))
}

async fn api_fields() -> Json<CatalogResponse> {
    Json(CatalogResponse::current())
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
    }
}

fn render_failure(err: anyhow::Error) -> Response {
    error!(error = %err, "failed to render form page");
    (StatusCode::INTERNAL_SERVER_ERROR, "failed to render the form").into_response()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
