use super::*;
use axum::{
    body::{self, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request,
    },
};
use server_api::{SheetsBackend, NOT_CONFIGURED_MESSAGE, SUCCESS_MESSAGE};
use sheets_integration::{MemorySheetStore, MissingConfig};
use tower::ServiceExt;

fn test_app(sheets: SheetsBackend) -> Router {
    build_router(Arc::new(AppState {
        api: ApiContext { sheets },
        sessions: SessionStore::new(Duration::from_secs(60)),
        pages: PageRenderer::new().expect("renderer"),
    }))
}

fn memory_app() -> (Router, Arc<MemorySheetStore>) {
    let store = Arc::new(MemorySheetStore::new());
    (test_app(SheetsBackend::Ready(store.clone())), store)
}

/// `name=value` of the session cookie set by `response`.
fn session_cookie_of(response: &Response) -> String {
    let raw = response
        .headers()
        .get(SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .expect("ascii cookie");
    let pair = raw.split(';').next().expect("cookie pair").to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

async fn text_of(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

async fn open_form(app: &Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie_of(&response);
    (cookie, text_of(response).await)
}

fn form_post(path: &str, cookie: &str, body: &'static str) -> Request<Body> {
    Request::post(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(COOKIE, cookie)
        .body(Body::from(body))
        .expect("request")
}

fn get_with_cookie(cookie: &str) -> Request<Body> {
    Request::get("/")
        .header(COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

const FILLED_FORM: &str = "titulo=Fadiga+de+UHPFRC&orientador=Prof.+Silva\
&foco=Durabilidade&foco=Outro&foco_outro=Corros%C3%A3o&tipo_estudo=Num%C3%A9rico";

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _store) = memory_app();
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_of(response).await, "ok");
}

#[tokio::test]
async fn form_page_sets_session_cookie_and_renders_every_section() {
    let (app, _store) = memory_app();
    let (cookie, page) = open_form(&app).await;

    assert!(cookie.len() > SESSION_COOKIE.len() + 1);
    assert!(page.contains(r#"id="form_projeto_0""#));
    assert!(page.contains("1. Identificação Básica"));
    assert!(page.contains("10. Diferencial do Candidato"));
    assert!(page.contains(r#"value="Experimental" checked"#));
    assert!(page.contains(r#"name="duracao" value="24""#));
}

#[tokio::test]
async fn submit_appends_row_redirects_and_clears_form() {
    let (app, store) = memory_app();
    let (cookie, _page) = open_form(&app).await;

    let response = app
        .clone()
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).expect("location"),
        "/"
    );

    let rows = store.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], header());
    assert_eq!(rows[1][1], "Fadiga de UHPFRC");
    assert_eq!(rows[1][2], "Prof. Silva");
    assert_eq!(rows[1][8], "Durabilidade, Outro");
    assert_eq!(rows[1][9], "Corrosão");
    assert_eq!(rows[1][11], "Numérico");

    let response = app
        .oneshot(get_with_cookie(&cookie))
        .await
        .expect("response");
    let page = text_of(response).await;
    assert!(page.contains(SUCCESS_MESSAGE));
    assert!(page.contains(r#"id="form_projeto_1""#));
    assert!(!page.contains("Fadiga de UHPFRC"));
    assert!(page.contains("Envios nesta sessão: 1"));
}

#[tokio::test]
async fn success_notice_is_shown_once() {
    let (app, _store) = memory_app();
    let (cookie, _page) = open_form(&app).await;
    app.clone()
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("submit");

    let first = text_of(
        app.clone()
            .oneshot(get_with_cookie(&cookie))
            .await
            .expect("response"),
    )
    .await;
    let second = text_of(app.oneshot(get_with_cookie(&cookie)).await.expect("response")).await;
    assert!(first.contains(SUCCESS_MESSAGE));
    assert!(!second.contains(SUCCESS_MESSAGE));
}

#[tokio::test]
async fn failed_append_keeps_answers_on_the_page() {
    let (app, store) = memory_app();
    store.reject_appends(Some("quota exceeded"));
    let (cookie, _page) = open_form(&app).await;

    let response = app
        .clone()
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let page = text_of(response).await;
    assert!(page.contains(server_api::FAILURE_MESSAGE));
    assert!(page.contains("<pre>quota exceeded</pre>"));
    assert!(page.contains(r#"value="Fadiga de UHPFRC""#));
    assert!(page.contains(r#"value="Numérico" checked"#));
    assert!(page.contains(r#"id="form_projeto_0""#));

    store.reject_appends(None);
    let response = app
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("retry");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.rows().len(), 2);
}

#[tokio::test]
async fn missing_configuration_is_reported_without_writing() {
    let app = test_app(SheetsBackend::Missing(MissingConfig::SpreadsheetId));
    let (cookie, _page) = open_form(&app).await;

    let response = app
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let page = text_of(response).await;
    assert!(page.contains(NOT_CONFIGURED_MESSAGE));
    assert!(page.contains("SPREADSHEET_ID"));
    assert!(page.contains(r#"value="Prof. Silva""#));
}

#[tokio::test]
async fn reset_redirects_to_a_fresh_form() {
    let (app, store) = memory_app();
    store.reject_appends(Some("offline"));
    let (cookie, _page) = open_form(&app).await;
    app.clone()
        .oneshot(form_post("/submit", &cookie, FILLED_FORM))
        .await
        .expect("submit");

    let response = app
        .clone()
        .oneshot(form_post("/reset", &cookie, FILLED_FORM))
        .await
        .expect("reset");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = text_of(app.oneshot(get_with_cookie(&cookie)).await.expect("response")).await;
    assert!(page.contains(r#"id="form_projeto_1""#));
    assert!(!page.contains("Fadiga de UHPFRC"));
    assert!(page.contains(r#"value="Experimental" checked"#));
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn unknown_session_cookie_gets_a_new_session() {
    let (app, _store) = memory_app();
    let response = app
        .oneshot(get_with_cookie("form_session=not-a-uuid"))
        .await
        .expect("response");
    let cookie = session_cookie_of(&response);
    assert_ne!(cookie, "form_session=not-a-uuid");
}

#[tokio::test]
async fn api_submission_appends_row_keyed_by_column() {
    let (app, store) = memory_app();
    let request = Request::post("/api/submissions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "titulo": "Fadiga de UHPFRC",
                "foco": ["Durabilidade"],
                "duracao_meses": "36",
            })
            .to_string(),
        ))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let receipt: SubmissionReceipt =
        serde_json::from_str(&text_of(response).await).expect("receipt");
    assert_eq!(receipt.columns, header().len());

    let rows = store.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], receipt.timestamp);
    assert_eq!(rows[1][1], "Fadiga de UHPFRC");
    assert_eq!(rows[1][8], "Durabilidade");
    assert_eq!(rows[1][29], "36");
}

#[tokio::test]
async fn api_submission_rejects_unknown_columns() {
    let (app, store) = memory_app();
    let request = Request::post("/api/submissions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "nao_existe": "x" }).to_string(),
        ))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_str(&text_of(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::Validation);
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn api_submission_with_a_non_text_value_is_a_validation_error() {
    let (app, store) = memory_app();
    let request = Request::post("/api/submissions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"duracao_meses": 24}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_str(&text_of(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::Validation);
    assert!(error.message.contains("duracao_meses"));
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn api_submission_with_malformed_json_is_a_validation_error() {
    let (app, _store) = memory_app();
    let request = Request::post("/api/submissions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"titulo": "#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_str(&text_of(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::Validation);
}

#[tokio::test]
async fn api_submission_reports_missing_configuration() {
    let app = test_app(SheetsBackend::Missing(MissingConfig::Credentials));
    let request = Request::post("/api/submissions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let error: ApiError = serde_json::from_str(&text_of(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::NotConfigured);
}

#[tokio::test]
async fn fields_route_describes_the_catalog() {
    let (app, _store) = memory_app();
    let response = app
        .oneshot(Request::get("/api/fields").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let catalog: serde_json::Value =
        serde_json::from_str(&text_of(response).await).expect("json");
    assert_eq!(catalog["sections"].as_array().expect("sections").len(), 10);
    assert_eq!(catalog["header"][0], "timestamp");
    assert_eq!(catalog["header"][38], "payload_json");
    assert_eq!(catalog["sections"][1]["fields"][2]["kind"]["kind"], "multi_select");
}
