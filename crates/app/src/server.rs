//! HTTP surface

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use hadir_ipc::{
    CheckInRecord, CheckInStatus, DeleteResponse, IdList, LoginForm, NewRosterEntry,
    RenderSignatureRequest, RenderSignatureResponse, RosterEntry, RosterFilter, RosterRow,
    SearchQuery, ServerEvent, SubmitCheckIn,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::{authenticate, login_page};
use crate::error::AppError;
use crate::export::{XLSX_MIME, build_xlsx, print_html};
use crate::feed::{server_events, subscribe_check_ins};
use crate::session::{DASHBOARD_HOME, LOGIN_PATH, clear_cookie, gate_layer, session_cookie};
use crate::state::AppState;

type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/roster/search", get(search_roster))
        .route("/api/check-ins", post(submit_check_in))
        .route("/api/check-ins/status/:id", get(check_in_status))
        .route("/api/profile/:id", get(profile))
        .route("/api/signature/render", post(render_signature))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard_root))
        .route("/dashboard/daftar-hadir", get(dashboard_home))
        .route(
            "/dashboard/api/check-ins",
            get(list_check_ins).delete(delete_check_ins),
        )
        .route("/dashboard/api/check-ins/stream", get(check_in_stream))
        .route(
            "/dashboard/api/roster",
            get(roster).post(add_participant).delete(delete_participants),
        )
        .route("/dashboard/api/departments", get(departments))
        .route("/dashboard/export/xlsx", get(export_xlsx))
        .route("/dashboard/export/print", get(export_print))
        .layer(middleware::from_fn_with_state(state.clone(), gate_layer))
        .with_state(state)
}

/// Serve until the listener fails or `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "status": "ok", "backend": state.backend.name() }))
}

async fn search_roster(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    Ok(Json(state.checkin.search_roster(&query.q).await?))
}

async fn check_in_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<CheckInStatus>, AppError> {
    let checked_in = state.checkin.check_in_status(&id).await?;
    Ok(Json(CheckInStatus { checked_in }))
}

async fn submit_check_in(
    State(state): State<SharedState>,
    Json(request): Json<SubmitCheckIn>,
) -> Result<(StatusCode, Json<CheckInRecord>), AppError> {
    let record = state
        .checkin
        .submit(&request.participant_id, &request.signature)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<CheckInRecord>, AppError> {
    Ok(Json(state.checkin.profile(&id).await?))
}

async fn render_signature(
    State(state): State<SharedState>,
    Json(request): Json<RenderSignatureRequest>,
) -> Result<Json<RenderSignatureResponse>, AppError> {
    let service = state.checkin.clone();
    let response = tokio::task::spawn_blocking(move || service.render_signature(request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(response))
}

async fn login_form() -> Html<String> {
    Html(login_page(None))
}

async fn login(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    match authenticate(&state.config.auth, &form) {
        Ok(()) => {
            let cookie = session_cookie(&state.config.auth, state.config.server.production);
            ([(SET_COOKIE, cookie)], Redirect::to(DASHBOARD_HOME)).into_response()
        }
        Err(e) => (e.status_code(), Html(login_page(Some(&e.user_message())))).into_response(),
    }
}

async fn logout(State(state): State<SharedState>) -> impl IntoResponse {
    let cookie = clear_cookie(&state.config.auth, state.config.server.production);
    ([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH))
}

async fn dashboard_root() -> Redirect {
    Redirect::temporary(DASHBOARD_HOME)
}

async fn dashboard_home(State(state): State<SharedState>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>
<html lang=\"id\">
<head><meta charset=\"utf-8\"><title>Dashboard</title></head>
<body>
<h1>{}</h1>
<ul>
<li><a href=\"/dashboard/api/check-ins\">Daftar hadir (JSON)</a></li>
<li><a href=\"/dashboard/api/roster\">Daftar nama (JSON)</a></li>
<li><a href=\"/dashboard/export/xlsx\">Export Excel</a></li>
<li><a href=\"/dashboard/export/print\">Cetak / PDF</a></li>
</ul>
<form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form>
</body>
</html>
",
        crate::export::escape_html(&state.config.event.title)
    ))
}

async fn list_check_ins(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CheckInRecord>>, AppError> {
    Ok(Json(state.admin.list_check_ins().await?))
}

async fn delete_check_ins(
    State(state): State<SharedState>,
    Json(request): Json<IdList>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.admin.delete_check_ins(&request.ids).await?;
    Ok(Json(DeleteResponse { deleted }))
}

fn sse_event(event: &ServerEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| {
            warn!("Failed to encode server event: {}", e);
            Event::default().event("error")
        })
}

async fn check_in_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = subscribe_check_ins(&state.backend).await?;
    let events = server_events(subscription).map(|event| Ok(sse_event(&event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn roster(
    State(state): State<SharedState>,
    Query(filter): Query<RosterFilter>,
) -> Result<Json<Vec<RosterRow>>, AppError> {
    Ok(Json(state.admin.roster(&filter).await?))
}

async fn add_participant(
    State(state): State<SharedState>,
    Json(request): Json<NewRosterEntry>,
) -> Result<(StatusCode, Json<RosterEntry>), AppError> {
    let entry = state.admin.add_participant(&request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_participants(
    State(state): State<SharedState>,
    Json(request): Json<IdList>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.admin.delete_participants(&request.ids).await?;
    Ok(Json(DeleteResponse { deleted }))
}

async fn departments(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.admin.departments().to_vec())
}

async fn export_xlsx(State(state): State<SharedState>) -> Result<Response, AppError> {
    let records = state.admin.list_check_ins().await?;
    let now = Utc::now();
    let bytes = build_xlsx(&state.export, &records, now)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.export.xlsx_filename(now)
    );
    Ok((
        [(CONTENT_TYPE, XLSX_MIME.to_string()), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response())
}

async fn export_print(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let records = state.admin.list_check_ins().await?;
    Ok(Html(print_html(&state.export, &records, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_roster, signature_uri};
    use hadir_config::{AppConfig, Credential};
    use hadir_ipc::ErrorBody;
    use hadir_store::MemoryBackend;
    use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};

    struct TestServer {
        base: String,
        memory: MemoryBackend,
        client: reqwest::Client,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }
    }

    async fn start() -> TestServer {
        let memory = MemoryBackend::new();
        let mut config = AppConfig::default();
        config.auth.credentials = vec![Credential::new("admin", "rahasia")];
        let state = AppState::new(config, memory.clone().into());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state, std::future::pending()));

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        TestServer {
            base: format!("http://{addr}"),
            memory,
            client,
        }
    }

    const SESSION: &str = "admin_session=1";

    #[tokio::test]
    async fn test_healthz() {
        let server = start().await;
        let response = server.client.get(server.url("/healthz")).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let server = start().await;
        let response = server
            .client
            .get(server.url("/dashboard/api/check-ins"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 307);
        assert_eq!(response.headers()[LOCATION], "/login");

        let response = server
            .client
            .get(server.url("/dashboard/api/check-ins"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let records: Vec<CheckInRecord> = response.json().await.unwrap();
        assert!(records.is_empty());

        let response = server
            .client
            .get(server.url("/login"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 307);
        assert_eq!(response.headers()[LOCATION], DASHBOARD_HOME);
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let server = start().await;
        let response = server
            .client
            .post(server.url("/login"))
            .form(&[("username", "admin"), ("password", "salah")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        assert!(response.text().await.unwrap().contains("Username atau password salah"));

        let response = server
            .client
            .post(server.url("/login"))
            .form(&[("username", "admin"), ("password", "rahasia")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303);
        assert_eq!(response.headers()[LOCATION], DASHBOARD_HOME);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_session=1;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        let response = server
            .client
            .post(server.url("/logout"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303);
        assert_eq!(response.headers()[LOCATION], LOGIN_PATH);
        assert!(
            response.headers()[SET_COOKIE]
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );
    }

    #[tokio::test]
    async fn test_check_in_flow() {
        let server = start().await;
        let entry = seed_roster(&server.memory, "Oki Pratama", "Manager", "DEPT. OF ICT").await;

        let hits: Vec<RosterEntry> = server
            .client
            .get(server.url("/api/roster/search?q=pra"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let submit = SubmitCheckIn {
            participant_id: entry.id.clone(),
            signature: signature_uri(),
        };
        let response = server
            .client
            .post(server.url("/api/check-ins"))
            .json(&submit)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let record: CheckInRecord = response.json().await.unwrap();

        let response = server
            .client
            .post(server.url("/api/check-ins"))
            .json(&submit)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
        let error: ErrorBody = response.json().await.unwrap();
        assert_eq!(error.code, "already_checked_in");
        assert_eq!(error.message, "Anda sudah check-in sebelumnya.");

        let status: CheckInStatus = server
            .client
            .get(server.url(&format!("/api/check-ins/status/{}", entry.id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(status.checked_in);

        let profile: CheckInRecord = server
            .client
            .get(server.url(&format!("/api/profile/{}", entry.id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile.id, record.id);

        let rows: Vec<RosterRow> = server
            .client
            .get(server.url("/dashboard/api/roster?status=checked-in"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].checked_in);

        let response = server
            .client
            .delete(server.url("/dashboard/api/check-ins"))
            .header(COOKIE, SESSION)
            .json(&IdList {
                ids: vec![record.id],
            })
            .send()
            .await
            .unwrap();
        let deleted: DeleteResponse = response.json().await.unwrap();
        assert_eq!(deleted.deleted, 1);
        assert_eq!(server.memory.blob_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_participant_is_404() {
        let server = start().await;
        let response = server
            .client
            .get(server.url("/api/profile/nobody"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let error: ErrorBody = response.json().await.unwrap();
        assert_eq!(error.message, "Data peserta tidak ditemukan.");
    }

    #[tokio::test]
    async fn test_roster_management() {
        let server = start().await;
        let response = server
            .client
            .post(server.url("/dashboard/api/roster"))
            .header(COOKIE, SESSION)
            .json(&NewRosterEntry {
                nama: "Putri".into(),
                jabatan: "Staf".into(),
                departemen_instansi: "SKST".into(),
            })
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let entry: RosterEntry = response.json().await.unwrap();

        let response = server
            .client
            .post(server.url("/dashboard/api/roster"))
            .header(COOKIE, SESSION)
            .json(&NewRosterEntry {
                nama: "Putra".into(),
                jabatan: " ".into(),
                departemen_instansi: "SKST".into(),
            })
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let deleted: DeleteResponse = server
            .client
            .delete(server.url("/dashboard/api/roster"))
            .header(COOKIE, SESSION)
            .json(&IdList { ids: vec![entry.id] })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deleted.deleted, 1);

        let departments: Vec<String> = server
            .client
            .get(server.url("/dashboard/api/departments"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(departments.iter().any(|d| d == "DIREKSI"));
    }

    #[tokio::test]
    async fn test_exports() {
        let server = start().await;
        let entry = seed_roster(&server.memory, "Rina", "Staf", "YKST").await;
        server
            .client
            .post(server.url("/api/check-ins"))
            .json(&SubmitCheckIn {
                participant_id: entry.id,
                signature: signature_uri(),
            })
            .send()
            .await
            .unwrap();

        let response = server
            .client
            .get(server.url("/dashboard/export/xlsx"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[CONTENT_TYPE], XLSX_MIME);
        let disposition = response.headers()[CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("Daftar_Hadir_Rapat_BODES1_2026_"));
        assert!(response.bytes().await.unwrap().starts_with(b"PK"));

        let html = server
            .client
            .get(server.url("/dashboard/export/print"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains("Rina"));
        assert!(html.contains("Total: 1 peserta"));
    }

    #[tokio::test]
    async fn test_check_in_stream_is_event_stream() {
        let server = start().await;
        let response = server
            .client
            .get(server.url("/dashboard/api/check-ins/stream"))
            .header(COOKIE, SESSION)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(
            response.headers()[CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );
    }

    #[tokio::test]
    async fn test_render_signature_route() {
        let server = start().await;
        let response: RenderSignatureResponse = server
            .client
            .post(server.url("/api/signature/render"))
            .json(&json!({
                "width": 100.0,
                "height": 50.0,
                "inputs": [
                    { "type": "down", "client_x": 10.0, "client_y": 10.0 },
                    { "type": "up" }
                ]
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(response.signature.unwrap().starts_with("data:image/jpeg;base64,"));

        let response = server
            .client
            .post(server.url("/api/signature/render"))
            .json(&json!({
                "width": 2048.0,
                "height": 2048.0,
                "device_pixel_ratio": 2.0,
                "inputs": [{ "type": "up" }]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.code, "validation");
    }
}
