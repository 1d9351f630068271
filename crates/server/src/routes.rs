//! HTTP routes fronting the automation core.
//!
//! Thin mapping layer: JSON bodies in, structured outcomes out. Login
//! failure and invalid sessions map to 401; surface-acquisition faults map
//! to 500. No automation detail leaks as a raw error body.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gamecode::{ChromiumProvider, Controller, Error, FeedbackMessage, SessionStore, Site};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<SessionStore>,
	pub provider: Arc<ChromiumProvider>,
	pub site: Arc<Site>,
}

impl AppState {
	pub fn new(store: SessionStore, site: Site) -> Self {
		let provider = ChromiumProvider::new(site.user_agent.clone());
		Self {
			store: Arc::new(store),
			provider: Arc::new(provider),
			site: Arc::new(site),
		}
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/login", post(login))
		.route("/api/submit-code", post(submit_code))
		.route("/api/logout", post(logout))
		.route("/api/health", get(health))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
	#[serde(default)]
	username: String,
	#[serde(default)]
	password: String,
	#[serde(default)]
	session_id: String,
	#[serde(default)]
	debug_mode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
	#[serde(default)]
	code: String,
	#[serde(default)]
	session_id: String,
	#[serde(default)]
	debug_mode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
	#[serde(default)]
	session_id: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
	success: bool,
	message: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
	success: bool,
	message: String,
	messages: Vec<FeedbackMessage>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
	error: String,
}

fn status(success: bool, message: &str) -> Json<StatusResponse> {
	Json(StatusResponse {
		success,
		message: message.to_string(),
	})
}

fn missing_fields() -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::BAD_REQUEST,
		Json(ErrorResponse {
			error: "Missing required fields".to_string(),
		}),
	)
}

async fn login(
	State(state): State<AppState>,
	Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), (StatusCode, Json<ErrorResponse>)> {
	if req.username.is_empty() || req.password.is_empty() || req.session_id.is_empty() {
		return Err(missing_fields());
	}

	let controller = Controller::new(state.provider.as_ref(), state.store.as_ref(), state.site.as_ref());
	match controller.login(&req.username, &req.password, &req.session_id, req.debug_mode).await {
		Ok(true) => Ok((StatusCode::OK, status(true, "Login successful"))),
		Ok(false) => Ok((StatusCode::UNAUTHORIZED, status(false, "Login failed"))),
		Err(err) => {
			error!(target = "gamecode.server", error = %err, "login request faulted");
			Ok((StatusCode::INTERNAL_SERVER_ERROR, status(false, "Server error")))
		}
	}
}

async fn submit_code(
	State(state): State<AppState>,
	Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<ErrorResponse>)> {
	if req.code.is_empty() || req.session_id.is_empty() {
		return Err(missing_fields());
	}

	let controller = Controller::new(state.provider.as_ref(), state.store.as_ref(), state.site.as_ref());
	match controller.submit_code(&req.code, &req.session_id, req.debug_mode).await {
		Ok(outcome) => {
			let message = if outcome.success {
				"Code submitted successfully"
			} else {
				"Code submission failed or already submitted"
			};
			Ok((
				StatusCode::OK,
				Json(SubmitResponse {
					success: outcome.success,
					message: message.to_string(),
					messages: outcome.messages,
				}),
			))
		}
		Err(Error::SessionInvalid) => Ok((
			StatusCode::UNAUTHORIZED,
			Json(SubmitResponse {
				success: false,
				message: "Session expired or invalid".to_string(),
				messages: Vec::new(),
			}),
		)),
		Err(err) => {
			error!(target = "gamecode.server", error = %err, "submit request faulted");
			Ok((
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(SubmitResponse {
					success: false,
					message: "Server error".to_string(),
					messages: Vec::new(),
				}),
			))
		}
	}
}

async fn logout(State(state): State<AppState>, Json(req): Json<LogoutRequest>) -> Json<StatusResponse> {
	if !req.session_id.is_empty() {
		let controller = Controller::new(state.provider.as_ref(), state.store.as_ref(), state.site.as_ref());
		controller.logout(&req.session_id);
	}
	status(true, "Logged out successfully")
}

#[derive(Debug, Serialize)]
struct Health {
	status: &'static str,
	timestamp: u64,
}

async fn health() -> Json<Health> {
	let timestamp = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64;
	Json(Health {
		status: "ok",
		timestamp,
	})
}
