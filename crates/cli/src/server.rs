//! HTTP intake surface.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_protocol::{ErrorDetail, LeadRequest, SentLeadsResponse, SessionStatus};
use tracing::{error, info};

use crate::error::{CliError, Result};
use crate::intake::IntakeService;

pub fn router(intake: Arc<IntakeService>) -> Router {
	Router::new()
		.route("/fetch-leads/", post(fetch_leads))
		.route("/session/status", get(session_status))
		.with_state(intake)
}

/// Serves [`router`] on `bind` until Ctrl+C.
pub async fn serve(intake: Arc<IntakeService>, bind: &str) -> Result<()> {
	let listener = tokio::net::TcpListener::bind(bind)
		.await
		.map_err(|e| CliError::Server(format!("Failed to bind to {bind}: {e}")))?;
	info!(target = "outreach.server", %bind, "intake server listening");

	axum::serve(listener, router(intake))
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await
		.map_err(|e| CliError::Server(format!("Server error: {e}")))
}

async fn fetch_leads(State(intake): State<Arc<IntakeService>>, Json(request): Json<LeadRequest>) -> Response {
	match intake.process(&request).await {
		Ok(sent_leads) if sent_leads.is_empty() => (StatusCode::NOT_FOUND, Json(ErrorDetail::new("No new leads found"))).into_response(),
		Ok(sent_leads) => Json(SentLeadsResponse { sent_leads }).into_response(),
		Err(err) => {
			error!(target = "outreach.server", error = %err, "intake pass failed");
			(StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorDetail::new(err.to_string()))).into_response()
		}
	}
}

async fn session_status(State(intake): State<Arc<IntakeService>>) -> Json<SessionStatus> {
	let orchestrator = intake.orchestrator();
	let phase = orchestrator.current_phase();
	Json(SessionStatus {
		phase: phase.as_str().to_string(),
		awaiting_approval: phase.is_awaiting_approval(),
		session_file: orchestrator.store().path().display().to_string(),
		session_present: orchestrator.store().exists(),
	})
}
