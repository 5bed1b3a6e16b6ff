use crate::backend::{AvailabilityLedger, IdentityStore};
use crate::booking::BookingWorkflow;
use crate::error::BookingError;
use crate::types::{Booking, LedgerAudit, Session};
use axum::extract::{Path, Request};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use axum::{
    routing::{get, post},
    Router,
};
use chrono::NaiveDateTime;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

pub const SESSION_HEADER: &str = "x-session-token";

pub struct AppState<L, I> {
    pub workflow: BookingWorkflow<L, I>,
}

impl<L, I> Clone for AppState<L, I> {
    fn clone(&self) -> Self {
        Self {
            workflow: self.workflow.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct LoginRequest {
    #[validate(length(min = 1))]
    username: String,
    password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginResponse {
    token: Uuid,
    username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct BookingRequest {
    #[validate(length(min = 1))]
    provider: String,
    slot: NaiveDateTime,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::InvalidCredentials | BookingError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            BookingError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable { .. } => StatusCode::CONFLICT,
            BookingError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::UnknownUser(_)
            | BookingError::UserAlreadyExists(_)
            | BookingError::SlotNotReserved { .. }
            | BookingError::ScheduleAlreadyGenerated(_)
            | BookingError::InvalidSchedule(_)
            | BookingError::CredentialHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

fn validate<T: Validate>(request: &T) -> Result<(), BookingError> {
    request
        .validate()
        .map_err(|err| BookingError::InvalidRequest(err.to_string()))
}

pub fn create_app<L: AvailabilityLedger, I: IdentityStore>(
    workflow: BookingWorkflow<L, I>,
) -> Router {
    let state = AppState { workflow };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/login", post(login::<L, I>))
        .route("/providers", get(get_providers::<L, I>))
        .route("/providers/:provider/slots", get(get_open_slots::<L, I>))
        .route(
            "/providers/:provider/slots/stream",
            get(stream_open_slots::<L, I>),
        )
        .route("/providers/:provider/audit", get(get_audit::<L, I>));

    let private = Router::new()
        .route("/logout", post(logout::<L, I>))
        .route("/book", post(book_appointment::<L, I>))
        .route("/bookings", get(get_bookings::<L, I>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth::<L, I>,
        ));

    Router::new()
        .merge(public)
        .merge(private)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn session_auth<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    mut request: Request,
    next: Next,
) -> Result<Response, BookingError> {
    let Some(token) = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| Uuid::parse_str(header).ok())
    else {
        warn!(uri = %request.uri(), "Request without valid session token");
        return Err(BookingError::Unauthenticated);
    };

    let session = state.workflow.session(token)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

async fn login<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, BookingError> {
    validate(&credentials)?;
    let session = state
        .workflow
        .login(&credentials.username, &credentials.password)?;
    Ok(Json(LoginResponse {
        token: session.token,
        username: session.username,
    }))
}

async fn logout<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    state.workflow.logout(&session);
    (StatusCode::OK, "Logged out".to_string())
}

async fn get_providers<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
) -> Json<Vec<String>> {
    Json(state.workflow.providers())
}

async fn get_open_slots<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Path(provider): Path<String>,
) -> Result<Json<Vec<NaiveDateTime>>, BookingError> {
    Ok(Json(state.workflow.list_open_slots(&provider)?))
}

async fn stream_open_slots<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Path(provider): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, BookingError> {
    let slot_stream = state.workflow.slot_stream(&provider)?;
    let events = slot_stream.map(|slots| Event::default().event("slots").json_data(slots));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn get_audit<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Path(provider): Path<String>,
) -> Result<Json<LedgerAudit>, BookingError> {
    Ok(Json(state.workflow.audit(&provider)?))
}

async fn book_appointment<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Extension(session): Extension<Session>,
    Json(booking): Json<BookingRequest>,
) -> Result<Json<Booking>, BookingError> {
    validate(&booking)?;
    let booking = state
        .workflow
        .book_appointment(&session, &booking.provider, booking.slot)?;
    Ok(Json(booking))
}

async fn get_bookings<L: AvailabilityLedger, I: IdentityStore>(
    State(state): State<AppState<L, I>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Booking>>, BookingError> {
    Ok(Json(state.workflow.list_bookings(&session)?))
}
