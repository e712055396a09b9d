use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use crate::directory::StaffDirectory;

use super::availability::{AvailabilityLedger, AvailabilitySlot};
use super::consolidated::{ConsolidatedViewService, ViewType};
use super::domain::{ErrorKind, RotaWeek, StaffId, StaffRole};
use super::draft::{DraftKey, DraftRepository, SchedulerDraftService};
use super::exchange::{ExchangeRepository, ExchangeService, SwapRequestId, VolunteerRequestId};
use super::requirements::{RequirementScope, StaffingRequirementsService};
use super::schedule::{
    AvailabilityRepository, EntryId, NotificationSink, RequirementRepository, ScheduleRepository,
};

/// Service bundle behind the rota HTTP surface.
pub struct RotaServices<AR, QR, DR, SR, XR, DI, N> {
    pub availability: AvailabilityLedger<AR>,
    pub requirements: StaffingRequirementsService<QR>,
    pub drafts: SchedulerDraftService<DR, SR, N>,
    pub exchanges: ExchangeService<SR, XR, DI, N>,
    pub views: ConsolidatedViewService<SR, DI>,
    pub directory: Arc<DI>,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Policy => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Dependency => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(kind: ErrorKind, error: impl std::fmt::Display) -> Response {
    let payload = json!({
        "error": error.to_string(),
        "kind": kind.label(),
    });
    (status_for(kind), axum::Json(payload)).into_response()
}

/// Router builder exposing the rota workflow operations.
pub fn rota_router<AR, QR, DR, SR, XR, DI, N>(
    services: Arc<RotaServices<AR, QR, DR, SR, XR, DI, N>>,
) -> Router
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/rota/availability",
            post(submit_availability::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/availability/:user_id",
            get(get_availability::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/requirements",
            post(set_requirement::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/staffing",
            get(classify_staffing::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/draft/assign",
            post(draft_assign::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/draft/save",
            post(draft_save::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/draft/publish",
            post(draft_publish::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/swaps",
            post(create_swap::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/swaps/:request_id/approve",
            post(approve_swap::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/swaps/:request_id/deny",
            post(deny_swap::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/relinquish",
            post(create_relinquish::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/relinquish/:request_id/volunteer",
            post(volunteer::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/relinquish/:request_id/approve",
            post(approve_volunteer::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/exchanges/relinquish/:request_id/cancel",
            post(cancel_relinquish::<AR, QR, DR, SR, XR, DI, N>),
        )
        .route(
            "/api/v1/rota/view/:view_type",
            get(consolidated_view::<AR, QR, DR, SR, XR, DI, N>),
        )
        .with_state(services)
}

type Services<AR, QR, DR, SR, XR, DI, N> = Arc<RotaServices<AR, QR, DR, SR, XR, DI, N>>;

#[derive(Debug, Deserialize)]
struct WeekQuery {
    week_start: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AvailabilitySubmitRequest {
    user_id: StaffId,
    week_start: NaiveDate,
    days: BTreeMap<NaiveDate, BTreeSet<AvailabilitySlot>>,
}

async fn submit_availability<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<AvailabilitySubmitRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let week = RotaWeek::containing(request.week_start);
    let now = Local::now().naive_local();
    match services
        .availability
        .submit(&request.user_id, week, request.days, now)
    {
        Ok(()) => (StatusCode::ACCEPTED, axum::Json(json!({ "status": "stored" })))
            .into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn get_availability<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(user_id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let week = RotaWeek::containing(query.week_start);
    match services.availability.get(&StaffId(user_id), week) {
        Ok(days) => (StatusCode::OK, axum::Json(days)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct RequirementUpsertRequest {
    actor_id: StaffId,
    scope: RequirementScope,
    date: NaiveDate,
    min_staff: u32,
    #[serde(default)]
    max_staff: Option<u32>,
}

async fn set_requirement<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<RequirementUpsertRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let actor = match services.directory.get_user(&request.actor_id) {
        Ok(Some(actor)) => actor,
        Ok(None) => {
            return error_response(
                ErrorKind::NotFound,
                format!("staff member {} not found", request.actor_id),
            )
        }
        Err(err) => return error_response(ErrorKind::Dependency, err),
    };

    match services.requirements.set_requirement(
        &actor,
        request.scope,
        request.date,
        request.min_staff,
        request.max_staff,
    ) {
        Ok(requirement) => (StatusCode::OK, axum::Json(requirement)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct StaffingQuery {
    scope: String,
    date: NaiveDate,
    assigned: u32,
}

async fn classify_staffing<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Query(query): Query<StaffingQuery>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let scope = RequirementScope::from_name(&query.scope);
    match services
        .requirements
        .classify(&scope, query.date, query.assigned)
    {
        Ok(level) => (
            StatusCode::OK,
            axum::Json(json!({
                "level": level,
                "label": level.label(),
                "css_class": level.css_class(),
            })),
        )
            .into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct DraftAssignRequest {
    role: StaffRole,
    week_start: NaiveDate,
    user_id: StaffId,
    date: NaiveDate,
    shift_type: String,
    #[serde(default)]
    custom_start: Option<String>,
    #[serde(default)]
    custom_end: Option<String>,
}

async fn draft_assign<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<DraftAssignRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let key = DraftKey {
        role: request.role,
        week: RotaWeek::containing(request.week_start),
    };
    match services.drafts.assign(
        &key,
        request.user_id,
        request.date,
        &request.shift_type,
        request.custom_start,
        request.custom_end,
    ) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "assigned" }))).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct DraftScopeRequest {
    role: StaffRole,
    week_start: NaiveDate,
}

async fn draft_save<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<DraftScopeRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let key = DraftKey {
        role: request.role,
        week: RotaWeek::containing(request.week_start),
    };
    match services.drafts.save_draft(&key) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "saved" }))).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct DraftPublishRequest {
    actor_id: StaffId,
    role: StaffRole,
    week_start: NaiveDate,
}

async fn draft_publish<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<DraftPublishRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let actor = match services.directory.get_user(&request.actor_id) {
        Ok(Some(actor)) => actor,
        Ok(None) => {
            return error_response(
                ErrorKind::NotFound,
                format!("staff member {} not found", request.actor_id),
            )
        }
        Err(err) => return error_response(ErrorKind::Dependency, err),
    };
    let key = DraftKey {
        role: request.role,
        week: RotaWeek::containing(request.week_start),
    };
    match services.drafts.publish(&actor, &key) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct SwapCreateRequest {
    entry_id: String,
    requester_id: StaffId,
    #[serde(default)]
    suggested_coverer: Option<StaffId>,
}

async fn create_swap<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<SwapCreateRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let now = Local::now().naive_local();
    match services.exchanges.request_swap(
        &EntryId(request.entry_id),
        &request.requester_id,
        request.suggested_coverer,
        now,
    ) {
        Ok(created) => (StatusCode::ACCEPTED, axum::Json(created)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct ChooseStaffRequest {
    user_id: StaffId,
}

async fn approve_swap<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ChooseStaffRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    match services
        .exchanges
        .approve_swap(&SwapRequestId(request_id), &request.user_id)
    {
        Ok(resolved) => (StatusCode::OK, axum::Json(resolved)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn deny_swap<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(request_id): Path<String>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    match services.exchanges.deny_swap(&SwapRequestId(request_id)) {
        Ok(resolved) => (StatusCode::OK, axum::Json(resolved)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

#[derive(Debug, Deserialize)]
struct RelinquishCreateRequest {
    entry_id: String,
    requester_id: StaffId,
    #[serde(default)]
    reason: Option<String>,
}

async fn create_relinquish<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    axum::Json(request): axum::Json<RelinquishCreateRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let now = Local::now().naive_local();
    match services.exchanges.relinquish(
        &EntryId(request.entry_id),
        &request.requester_id,
        request.reason,
        now,
    ) {
        Ok(created) => (StatusCode::ACCEPTED, axum::Json(created)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn volunteer<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ChooseStaffRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    match services
        .exchanges
        .volunteer(&VolunteerRequestId(request_id), &request.user_id)
    {
        Ok(updated) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn approve_volunteer<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ChooseStaffRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    match services
        .exchanges
        .approve_volunteer(&VolunteerRequestId(request_id), &request.user_id)
    {
        Ok(resolved) => (StatusCode::OK, axum::Json(resolved)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn cancel_relinquish<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ChooseStaffRequest>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    match services
        .exchanges
        .cancel_request(&VolunteerRequestId(request_id), &request.user_id)
    {
        Ok(resolved) => (StatusCode::OK, axum::Json(resolved)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}

async fn consolidated_view<AR, QR, DR, SR, XR, DI, N>(
    State(services): State<Services<AR, QR, DR, SR, XR, DI, N>>,
    Path(view_type): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Response
where
    AR: AvailabilityRepository + 'static,
    QR: RequirementRepository + 'static,
    DR: DraftRepository + 'static,
    SR: ScheduleRepository + 'static,
    XR: ExchangeRepository + 'static,
    DI: StaffDirectory + 'static,
    N: NotificationSink + 'static,
{
    let view_type = match ViewType::from_name(&view_type) {
        Ok(view_type) => view_type,
        Err(err) => return error_response(err.kind(), err),
    };
    let week = RotaWeek::containing(query.week_start);
    match services.views.week_view(view_type, week) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err.kind(), err),
    }
}
