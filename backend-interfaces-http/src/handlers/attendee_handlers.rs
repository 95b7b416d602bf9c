use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::dtos::{AttendeeDetail, AttendeeListQuery, AttendeePage};
use backend_application::queries::attendee_queries;
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_attendees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AttendeeListQuery>,
) -> Result<Json<AttendeePage>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let page = attendee_queries::list_attendees(&state, query).await?;
    Ok(Json(page))
}

pub async fn get_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AttendeeDetail>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let detail = attendee_queries::get_attendee_detail(&state, &id).await?;
    Ok(Json(detail))
}
