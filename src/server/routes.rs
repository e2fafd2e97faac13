use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    stats::{
        course_overview, cumulative_stats, group_by_week, is_valid_rate,
        ordering::sort_entries_newest_first, weekly_stats, CourseOverview, CumulativeStats,
        WeekGroup, WeeklyStats,
    },
    storage::entities::{rate_from_value, CourseRates, TimeEntry},
};

use super::{
    error::{ApiError, ApiResult},
    AppState,
};

pub async fn list_entries(State(state): State<AppState>) -> ApiResult<Json<Vec<TimeEntry>>> {
    Ok(Json(state.entries.list().await?))
}

/// Stores a new entry. Missing ids and creation timestamps are filled in, everything else is
/// stored exactly as sent.
#[instrument(skip_all)]
pub async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<TimeEntry>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TimeEntry>)> {
    let Json(mut entry) = payload?;

    if entry.id.trim().is_empty() {
        entry.id = Uuid::new_v4().to_string();
    }
    if entry.created_at.is_empty() {
        entry.created_at = state.clock.timestamp();
    }

    if !state.entries.insert(entry.clone()).await? {
        return Err(ApiError::Validation(format!(
            "Entry {} already exists.",
            entry.id
        )));
    }
    info!("Created entry {}", entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Replaces an entry as a whole. The id from the path always wins over the one in the body.
#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TimeEntry>, JsonRejection>,
) -> ApiResult<Json<TimeEntry>> {
    let Json(entry) = payload?;

    let entry = entry.with_id(id);
    if !state.entries.replace(entry.clone()).await? {
        return Err(ApiError::NotFound("Entry not found.".into()));
    }
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.entries.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Entry not found.".into()))
    }
}

/// Newest first entries split into weeks.
pub async fn entries_by_week(State(state): State<AppState>) -> ApiResult<Json<Vec<WeekGroup>>> {
    let entries = sort_entries_newest_first(state.entries.list().await?);
    Ok(Json(group_by_week(entries)))
}

pub async fn list_rates(State(state): State<AppState>) -> ApiResult<Json<CourseRates>> {
    Ok(Json(state.rates.list().await?))
}

/// Body of `PUT /api/course-rates`. Values are checked by hand so that numeric strings are
/// accepted and every broken value gets the same message.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateUpsert {
    #[serde(default)]
    pub course_name: Value,
    #[serde(default)]
    pub rate: Value,
}

impl RateUpsert {
    fn validate(&self) -> ApiResult<(String, f64)> {
        let course_name = match &self.course_name {
            Value::String(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => return Err(ApiError::Validation("courseName is required.".into())),
        };

        match rate_from_value(&self.rate) {
            Some(rate) if is_valid_rate(rate) => Ok((course_name, rate)),
            _ => Err(ApiError::Validation(
                "rate must be a non-negative number.".into(),
            )),
        }
    }
}

#[instrument(skip_all)]
pub async fn upsert_rate(
    State(state): State<AppState>,
    payload: Result<Json<RateUpsert>, JsonRejection>,
) -> ApiResult<Json<CourseRates>> {
    let Json(payload) = payload?;
    let (course_name, rate) = payload.validate()?;
    debug!("Setting rate of {course_name} to {rate}");
    Ok(Json(state.rates.put(&course_name, rate).await?))
}

/// Removing a course that has no rate is not an error.
#[instrument(skip(state))]
pub async fn delete_rate(
    State(state): State<AppState>,
    Path(course_name): Path<String>,
) -> ApiResult<StatusCode> {
    state.rates.delete(course_name.trim()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cumulative: CumulativeStats,
    pub weekly: Vec<WeeklyStats>,
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let entries = state.entries.list().await?;
    let rates = state.rates.list().await?;
    Ok(Json(StatsResponse {
        cumulative: cumulative_stats(&entries, &rates),
        weekly: weekly_stats(&entries, &rates),
    }))
}

pub async fn courses(State(state): State<AppState>) -> ApiResult<Json<CourseOverview>> {
    let entries = state.entries.list().await?;
    let rates = state.rates.list().await?;
    Ok(Json(course_overview(&entries, &rates)))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}
