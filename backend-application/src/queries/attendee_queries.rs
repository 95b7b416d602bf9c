use backend_domain::{eligibility, AttendeeId, AttendeeSummary, ScanCategory};

use crate::dtos::{AttendeeDetail, AttendeeListQuery, AttendeePage, CategoryEligibility, PagedResult};
use crate::{AppError, AppState};

pub const ITEMS_PER_PAGE: usize = 30;
pub const DETAIL_SCAN_LIMIT: usize = 250;

pub async fn list_attendees(
    state: &AppState,
    query: AttendeeListQuery,
) -> Result<AttendeePage, AppError> {
    let mut attendees = state.attendee_repo.list_attendees().await?;

    let needle = query
        .search
        .as_deref()
        .map(|search| search.trim().to_lowercase())
        .unwrap_or_default();
    if !needle.is_empty() {
        attendees.retain(|attendee| matches_search(attendee, &needle));
    }
    attendees.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(paginate(attendees, query.page.unwrap_or(1)))
}

fn matches_search(attendee: &AttendeeSummary, needle: &str) -> bool {
    attendee.display_name.to_lowercase().contains(needle)
        || attendee.email.to_lowercase().contains(needle)
        || attendee.id.as_str().to_lowercase().contains(needle)
}

fn paginate<T>(items: Vec<T>, page: usize) -> PagedResult<T> {
    let total = items.len();
    let total_pages = total.div_ceil(ITEMS_PER_PAGE).max(1);
    let page = page.clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * ITEMS_PER_PAGE)
        .take(ITEMS_PER_PAGE)
        .collect();
    PagedResult {
        items,
        page,
        total_pages,
        total,
    }
}

pub async fn get_attendee_detail(state: &AppState, id: &str) -> Result<AttendeeDetail, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest("attendee id must not be empty".to_string()));
    }
    let attendee_id = AttendeeId::from(id);
    let attendee = state
        .attendee_repo
        .find_by_id(&attendee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendee {} not found", id)))?;
    let scans = state
        .attendee_repo
        .list_scan_events(&attendee_id, DETAIL_SCAN_LIMIT)
        .await?;
    let eligibility = ScanCategory::ALL
        .into_iter()
        .map(|category| CategoryEligibility {
            category,
            label: category.label(),
            state: eligibility(&attendee.flags, category),
        })
        .collect();

    Ok(AttendeeDetail {
        attendee,
        eligibility,
        scans,
    })
}
