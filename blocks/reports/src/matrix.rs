use crate::types::{NoteBlock, ReportColumn, ReportFilter, TaskRow, WeeklyReport};
use crate::weeks::local_day;
use carelog_atoms::catalog::{find_client, TASK_CATALOG};
use carelog_atoms::shifts::Shift;
use chrono::FixedOffset;

/// Shifts matching the filter, oldest first
pub fn filter_shifts(shifts: &[Shift], filter: &ReportFilter, offset: FixedOffset) -> Vec<Shift> {
    let mut matching: Vec<Shift> = shifts
        .iter()
        .filter(|s| {
            filter
                .client_id
                .as_deref()
                .map_or(true, |id| s.client.id == id)
        })
        .filter(|s| {
            filter
                .caregiver_name
                .as_deref()
                .map_or(true, |name| s.caregiver_name.as_deref() == Some(name))
        })
        .filter(|s| filter.week.contains(s.start_time, offset))
        .cloned()
        .collect();

    matching.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    matching
}

/// "Weekly Shift Report[ for {client}][ by {caregiver}]"
pub fn report_title(filter: &ReportFilter) -> String {
    let mut title = "Weekly Shift Report".to_string();
    if let Some(client) = filter.client_id.as_deref().and_then(find_client) {
        title.push_str(&format!(" for {}", client.name));
    }
    if let Some(caregiver) = &filter.caregiver_name {
        title.push_str(&format!(" by {}", caregiver));
    }
    title
}

/// Task-by-shift matrix. Columns are keyed by shift, so two visits on the
/// same day each get their own column.
pub fn build_report(shifts: &[Shift], filter: &ReportFilter, offset: FixedOffset) -> WeeklyReport {
    let shifts = filter_shifts(shifts, filter, offset);

    let columns: Vec<ReportColumn> = shifts
        .iter()
        .map(|s| {
            let local = s.start_time.with_timezone(&offset);
            ReportColumn {
                shift_id: s.id.clone(),
                date: local_day(s.start_time, offset),
                day_label: local.format("%a, %d").to_string(),
                start_label: local.format("%-I:%M %p").to_string(),
                client_name: s.client.name.clone(),
                caregiver_name: s.caregiver_name.clone(),
            }
        })
        .collect();

    let rows = TASK_CATALOG
        .iter()
        .map(|(task_id, label)| TaskRow {
            task_id: *task_id,
            label: label.to_string(),
            completed: shifts.iter().map(|s| s.is_task_completed(*task_id)).collect(),
        })
        .collect();

    let notes = shifts
        .iter()
        .filter(|s| !s.notes.trim().is_empty())
        .map(|s| NoteBlock {
            shift_id: s.id.clone(),
            heading: s
                .start_time
                .with_timezone(&offset)
                .format("%A, %B %-d, %Y")
                .to_string(),
            notes: s.notes.clone(),
        })
        .collect();

    WeeklyReport {
        title: report_title(filter),
        week: filter.week.clone(),
        shifts,
        columns,
        rows,
        notes,
    }
}
