use crate::matrix::build_report;
use crate::pdf::{render_report_pdf, report_file_name};
use crate::types::{ReportFilter, ReportQuery, ReportSettings};
use crate::weeks::{local_day, past_weeks, week_containing};
use carelog_atoms::respond::{error_response, json_response};
use carelog_atoms::shifts::{delete_all_shifts, list_shifts, DeleteAllResponse, ShiftStore};
use chrono::{DateTime, NaiveDate, Utc};
use lambda_http::{http::StatusCode, Body, Error, Response};

/// "all", blank and missing all mean no filter
fn selection(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(|v| v.to_string())
}

/// Turn query parameters into a filter; the week defaults to the current one
pub fn parse_filter(
    query: &ReportQuery,
    settings: &ReportSettings,
    now: DateTime<Utc>,
) -> Result<ReportFilter, String> {
    let day = match selection(query.week.as_deref()) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| format!("Invalid week '{}', expected YYYY-MM-DD", raw))?,
        None => local_day(now, settings.offset),
    };

    Ok(ReportFilter {
        client_id: selection(query.client_id.as_deref()),
        caregiver_name: selection(query.caregiver.as_deref()),
        week: week_containing(day),
    })
}

/// GET /reports/weeks
pub async fn list_weeks(settings: &ReportSettings, now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    let weeks = past_weeks(local_day(now, settings.offset), settings.weeks);
    json_response(StatusCode::OK, &weeks)
}

/// GET /reports/weekly
pub async fn weekly_report(
    store: &dyn ShiftStore,
    settings: &ReportSettings,
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let filter = match parse_filter(query, settings, now) {
        Ok(f) => f,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let shifts = list_shifts(store).await;
    let report = build_report(&shifts, &filter, settings.offset);
    json_response(StatusCode::OK, &report)
}

/// GET /reports/weekly/pdf - 204 when the selection has no shifts
pub async fn export_pdf(
    store: &dyn ShiftStore,
    settings: &ReportSettings,
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let filter = match parse_filter(query, settings, now) {
        Ok(f) => f,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let shifts = list_shifts(store).await;
    let report = build_report(&shifts, &filter, settings.offset);

    match render_report_pdf(&report) {
        Ok(Some(bytes)) => {
            let file_name = report_file_name(local_day(now, settings.offset));
            tracing::info!(shifts = report.shifts.len(), %file_name, "report exported");
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/pdf")
                .header(
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", file_name),
                )
                .body(Body::Binary(bytes))
                .map_err(Box::new)?)
        }
        Ok(None) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("Failed to render report: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not export report.")
        }
    }
}

/// DELETE /shifts - wipe every record; the client re-fetches afterwards
pub async fn clear_all_data(store: &dyn ShiftStore) -> Result<Response<Body>, Error> {
    match delete_all_shifts(store).await {
        Ok(deleted) => json_response(StatusCode::OK, &DeleteAllResponse { deleted }),
        Err(e) => {
            tracing::error!("Failed to clear shift data: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear shift data.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_atoms::catalog::{catalog_tasks, find_client};
    use carelog_atoms::shifts::{MemoryShiftStore, Shift};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 4, 15, 0, 0).unwrap()
    }

    fn store() -> MemoryShiftStore {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        MemoryShiftStore::with_shifts(vec![Shift {
            id: "s1".to_string(),
            client: find_client("3").unwrap(),
            caregiver_name: Some("Ada Byron".to_string()),
            start_time: start,
            end_time: start + chrono::Duration::hours(3),
            completed_tasks: Vec::new(),
            incomplete_tasks: catalog_tasks(),
            notes: "Read the paper together".to_string(),
        }])
    }

    fn body_json(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    #[test]
    fn all_means_no_filter() {
        let query = ReportQuery {
            client_id: Some("all".to_string()),
            caregiver: Some(" ".to_string()),
            week: Some("2024-01-10".to_string()),
        };
        let filter = parse_filter(&query, &ReportSettings::default(), now()).unwrap();
        assert_eq!(filter.client_id, None);
        assert_eq!(filter.caregiver_name, None);
        assert_eq!(filter.week.start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[tokio::test]
    async fn weekly_report_defaults_to_current_week() {
        let resp = weekly_report(&store(), &ReportSettings::default(), &ReportQuery::default(), now())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let report = body_json(&resp);
        assert_eq!(report["week"]["label"], "Jan 1 - Jan 7, 2024");
        assert_eq!(report["columns"][0]["dayLabel"], "Tue, 02");
        assert_eq!(report["notes"][0]["notes"], "Read the paper together");
    }

    #[tokio::test]
    async fn malformed_week_is_rejected() {
        let query = ReportQuery {
            week: Some("last tuesday".to_string()),
            ..ReportQuery::default()
        };
        let resp = weekly_report(&store(), &ReportSettings::default(), &query, now())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&resp)["error"], "Invalid week 'last tuesday', expected YYYY-MM-DD");
    }

    #[tokio::test]
    async fn pdf_export_is_a_download_or_no_content() {
        let settings = ReportSettings::default();
        let resp = export_pdf(&store(), &settings, &ReportQuery::default(), now()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["Content-Disposition"],
            "attachment; filename=\"Shift-Report-2024-01-04.pdf\""
        );

        let other_client = ReportQuery {
            client_id: Some("1".to_string()),
            ..ReportQuery::default()
        };
        let resp = export_pdf(&store(), &settings, &other_client, now()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn clearing_reports_count_and_leaves_nothing() {
        let store = store();
        let resp = clear_all_data(&store).await.unwrap();
        assert_eq!(body_json(&resp)["deleted"], 1);
        assert!(list_shifts(&store).await.is_empty());
    }

    #[tokio::test]
    async fn week_list_honours_settings() {
        let settings = ReportSettings {
            weeks: 3,
            ..ReportSettings::default()
        };
        let resp = list_weeks(&settings, now()).await.unwrap();
        let weeks = body_json(&resp);
        assert_eq!(weeks.as_array().unwrap().len(), 3);
        assert_eq!(weeks[2]["start"], "2023-12-18");
    }
}
