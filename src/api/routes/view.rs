//! View and export handlers over records a client already holds.

use super::{ExportRequest, ViewRequest, ViewResponse};
use crate::api::AppState;
use crate::export::{ExportFile, export_as_csv, export_as_document};
use crate::types::PackageRecord;
use crate::view::{run_query, summarize};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /view - Filter, sort and page a set of records
#[utoipa::path(
    post,
    path = "/view",
    tag = "view",
    request_body = ViewRequest,
    responses(
        (status = 200, description = "Requested page of the filtered view", body = ViewResponse)
    )
)]
pub async fn view_packages(Json(request): Json<ViewRequest>) -> impl IntoResponse {
    let query = match request.quick_filter {
        Some(filter) => request.query.with_quick_filter(filter),
        None => request.query,
    };

    let page = run_query(&request.packages, &query).map(PackageRecord::clone);
    let summary = summarize(&request.packages);

    Json(ViewResponse {
        items: page.items,
        page: page.page,
        total_pages: page.total_pages,
        total_count: page.total_count,
        summary,
    })
}

/// POST /export/csv - Download the CSV report
#[utoipa::path(
    post,
    path = "/export/csv",
    tag = "export",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "CSV report attachment", body = String, content_type = "text/csv")
    )
)]
pub async fn export_csv(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Response {
    attachment(export_as_csv(&request.packages, &state.config.export))
}

/// POST /export/document - Download the formatted report
#[utoipa::path(
    post,
    path = "/export/document",
    tag = "export",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Markdown report attachment", body = String, content_type = "text/markdown")
    )
)]
pub async fn export_document(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Response {
    attachment(export_as_document(&request.packages, &state.config.export))
}

fn attachment(file: ExportFile) -> Response {
    tracing::debug!(file = %file.file_name, bytes = file.bytes.len(), "serving report");
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}
