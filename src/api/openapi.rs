//! OpenAPI documentation for the pkgcheck REST API

use utoipa::OpenApi;

/// OpenAPI documentation for the pkgcheck REST API
///
/// Served at `/openapi.json`, and through Swagger UI at `/swagger-ui` when
/// enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pkgcheck REST API",
        version = "0.1.0",
        description = "Checks package lists against the community directory, the release list and the architecture compatibility service",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Checks
        crate::api::routes::check_packages,
        crate::api::routes::cancel_check,
        crate::api::routes::parse_manifest,

        // Views and exports
        crate::api::routes::view_packages,
        crate::api::routes::export_csv,
        crate::api::routes::export_document,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::BatchId,
        crate::types::ArchitectureStatus,
        crate::types::Platforms,
        crate::types::SupportFlags,
        crate::types::RepositoryStats,
        crate::types::PackageRecord,
        crate::types::CheckReport,
        crate::normalize::ManifestPackages,
        crate::version::UpgradeAdvice,
        crate::links::ActivityLinks,
        crate::view::MembershipView,
        crate::view::SortKey,
        crate::view::SortOrder,
        crate::view::QuickFilter,
        crate::view::ViewQuery,
        crate::view::Summary,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::api::routes::CheckRequest,
        crate::api::routes::CheckResponse,
        crate::api::routes::CancelRequest,
        crate::api::routes::ViewRequest,
        crate::api::routes::ViewResponse,
        crate::api::routes::ExportRequest,
    )),
    tags(
        (name = "check", description = "Batch checks and manifest parsing"),
        (name = "view", description = "Filtered, sorted and paged views"),
        (name = "export", description = "CSV and document reports"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
