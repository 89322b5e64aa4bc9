use std::sync::Arc;

use axum::extract::{Extension, Json};
use school_facilities_entity::migration_record;
use school_facilities_migration::TrackingStore;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::api::wrapper::{ApiError, ApiResponse};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct MigrationsResponse {
    total: usize,
    migrations: Vec<migration_record::Model>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// 已记录的迁移步骤，自行判断幂等的步骤不会出现在这里
pub async fn list_migrations(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<ApiResponse<MigrationsResponse>, ApiError> {
    let migrations = TrackingStore::new(db.as_ref()).records().await?;
    Ok(ApiResponse::ok(MigrationsResponse {
        total: migrations.len(),
        migrations,
    }))
}
