use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Extension, Router};
use sea_orm::DatabaseConnection;
use tracing::info;

pub mod handler;
pub mod wrapper;

pub fn router(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/api/health", get(handler::health))
        .route("/api/migrations", get(handler::list_migrations))
        .layer(Extension(Arc::new(db)))
}

/// 迁移成功后才调用，绑定监听地址并一直运行
pub async fn serve(bind: SocketAddr, db: DatabaseConnection) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("绑定监听地址 {} 失败", bind))?;
    info!("开始监听 http://{}", bind);
    axum::serve(listener, router(db)).await.context("HTTP 服务异常退出")
}
