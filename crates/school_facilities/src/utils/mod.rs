use std::fmt::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

// 控制台输出层：时间、带颜色的级别、消息，以及 step 等结构化字段
struct ConsoleLayer;

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let Some(message) = visitor.message else {
            return;
        };

        let timestamp = Local::now().format("%b %d %H:%M:%S");
        let (color_code, level_str) = match *event.metadata().level() {
            tracing::Level::ERROR => ("\x1b[31m", "ERROR"),
            tracing::Level::WARN => ("\x1b[33m", " WARN"),
            tracing::Level::INFO => ("\x1b[32m", " INFO"),
            tracing::Level::DEBUG => ("\x1b[36m", "DEBUG"),
            tracing::Level::TRACE => ("\x1b[35m", "TRACE"),
        };

        println!(
            "\x1b[2m{}\x1b[0m {}{:>5}\x1b[0m {}{}",
            timestamp, color_code, level_str, message, visitor.fields
        );
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    /// 除 message 外的字段，格式为 ` key=value`
    fields: String,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            let _ = write!(self.fields, " \x1b[2m{}\x1b[0m={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            let _ = write!(self.fields, " \x1b[2m{}\x1b[0m={:?}", field.name(), value);
        }
    }
}

pub fn init_logger(log_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(build_console_filter(log_level)))
        .try_init()
        .context("初始化日志失败")
}

/// 降低 sqlx 慢查询、sea-orm 语句日志等噪音
fn build_console_filter(base_level: &str) -> EnvFilter {
    EnvFilter::builder().parse_lossy(format!(
        "{},\
            sqlx::query=error,\
            sqlx=error,\
            sea_orm::database=error,\
            sea_orm_migration=warn,\
            hyper=warn,\
            h2=warn",
        base_level
    ))
}
