use chrono::Utc;
use chrono_tz::Asia::Taipei;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";
const LOG_FILE_PREFIX: &str = "stock-revenue-lab.log";

/// 日志时间使用台北时区
struct TaipeiTime;

impl FormatTime for TaipeiTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Utc::now().with_timezone(&Taipei);
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// 文件日志设置；`None` 表示只输出到控制台
#[derive(Debug, PartialEq)]
struct FileSink {
    dir: String,
}

impl FileSink {
    fn from_values(log_to_file: Option<&str>, log_dir: Option<&str>) -> Option<Self> {
        let enabled = matches!(log_to_file.map(str::trim), Some("true") | Some("1"));
        enabled.then(|| FileSink {
            dir: log_dir
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("./logs")
                .to_string(),
        })
    }

    fn from_env() -> Option<Self> {
        let flag = std::env::var("LOG_TO_FILE").ok();
        let dir = std::env::var("LOG_DIR").ok();
        Self::from_values(flag.as_deref(), dir.as_deref())
    }
}

pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_timer(TaipeiTime)
        .with_target(true)
        .with_line_number(true);

    // 未启用时为 None
    let file_layer = FileSink::from_env().map(|sink| {
        let appender = RollingFileAppender::new(Rotation::DAILY, &sink.dir, LOG_FILE_PREFIX);
        fmt::layer()
            .with_timer(TaipeiTime)
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_only_when_enabled() {
        assert_eq!(FileSink::from_values(None, Some("/var/log")), None);
        assert_eq!(FileSink::from_values(Some("false"), None), None);
        assert_eq!(
            FileSink::from_values(Some("1"), None),
            Some(FileSink { dir: "./logs".to_string() })
        );
        assert_eq!(
            FileSink::from_values(Some("true"), Some("/var/log/lab")),
            Some(FileSink { dir: "/var/log/lab".to_string() })
        );
    }
}
