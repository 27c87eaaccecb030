use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_LOG_FILE: &str = "agent-debug.logs.jsonl";

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup("AGENT_DEBUG_OBSERVABILITY_ENABLED")
        .map(|value| parse_bool_env(&value).unwrap_or(true))
        .unwrap_or(true)
}

fn resolve_env_filter() -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var("AGENT_DEBUG_LOG_LEVEL")
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Splits a configured log path into the directory and file name handed to
/// the appender.
fn log_file_target(path_raw: &str) -> (std::path::PathBuf, String) {
    let path = std::path::PathBuf::from(path_raw);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (dir, file_name)
}

/// Initialize tracing once per process.
///
/// Environment variables:
/// - `AGENT_DEBUG_OBSERVABILITY_ENABLED`: optional enable/disable flag (default enabled).
/// - `AGENT_DEBUG_LOG_LEVEL`: optional level/filter override (`info`, `debug`, etc.).
/// - `AGENT_DEBUG_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file.
///   If unset, logs go to stderr in a compact console format, leaving stdout to
///   decoded output.
/// - `RUST_LOG`: optional filter override, used when no level is set above.
pub fn init_observability() {
    INIT.get_or_init(|| {
        if !observability_enabled(|key| std::env::var(key).ok()) {
            return;
        }

        let env_filter = resolve_env_filter();
        if let Ok(path_raw) = std::env::var("AGENT_DEBUG_JSON_LOG_PATH") {
            let (dir, file_name) = log_file_target(&path_raw);
            let _ = std::fs::create_dir_all(&dir);
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_flags_accept_common_spellings() {
        assert_eq!(parse_bool_env(" On "), Some(true));
        assert_eq!(parse_bool_env("disabled"), Some(false));
        assert_eq!(parse_bool_env("maybe"), None);
    }

    #[test]
    fn observability_defaults_to_enabled() {
        assert!(observability_enabled(|_| None));
        assert!(observability_enabled(|_| Some("garbage".into())));
        assert!(!observability_enabled(|_| Some("0".into())));
    }

    #[test]
    fn log_path_without_directory_lands_in_cwd() {
        let (dir, file) = log_file_target("trace.jsonl");
        assert_eq!(dir, std::path::PathBuf::from("."));
        assert_eq!(file, "trace.jsonl");

        let (dir, file) = log_file_target("logs/run/trace.jsonl");
        assert_eq!(dir, std::path::PathBuf::from("logs/run"));
        assert_eq!(file, "trace.jsonl");
    }

    #[test]
    fn init_is_idempotent() {
        init_observability();
        init_observability();
    }
}
