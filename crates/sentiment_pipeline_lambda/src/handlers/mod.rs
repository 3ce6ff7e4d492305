//! Stage handlers.
//!
//! All four stages share one execution shape: probe the object store for
//! the completion marker, short-circuit on a hit, otherwise ensure the
//! local input, compute, and publish. The first fatal error terminates the
//! invocation; there is no retry and no rollback of published artifacts.

pub mod evaluate;
pub mod extract;
pub mod retrieve;
pub mod train;

/// Structured JSON event line on stderr.
pub fn log_stage_info(component: &str, event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        serde_json::json!({
            "component": component,
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

pub fn log_stage_warn(component: &str, event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        serde_json::json!({
            "component": component,
            "level": "warn",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

pub fn log_stage_error(component: &str, event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        serde_json::json!({
            "component": component,
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
