pub mod human;

use serde_json::{Value, json};

/// Standard JSON envelope written to stdout on success.
pub fn success(command: &str, data: Value) -> Value {
    json!({
        "status": "ok",
        "command": command,
        "data": data,
        "error": null
    })
}

/// Envelope written to stderr when a command fails. `code` is the stable
/// error kind, see [`crate::Error::code`].
pub fn error(command: &str, code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "command": command,
        "data": null,
        "error": {
            "code": code,
            "message": message
        }
    })
}
