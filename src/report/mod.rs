//! Reporting utilities: terminal text and JSON output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::error::{AppError, EXIT_CONFIG};

/// Pretty-printed JSON for `--json` output.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to serialize JSON output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MagnitudeRange;

    #[test]
    fn json_output_has_fields() {
        let json = to_json(&MagnitudeRange::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["min"], 0.0);
        assert_eq!(value["max"], 30.0);
    }
}
