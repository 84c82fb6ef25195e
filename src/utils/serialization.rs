// src/utils/serialization.rs
//! JSON helpers for CLI input and output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializes a value to indented JSON, as printed by the CLI.
pub fn serialize_pretty<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from a JSON string.
///
/// # Note
/// The lifetime lets the result borrow from the input string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Reads and deserializes a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    deserialize(&raw).map_err(|e| anyhow::anyhow!("invalid JSON in {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{IssuerCredRevRecord, RevocationState};

    #[test]
    fn test_records_file() {
        let path =
            std::env::temp_dir().join(format!("registry-records-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"rev_reg_id": "r1", "cred_rev_id": 7, "cred_ex_id": null, "state": "revoked"}]"#,
        )
        .unwrap();

        let records: Vec<IssuerCredRevRecord> = read_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, RevocationState::Revoked);
        assert!(serialize_pretty(&records[0]).unwrap().contains("\"cred_rev_id\": 7"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err =
            read_json_file::<Vec<IssuerCredRevRecord>>("/nonexistent/records.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/records.json"));
    }
}
