//! Loader for the analytics snapshot consumed by the dashboard.
//!
//! The snapshot is a JSON file produced by the import pipeline; it is the
//! authoritative source for the dashboard's read model. Field names and
//! nesting are load-bearing, so a mismatch surfaces as a parse error and
//! lands in the dashboard's failure state instead of a panic.

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::FreightSummary;

pub async fn load_summary(path: &Path) -> Result<FreightSummary> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading summary file {}", path.display()))?;

    let summary: FreightSummary = serde_json::from_str(&content)
        .with_context(|| format!("parsing summary file {}", path.display()))?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "timestamp": "2025-05-30T18:42:00Z",
        "total_records": 1284,
        "metrics": {
            "total_value": 1857340.55,
            "total_weight": 482310.0,
            "total_volume": 9120.0,
            "avg_value": 1446.53,
            "avg_weight": 375.63,
            "avg_volume": 7.1
        },
        "date_range": {"start": "2024-11-01", "end": "2025-05-30", "days": 210},
        "top_clients": [
            {"name": "Distribuidora Ipiranga", "order_count": 112, "total_value": 204310.0, "avg_value": 1824.2}
        ],
        "top_routes": [
            {"route": "Ribeirão Preto → São Paulo", "frequency": 84, "total_value": 131200.0, "avg_value": 1561.9}
        ],
        "payment_methods": [
            {"method": "Boleto", "count": 804, "percentage": 62.6}
        ]
    }"#;

    fn write_fixture(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("freight_summary.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_a_well_formed_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, FIXTURE);

        let summary = load_summary(&path).await.unwrap();
        assert_eq!(summary.total_records, 1284);
        assert_eq!(summary.top_clients[0].name, "Distribuidora Ipiranga");
        assert_eq!(summary.payment_methods[0].percentage, 62.6);
    }

    #[tokio::test]
    async fn missing_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere.json");

        let err = load_summary(&path).await.unwrap_err();
        assert!(err.to_string().contains("nowhere.json"));
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, r#"{"total_records": "many"}"#);

        let err = load_summary(&path).await.unwrap_err();
        assert!(err.to_string().contains("parsing summary file"));
    }
}
