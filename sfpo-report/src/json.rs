//! JSON Output

use serde::{Deserialize, Serialize};

use crate::report::Report;

/// Schema information embedded at the top of JSON exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchema {
    /// Schema identifier.
    pub schema: String,
    /// Schema version.
    pub version: String,
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportMeta;

    #[test]
    fn test_json_round_trip() {
        let report = Report::new(ReportMeta::new(42));
        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"schema_version\": 1"));

        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.meta.seed, 42);
        assert!(parsed.specimens.is_empty());
    }
}
