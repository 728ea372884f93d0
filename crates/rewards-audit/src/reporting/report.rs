use crate::error::{AuditError, Result};
use crate::loader::{LoadedSource, Sources};
use crate::quality::DataQualityAnalyzer;
use crate::types::Finding;
use crate::utils::format_instant;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Heading printed above the finding lines.
pub const RESULTS_HEADING: &str = "Data Quality Analysis Results:";

/// Why a source could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    /// Stable code, see [`AuditError::error_code`]
    pub code: String,
    pub message: String,
}

impl From<&AuditError> for SourceError {
    fn from(error: &AuditError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// What was read from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Collection name (receipts, users, brands)
    pub name: String,
    /// File the source was read from
    pub path: String,
    /// Number of records loaded
    pub records: usize,
    /// Number of distinct fields seen
    pub fields: usize,
    /// Whether the source loaded; an unloaded source contributes no records
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SourceError>,
}

impl From<&LoadedSource> for SourceSummary {
    fn from(source: &LoadedSource) -> Self {
        Self {
            name: source.collection.name().to_string(),
            path: source.path.display().to_string(),
            records: source.collection.len(),
            fields: source.collection.columns().len(),
            loaded: source.is_loaded(),
            error: source.error.as_ref().map(SourceError::from),
        }
    }
}

/// Findings of one audit run plus the context they were produced in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Wall-clock time the report was generated (RFC 3339)
    pub generated_at: String,
    /// Instant future dates were compared against
    pub evaluated_at: String,
    pub sources: Vec<SourceSummary>,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// Run the audit over loaded sources.
    pub fn build(sources: &Sources, now: NaiveDateTime) -> Self {
        info!("Analyzing data quality...");
        let findings = DataQualityAnalyzer::identify_issues(
            &sources.receipts.collection,
            &sources.users.collection,
            &sources.brands.collection,
            now,
        );
        info!("Analysis complete: {} findings", findings.len());

        Self {
            generated_at: Local::now().to_rfc3339(),
            evaluated_at: format_instant(&now),
            sources: sources.iter().map(SourceSummary::from).collect(),
            findings,
        }
    }

    /// All finding lines in order, details indented below their finding.
    pub fn lines(&self) -> Vec<String> {
        self.findings.iter().flat_map(Finding::lines).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Render the heading and one `- ` prefixed line per finding line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(RESULTS_HEADING);
        out.push('\n');
        if self.is_clean() {
            out.push_str("No data quality issues detected\n");
        }
        for line in self.lines() {
            out.push_str("- ");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
