//! Report rendering module.
//!
//! [`AuditReport`] bundles the findings with a summary of each source, and
//! renders them either as text lines for the terminal or as a JSON document.
//!
//! # Example
//!
//! ```rust,ignore
//! use rewards_audit::{AuditConfig, AuditReport, load_sources};
//!
//! let sources = load_sources(&AuditConfig::default());
//! let report = AuditReport::build(&sources, chrono::Local::now().naive_local());
//!
//! print!("{}", report.render_text());
//! println!("{}", report.to_json()?);
//! ```

mod report;

pub use report::{AuditReport, SourceError, SourceSummary};
