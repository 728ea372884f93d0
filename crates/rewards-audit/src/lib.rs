//! Data Quality Audit Library
//!
//! Audits receipt, user and brand exports (newline-delimited JSON) for
//! data-quality defects.
//!
//! # Overview
//!
//! The audit runs two passes over the three collections:
//!
//! - **Date Normalization**: Extended JSON `{"$date": ...}` wrappers and date
//!   strings become timezone-naive instants; anything unreadable becomes null
//! - **Quality Checks**: null values, future dates, scan/finish ordering,
//!   receipts without a matching user, negative amounts, duplicate ids, the
//!   receipt status breakdown, and receipts with items but zero spend
//!
//! Checks never fail. A field a check needs but the collection lacks simply
//! produces no finding, and so does an empty collection.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rewards_audit::{AuditConfig, AuditReport, load_sources};
//!
//! let config = AuditConfig::builder().data_dir("exports").build()?;
//! let sources = load_sources(&config);
//!
//! let report = AuditReport::build(&sources, chrono::Local::now().naive_local());
//! for line in report.lines() {
//!     println!("- {}", line);
//! }
//! ```
//!
//! Collections can also be assembled in code and passed straight to
//! [`analyze`]:
//!
//! ```rust,ignore
//! use rewards_audit::{Collection, FieldValue, Record, analyze};
//!
//! let receipts = Collection::from_records(
//!     "receipts",
//!     vec![Record::new().with("userId", FieldValue::Text("u3".into()))],
//! );
//! let lines = analyze(&receipts, &users, &brands, now);
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{AuditConfig, AuditConfigBuilder, ConfigValidationError};
pub use error::{AuditError, Result as AuditResult, ResultExt};
pub use loader::{LoadedSource, Sources, load_collection, load_or_empty, load_sources};
pub use normalize::{DATE_FIELDS, normalize_dates, normalize_value, parse_date};
pub use quality::{DataQualityAnalyzer, analyze};
pub use reporting::{AuditReport, SourceError, SourceSummary};
pub use types::{Collection, FieldValue, Finding, FindingKind, Record};
