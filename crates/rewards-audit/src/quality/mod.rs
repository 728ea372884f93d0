//! Data quality analysis module.
//!
//! This module runs the audit battery over receipts, users and brands:
//! null values, future and out-of-order dates, orphaned receipts, negative
//! amounts, duplicate ids, the receipt status breakdown and zero-spend
//! receipts.

mod analyzer;

pub use analyzer::{DataQualityAnalyzer, analyze};
