use crate::error::Result;
use crate::normalize::{DATE_FIELDS, normalize_dates};
use crate::types::{Collection, FieldValue, Finding, FindingKind};
use crate::utils::{coerce_numeric, format_instant, join_samples};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Receipt date fields checked against the evaluation instant.
const FUTURE_DATE_FIELDS: [&str; 5] = [
    "createDate",
    "dateScanned",
    "finishedDate",
    "pointsAwardedDate",
    "purchaseDate",
];

/// Receipt numeric fields and the label used when reporting them.
const NUMERIC_FIELDS: [(&str, &str); 3] = [
    ("pointsEarned", "points"),
    ("purchasedItemCount", "items"),
    ("totalSpent", "amount spent"),
];

const ID_FIELD: &str = "_id";
const USER_ID_FIELD: &str = "userId";
const STATUS_FIELD: &str = "rewardsReceiptStatus";

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Run every check over the three collections.
    ///
    /// Receipts and users are date-normalized first; the inputs are not
    /// modified. `now` is the instant future dates are compared against.
    /// Findings come back in check order.
    pub fn identify_issues(
        receipts: &Collection,
        users: &Collection,
        brands: &Collection,
        now: NaiveDateTime,
    ) -> Vec<Finding> {
        let receipts = normalize_dates(receipts, &DATE_FIELDS);
        let users = normalize_dates(users, &DATE_FIELDS);

        let mut issues = Vec::new();

        for collection in [&receipts, &users, brands] {
            issues.extend(Self::analyze_null_values(collection));
        }

        issues.extend(Self::analyze_future_dates(&receipts, now));
        issues.extend(Self::analyze_date_sequence(&receipts));
        issues.extend(Self::analyze_orphaned_receipts(&receipts, &users));
        issues.extend(Self::analyze_negative_values(&receipts));

        for collection in [&receipts, &users, brands] {
            issues.extend(Self::analyze_duplicates(collection));
        }

        issues.extend(Self::analyze_status_distribution(&receipts));
        issues.extend(Self::analyze_zero_spend(&receipts));

        debug!("Data quality analysis produced {} findings", issues.len());
        issues
    }

    fn analyze_null_values(collection: &Collection) -> Option<Finding> {
        let null_fields: Vec<(&str, usize)> = collection
            .columns()
            .iter()
            .map(|field| {
                let count = collection
                    .column_values(field)
                    .filter(|v| v.is_null())
                    .count();
                (field.as_str(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        if null_fields.is_empty() {
            return None;
        }

        let finding = null_fields.into_iter().fold(
            Finding::new(
                FindingKind::NullValues,
                format!("Found null values in {} dataset:", collection.name()),
            ),
            |finding, (field, count)| finding.with_detail(format!("- {}: {} null values", field, count)),
        );
        Some(finding)
    }

    fn analyze_future_dates(receipts: &Collection, now: NaiveDateTime) -> Vec<Finding> {
        let mut issues = Vec::new();

        for field in FUTURE_DATE_FIELDS {
            if !receipts.has_column(field) {
                continue;
            }

            let future: Vec<NaiveDateTime> = receipts
                .column_values(field)
                .filter_map(FieldValue::as_instant)
                .filter(|dt| *dt > now)
                .collect();

            if !future.is_empty() {
                issues.push(
                    Finding::new(
                        FindingKind::FutureDates,
                        format!("Found {} future dates in {}", future.len(), field),
                    )
                    .with_detail(format!(
                        "Sample dates: {}",
                        join_samples(future.iter().map(format_instant))
                    )),
                );
            }
        }

        issues
    }

    fn analyze_date_sequence(receipts: &Collection) -> Option<Finding> {
        if !(receipts.has_column("dateScanned") && receipts.has_column("finishedDate")) {
            return None;
        }

        let invalid = receipts
            .records()
            .iter()
            .filter(|r| {
                match (
                    r.get("dateScanned").as_instant(),
                    r.get("finishedDate").as_instant(),
                ) {
                    (Some(scanned), Some(finished)) => scanned > finished,
                    _ => false,
                }
            })
            .count();

        (invalid > 0).then(|| {
            Finding::new(
                FindingKind::DateSequence,
                format!(
                    "Found {} receipts where scan date is after finish date",
                    invalid
                ),
            )
        })
    }

    fn analyze_orphaned_receipts(receipts: &Collection, users: &Collection) -> Option<Finding> {
        if !(receipts.has_column(USER_ID_FIELD) && users.has_column(ID_FIELD)) {
            return None;
        }

        let user_ids: HashSet<String> = users
            .column_values(ID_FIELD)
            .filter_map(FieldValue::key)
            .collect();

        let orphaned = receipts
            .column_values(USER_ID_FIELD)
            .filter_map(FieldValue::key)
            .filter(|id| !user_ids.contains(id))
            .count();

        (orphaned > 0).then(|| {
            Finding::new(
                FindingKind::OrphanedReceipts,
                format!("Found {} receipts with no matching user", orphaned),
            )
        })
    }

    fn analyze_negative_values(receipts: &Collection) -> Vec<Finding> {
        let mut issues = Vec::new();

        for (field, label) in NUMERIC_FIELDS {
            if !receipts.has_column(field) {
                continue;
            }

            match Self::negative_values(receipts, field) {
                Ok(negatives) if !negatives.is_empty() => {
                    issues.push(
                        Finding::new(
                            FindingKind::NegativeValues,
                            format!("Found {} negative values for {}", negatives.len(), label),
                        )
                        .with_detail(format!("Sample values: {}", join_samples(&negatives))),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Numeric check on '{}' failed: {}", field, e);
                    issues.push(Finding::new(
                        FindingKind::ConversionError,
                        format!("Error processing {}: {}", field, e),
                    ));
                }
            }
        }

        issues
    }

    /// Raw literals of the negative values in `field`, in record order.
    fn negative_values<'a>(receipts: &'a Collection, field: &str) -> Result<Vec<&'a FieldValue>> {
        let mut negatives = Vec::new();
        for (position, value) in receipts.column_values(field).enumerate() {
            if coerce_numeric(field, position, value)?.is_some_and(|n| n < 0.0) {
                negatives.push(value);
            }
        }
        Ok(negatives)
    }

    /// Counts every occurrence of a key after its first, so three records
    /// sharing one id count as two duplicates.
    fn analyze_duplicates(collection: &Collection) -> Option<Finding> {
        if !collection.has_column(ID_FIELD) {
            return None;
        }

        let mut seen: HashSet<Option<String>> = HashSet::new();
        let duplicates = collection
            .column_values(ID_FIELD)
            .filter(|v| !seen.insert(v.key()))
            .count();

        (duplicates > 0).then(|| {
            Finding::new(
                FindingKind::DuplicateRecords,
                format!(
                    "Found {} duplicate {} records",
                    duplicates,
                    collection.name()
                ),
            )
        })
    }

    fn analyze_status_distribution(receipts: &Collection) -> Option<Finding> {
        if !receipts.has_column(STATUS_FIELD) {
            return None;
        }

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in receipts.column_values(STATUS_FIELD) {
            if !value.is_null() {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }

        // Stable sort keeps first-appearance order among equal counts.
        let mut ordered: Vec<(String, usize)> = counts.into_iter().collect();
        ordered.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

        let finding = ordered.into_iter().fold(
            Finding::new(
                FindingKind::StatusDistribution,
                "Receipt status distribution:",
            ),
            |finding, (status, count)| {
                finding.with_detail(format!("- {}: {} receipts", status, count))
            },
        );
        Some(finding)
    }

    /// Only JSON numbers take part: a text `"0.00"` is not a zero amount.
    fn analyze_zero_spend(receipts: &Collection) -> Option<Finding> {
        if !(receipts.has_column("totalSpent") && receipts.has_column("purchasedItemCount")) {
            return None;
        }

        let zero_spent = receipts
            .records()
            .iter()
            .filter(|r| {
                json_number(r.get("totalSpent")) == Some(0.0)
                    && json_number(r.get("purchasedItemCount")).is_some_and(|n| n > 0.0)
            })
            .count();

        (zero_spent > 0).then(|| {
            Finding::new(
                FindingKind::ZeroSpend,
                format!(
                    "Found {} receipts with items but zero total spent",
                    zero_spent
                ),
            )
        })
    }
}

fn json_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Run the audit and render the findings as text lines.
pub fn analyze(
    receipts: &Collection,
    users: &Collection,
    brands: &Collection,
    now: NaiveDateTime,
) -> Vec<String> {
    DataQualityAnalyzer::identify_issues(receipts, users, brands, now)
        .iter()
        .flat_map(Finding::lines)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn num(n: serde_json::Value) -> FieldValue {
        FieldValue::from(n)
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn empty(name: &str) -> Collection {
        Collection::new(name)
    }

    fn receipts(records: Vec<Record>) -> Collection {
        Collection::from_records("receipts", records)
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn test_empty_collections_produce_nothing() {
        let findings = DataQualityAnalyzer::identify_issues(
            &empty("receipts"),
            &empty("users"),
            &empty("brands"),
            fixed_now(),
        );
        assert!(findings.is_empty());
        assert!(analyze(&empty("receipts"), &empty("users"), &empty("brands"), fixed_now()).is_empty());
    }

    #[test]
    fn test_null_values_counted_per_field() {
        let records = (0..5)
            .map(|i| {
                let bar = if i < 2 { FieldValue::Null } else { text("ok") };
                Record::new().with("bar", bar).with("code", text("c"))
            })
            .collect();
        let brands = Collection::from_records("brands", records);

        let finding = DataQualityAnalyzer::analyze_null_values(&brands).unwrap();
        assert_eq!(finding.message, "Found null values in brands dataset:");
        assert_eq!(finding.details, vec!["- bar: 2 null values".to_string()]);
    }

    #[test]
    fn test_null_values_include_absent_keys() {
        let users = Collection::from_records(
            "users",
            vec![
                Record::new().with("_id", text("u1")).with("state", text("WI")),
                Record::new().with("_id", text("u2")),
            ],
        );
        let finding = DataQualityAnalyzer::analyze_null_values(&users).unwrap();
        assert_eq!(finding.details, vec!["- state: 1 null values".to_string()]);
    }

    #[test]
    fn test_null_values_skips_complete_collections() {
        let users = Collection::from_records("users", vec![Record::new().with("_id", text("u1"))]);
        assert!(DataQualityAnalyzer::analyze_null_values(&users).is_none());
    }

    #[test]
    fn test_future_dates_flags_and_samples() {
        let now = fixed_now();
        let yesterday = now - Duration::days(1);
        let tomorrow = now + Duration::days(1);
        let receipts = receipts(vec![
            Record::new().with("createDate", FieldValue::Instant(yesterday)),
            Record::new().with("createDate", FieldValue::Instant(tomorrow)),
            Record::new().with("createDate", FieldValue::Instant(tomorrow)),
        ]);

        let findings = DataQualityAnalyzer::analyze_future_dates(&receipts, now);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Found 2 future dates in createDate");
        assert_eq!(
            findings[0].details,
            vec!["Sample dates: 2021-03-02 12:00:00, 2021-03-02 12:00:00".to_string()]
        );
    }

    #[test]
    fn test_future_dates_samples_capped_at_three() {
        let now = fixed_now();
        let records = (1..=5)
            .map(|d| Record::new().with("purchaseDate", FieldValue::Instant(now + Duration::days(d))))
            .collect();
        let findings = DataQualityAnalyzer::analyze_future_dates(&receipts(records), now);
        assert_eq!(findings[0].message, "Found 5 future dates in purchaseDate");
        assert_eq!(
            findings[0].details[0],
            "Sample dates: 2021-03-02 12:00:00, 2021-03-03 12:00:00, 2021-03-04 12:00:00"
        );
    }

    #[test]
    fn test_future_dates_equal_to_now_not_flagged() {
        let now = fixed_now();
        let receipts = receipts(vec![Record::new().with("dateScanned", FieldValue::Instant(now))]);
        assert!(DataQualityAnalyzer::analyze_future_dates(&receipts, now).is_empty());
    }

    #[test]
    fn test_date_sequence() {
        let now = fixed_now();
        let receipts = receipts(vec![
            Record::new()
                .with("dateScanned", FieldValue::Instant(now))
                .with("finishedDate", FieldValue::Instant(now - Duration::hours(1))),
            Record::new()
                .with("dateScanned", FieldValue::Instant(now))
                .with("finishedDate", FieldValue::Instant(now + Duration::hours(1))),
            Record::new().with("dateScanned", FieldValue::Instant(now)),
        ]);
        let finding = DataQualityAnalyzer::analyze_date_sequence(&receipts).unwrap();
        assert_eq!(
            finding.message,
            "Found 1 receipts where scan date is after finish date"
        );
    }

    #[test]
    fn test_date_sequence_requires_both_fields() {
        let receipts = receipts(vec![
            Record::new().with("dateScanned", FieldValue::Instant(fixed_now())),
        ]);
        assert!(DataQualityAnalyzer::analyze_date_sequence(&receipts).is_none());
    }

    #[test]
    fn test_orphaned_receipts() {
        let receipts = receipts(vec![
            Record::new().with("userId", text("u1")),
            Record::new().with("userId", text("u2")),
            Record::new().with("userId", text("u3")),
            Record::new().with("userId", text("u3")),
            Record::new().with("_id", text("r5")),
        ]);
        let users = Collection::from_records(
            "users",
            vec![
                Record::new().with("_id", FieldValue::from(json!({"$oid": "u1"}))),
                Record::new().with("_id", text("u2")),
            ],
        );

        let finding = DataQualityAnalyzer::analyze_orphaned_receipts(&receipts, &users).unwrap();
        assert_eq!(finding.message, "Found 2 receipts with no matching user");
    }

    #[test]
    fn test_orphaned_receipts_needs_user_ids() {
        let receipts = receipts(vec![Record::new().with("userId", text("u1"))]);
        let users = Collection::from_records("users", vec![Record::new().with("role", text("x"))]);
        assert!(DataQualityAnalyzer::analyze_orphaned_receipts(&receipts, &users).is_none());
    }

    #[test]
    fn test_negative_values_with_samples() {
        let receipts = receipts(vec![
            Record::new().with("totalSpent", text("-10.00")),
            Record::new().with("totalSpent", num(json!(-2.5))),
            Record::new().with("totalSpent", text("abc")),
            Record::new().with("totalSpent", text("5")),
            Record::new().with("pointsEarned", num(json!(-1))),
        ]);

        let findings = DataQualityAnalyzer::analyze_negative_values(&receipts);
        assert_eq!(
            messages(&findings),
            vec![
                "Found 1 negative values for points",
                "Found 2 negative values for amount spent",
            ]
        );
        assert_eq!(findings[0].details, vec!["Sample values: -1".to_string()]);
        assert_eq!(
            findings[1].details,
            vec!["Sample values: -10.00, -2.5".to_string()]
        );
    }

    #[test]
    fn test_negative_values_conversion_error_is_a_finding() {
        let receipts = receipts(vec![
            Record::new()
                .with("purchasedItemCount", num(json!(-1)))
                .with("totalSpent", num(json!(3))),
            Record::new()
                .with("purchasedItemCount", FieldValue::from(json!({"n": 2})))
                .with("totalSpent", num(json!(-3))),
        ]);

        let findings = DataQualityAnalyzer::analyze_negative_values(&receipts);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind, FindingKind::ConversionError);
        assert!(findings[0].message.starts_with("Error processing purchasedItemCount:"));
        assert_eq!(findings[1].message, "Found 1 negative values for amount spent");
    }

    #[test]
    fn test_duplicates_count_occurrences_after_first() {
        let brands = Collection::from_records(
            "brands",
            ["A", "A", "A", "B"]
                .iter()
                .map(|id| Record::new().with("_id", text(id)))
                .collect(),
        );
        let finding = DataQualityAnalyzer::analyze_duplicates(&brands).unwrap();
        assert_eq!(finding.message, "Found 2 duplicate brands records");
    }

    #[test]
    fn test_duplicates_match_object_ids() {
        let users = Collection::from_records(
            "users",
            vec![
                Record::new().with("_id", FieldValue::from(json!({"$oid": "a"}))),
                Record::new().with("_id", FieldValue::from(json!({"$oid": "a"}))),
                Record::new().with("_id", FieldValue::from(json!({"$oid": "b"}))),
            ],
        );
        let finding = DataQualityAnalyzer::analyze_duplicates(&users).unwrap();
        assert_eq!(finding.message, "Found 1 duplicate users records");
    }

    #[test]
    fn test_duplicates_keep_number_and_text_apart() {
        let brands = Collection::from_records(
            "brands",
            vec![
                Record::new().with("_id", num(json!(1))),
                Record::new().with("_id", text("1")),
            ],
        );
        assert!(DataQualityAnalyzer::analyze_duplicates(&brands).is_none());
    }

    #[test]
    fn test_orphaned_receipts_number_does_not_match_text_id() {
        let receipts = receipts(vec![Record::new().with("userId", num(json!(7)))]);
        let users = Collection::from_records("users", vec![Record::new().with("_id", text("7"))]);
        let finding = DataQualityAnalyzer::analyze_orphaned_receipts(&receipts, &users).unwrap();
        assert_eq!(finding.message, "Found 1 receipts with no matching user");
    }

    #[test]
    fn test_no_duplicates() {
        let users = Collection::from_records(
            "users",
            vec![
                Record::new().with("_id", text("a")),
                Record::new().with("_id", text("b")),
            ],
        );
        assert!(DataQualityAnalyzer::analyze_duplicates(&users).is_none());
    }

    #[test]
    fn test_status_distribution_orders_by_count() {
        let receipts = receipts(
            ["FINISHED", "REJECTED", "FLAGGED", "REJECTED", "FINISHED", "FINISHED"]
                .iter()
                .map(|s| Record::new().with("rewardsReceiptStatus", text(s)))
                .chain(std::iter::once(Record::new().with("_id", text("x"))))
                .collect(),
        );
        let finding = DataQualityAnalyzer::analyze_status_distribution(&receipts).unwrap();
        assert_eq!(finding.message, "Receipt status distribution:");
        assert_eq!(
            finding.details,
            vec![
                "- FINISHED: 3 receipts".to_string(),
                "- REJECTED: 2 receipts".to_string(),
                "- FLAGGED: 1 receipts".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_spend_with_items() {
        let receipts = receipts(vec![
            Record::new()
                .with("totalSpent", num(json!(0)))
                .with("purchasedItemCount", num(json!(3))),
            Record::new()
                .with("totalSpent", num(json!(0.0)))
                .with("purchasedItemCount", num(json!(2))),
            Record::new()
                .with("totalSpent", num(json!(0)))
                .with("purchasedItemCount", num(json!(0))),
            Record::new()
                .with("totalSpent", num(json!(4.5)))
                .with("purchasedItemCount", num(json!(1))),
        ]);
        let finding = DataQualityAnalyzer::analyze_zero_spend(&receipts).unwrap();
        assert_eq!(
            finding.message,
            "Found 2 receipts with items but zero total spent"
        );
    }

    #[test]
    fn test_zero_spend_ignores_text_amounts() {
        let receipts = receipts(vec![
            Record::new()
                .with("totalSpent", text("0.00"))
                .with("purchasedItemCount", num(json!(2))),
            Record::new()
                .with("totalSpent", num(json!(0)))
                .with("purchasedItemCount", text("2")),
        ]);
        assert!(DataQualityAnalyzer::analyze_zero_spend(&receipts).is_none());
    }

    #[test]
    fn test_identify_issues_order_and_normalization() {
        let now = fixed_now();
        let receipts = receipts(vec![
            Record::new()
                .with("_id", text("r1"))
                .with("userId", text("u9"))
                .with("createDate", FieldValue::from(json!({"$date": "2022-01-01T00:00:00Z"})))
                .with("rewardsReceiptStatus", text("FINISHED")),
            Record::new()
                .with("_id", text("r1"))
                .with("userId", text("u1"))
                .with("createDate", text("not a date"))
                .with("rewardsReceiptStatus", text("FINISHED")),
        ]);
        let users = Collection::from_records("users", vec![Record::new().with("_id", text("u1"))]);

        let lines = analyze(&receipts, &users, &empty("brands"), now);
        assert_eq!(
            lines,
            vec![
                "Found null values in receipts dataset:",
                "  - createDate: 1 null values",
                "Found 1 future dates in createDate",
                "  Sample dates: 2022-01-01 00:00:00",
                "Found 1 receipts with no matching user",
                "Found 1 duplicate receipts records",
                "Receipt status distribution:",
                "  - FINISHED: 2 receipts",
            ]
        );

        // Caller's collection still holds the raw values.
        assert_eq!(receipts.records()[1].get("createDate"), &text("not a date"));
    }
}
