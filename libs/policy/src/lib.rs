//! Cleanup policy primitives.
//!
//! This library decides *which* image digests to delete from a registry;
//! executing the deletions is the caller's job. Two rules apply in order:
//!
//! - **Age**: every image strictly older than the age threshold is selected.
//! - **Size**: if the registry still exceeds its byte budget after the age
//!   pass, the largest remaining images are selected one at a time until the
//!   budget is met or nothing is left.
//!
//! # Invariants
//!
//! - Selection is a pure function of the listing, the thresholds, and `now`.
//! - A digest appears at most once in a plan, even when it qualifies under
//!   both rules.
//! - Equal-size candidates in the size pass are taken oldest first.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The byte budget is zero; planning against it would select everything.
    #[error("size limit must be greater than zero bytes")]
    InvalidLimit,
}

/// A single image manifest as listed from the registry.
///
/// Immutable once fetched; the planner never mutates records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Repository the manifest lives in.
    pub repository: String,

    /// Content-addressed manifest identifier, e.g. `sha256:abc...`.
    pub digest: String,

    /// When the manifest was pushed.
    pub created_at: DateTime<Utc>,

    /// Stored size in bytes.
    pub size_bytes: u64,
}

/// Why a digest was selected for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Older than the age threshold.
    Age,
    /// Picked to bring the registry back under its byte budget.
    Size,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Age => write!(f, "age"),
            Reason::Size => write!(f, "size"),
        }
    }
}

/// One planned deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub repository: String,
    pub digest: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub reason: Reason,
}

/// An ordered set of digests marked for deletion.
///
/// Age-selected entries come first, then size-selected entries in the order
/// the size pass picked them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupPlan {
    /// Planned deletions, at most one entry per digest.
    pub entries: Vec<PlanEntry>,

    /// Total listed size of the registry before any deletion.
    pub total_bytes: u64,

    /// Bytes reclaimed if every entry is deleted.
    pub freed_bytes: u64,
}

impl CleanupPlan {
    /// Returns true if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of planned deletions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registry size after the plan is applied.
    pub fn remaining_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.freed_bytes)
    }

    /// Returns true if the plan already contains this digest.
    pub fn contains(&self, digest: &str) -> bool {
        self.entries.iter().any(|e| e.digest == digest)
    }

    fn push(&mut self, record: &ImageRecord, reason: Reason) {
        if self.contains(&record.digest) {
            return;
        }
        self.freed_bytes += record.size_bytes;
        self.entries.push(PlanEntry {
            repository: record.repository.clone(),
            digest: record.digest.clone(),
            created_at: record.created_at,
            size_bytes: record.size_bytes,
            reason,
        });
    }
}

/// Select every digest strictly older than `now - max_age_days`.
///
/// An image exactly `max_age_days` old is kept.
pub fn select_by_age(
    images: &[ImageRecord],
    max_age_days: u32,
    now: DateTime<Utc>,
) -> Vec<String> {
    let cutoff = now - Duration::days(i64::from(max_age_days));

    let mut selected = Vec::new();
    for image in images {
        if image.created_at < cutoff && !selected.contains(&image.digest) {
            selected.push(image.digest.clone());
        }
    }
    selected
}

/// Select digests largest-first until `total_bytes - freed <= limit_bytes`.
///
/// `images` must be the candidates not already selected by another rule and
/// `total_bytes` the registry size still standing. Equal sizes are broken by
/// oldest `created_at` first.
pub fn select_by_size(
    images: &[ImageRecord],
    total_bytes: u64,
    limit_bytes: u64,
) -> Vec<String> {
    let mut candidates: Vec<&ImageRecord> = images.iter().collect();
    candidates.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then(a.created_at.cmp(&b.created_at))
    });

    let mut selected = Vec::new();
    let mut freed = 0u64;
    for image in candidates {
        if total_bytes.saturating_sub(freed) <= limit_bytes {
            break;
        }
        if selected.contains(&image.digest) {
            continue;
        }
        freed += image.size_bytes;
        selected.push(image.digest.clone());
    }
    selected
}

/// Compute a cleanup plan: age rule first, then the size rule if the
/// registry still exceeds `limit_bytes`.
///
/// An empty listing yields an empty plan. A zero byte budget is rejected.
pub fn plan(
    images: &[ImageRecord],
    max_age_days: u32,
    limit_bytes: u64,
    now: DateTime<Utc>,
) -> Result<CleanupPlan, PolicyError> {
    if limit_bytes == 0 {
        return Err(PolicyError::InvalidLimit);
    }

    let mut plan = CleanupPlan {
        total_bytes: images.iter().map(|i| i.size_bytes).sum(),
        ..CleanupPlan::default()
    };

    for digest in select_by_age(images, max_age_days, now) {
        if let Some(record) = images.iter().find(|i| i.digest == digest) {
            plan.push(record, Reason::Age);
        }
    }

    if plan.remaining_bytes() > limit_bytes {
        let remaining: Vec<ImageRecord> = images
            .iter()
            .filter(|i| !plan.contains(&i.digest))
            .cloned()
            .collect();

        for digest in select_by_size(&remaining, plan.remaining_bytes(), limit_bytes) {
            if let Some(record) = remaining.iter().find(|i| i.digest == digest) {
                plan.push(record, Reason::Size);
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn image(repo: &str, digest: &str, days_old: i64, size_bytes: u64) -> ImageRecord {
        ImageRecord {
            repository: repo.to_string(),
            digest: digest.to_string(),
            created_at: now() - Duration::days(days_old),
            size_bytes,
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    #[rstest]
    #[case(89, false)]
    #[case(90, false)] // exactly at the threshold is kept
    #[case(91, true)]
    fn age_cut_is_strict(#[case] days_old: i64, #[case] selected: bool) {
        let images = vec![image("web", "sha256:a", days_old, 100)];

        let digests = select_by_age(&images, 90, now());
        assert_eq!(digests.contains(&"sha256:a".to_string()), selected);
    }

    #[test]
    fn age_selects_exactly_the_old_digests() {
        let images = vec![
            image("web", "sha256:a", 10, 100),
            image("web", "sha256:b", 200, 100),
            image("api", "sha256:c", 400, 100),
        ];

        let digests = select_by_age(&images, 90, now());
        assert_eq!(digests, vec!["sha256:b", "sha256:c"]);
    }

    #[test]
    fn worked_example_age_only() {
        // A: 100 B / 1 day, B: 500 B / 200 days, C: 900 B / 5 days.
        // max_age 90 deletes B; remaining 1000 <= limit 1000, no size pass.
        let images = vec![
            image("web", "sha256:a", 1, 100),
            image("web", "sha256:b", 200, 500),
            image("web", "sha256:c", 5, 900),
        ];

        let plan = plan(&images, 90, 1000, now()).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].digest, "sha256:b");
        assert_eq!(plan.entries[0].reason, Reason::Age);
        assert_eq!(plan.remaining_bytes(), 1000);
    }

    #[test]
    fn size_pass_takes_largest_first() {
        // All younger than the threshold, total 3000 > limit 1000.
        let images = vec![
            image("web", "sha256:a", 1, 500),
            image("web", "sha256:b", 2, 1500),
            image("web", "sha256:c", 3, 1000),
        ];

        let plan = plan(&images, 90, 1000, now()).unwrap();

        let digests: Vec<&str> = plan.entries.iter().map(|e| e.digest.as_str()).collect();
        assert_eq!(digests, vec!["sha256:b", "sha256:c"]);
        assert!(plan.entries.iter().all(|e| e.reason == Reason::Size));
        assert_eq!(plan.remaining_bytes(), 500);
    }

    #[test]
    fn size_ties_break_oldest_first() {
        let images = vec![
            image("web", "sha256:young", 1, 1000),
            image("web", "sha256:old", 30, 1000),
        ];

        let digests = select_by_size(&images, 2000, 500);
        assert_eq!(digests, vec!["sha256:old", "sha256:young"]);
    }

    #[test]
    fn digest_qualifying_under_both_rules_is_selected_once() {
        // b is both old and the largest image.
        let images = vec![
            image("web", "sha256:a", 1, 400),
            image("web", "sha256:b", 200, 2000),
            image("web", "sha256:c", 2, 600),
        ];

        let plan = plan(&images, 90, 800, now()).unwrap();

        let count = plan
            .entries
            .iter()
            .filter(|e| e.digest == "sha256:b")
            .count();
        assert_eq!(count, 1);
        assert_eq!(plan.entries[0].reason, Reason::Age);

        // Age pass freed 2000, remaining 1000 > 800, size pass takes c.
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entries[1].digest, "sha256:c");
        assert_eq!(plan.entries[1].reason, Reason::Size);
    }

    #[test]
    fn no_size_pass_when_under_budget_after_age() {
        let images = vec![
            image("web", "sha256:a", 200, 900),
            image("web", "sha256:b", 1, 100),
        ];

        let plan = plan(&images, 90, 500, now()).unwrap();

        assert_eq!(plan.len(), 1);
        assert!(plan.entries.iter().all(|e| e.reason == Reason::Age));
    }

    #[test]
    fn size_pass_exhausts_listing_when_budget_unreachable() {
        // Even deleting everything cannot matter: the pass stops when the
        // listing runs out, not before.
        let images = vec![
            image("web", "sha256:a", 1, 600),
            image("web", "sha256:b", 2, 400),
        ];

        let plan = plan(&images, 90, 1, now()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.remaining_bytes(), 0);
    }

    #[test]
    fn empty_listing_yields_empty_plan() {
        let plan = plan(&[], 90, 1000, now()).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.total_bytes, 0);
        assert_eq!(plan.freed_bytes, 0);
    }

    #[test]
    fn zero_limit_is_invalid_configuration() {
        let images = vec![image("web", "sha256:a", 1, 100)];

        let err = plan(&images, 90, 0, now()).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidLimit));
    }

    #[test]
    fn plan_serializes_reason_tags() {
        let images = vec![image("web", "sha256:b", 200, 500)];
        let plan = plan(&images, 90, 1000, now()).unwrap();

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["entries"][0]["reason"], "age");
    }
}
