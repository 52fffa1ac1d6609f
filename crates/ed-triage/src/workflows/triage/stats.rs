use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{LifecycleStatus, Score, UrgencyTier};
use super::record::PatientRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCount {
    pub tier: UrgencyTier,
    pub tier_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: LifecycleStatus,
    pub status_label: &'static str,
    pub count: usize,
}

/// Dashboard figures, recomputed from the full record set on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatistics {
    pub total: usize,
    pub by_tier: Vec<TierCount>,
    pub by_status: Vec<StatusCount>,
    pub urgent_backlog: usize,
    /// Mean wait of patients still waiting, in minutes. `None` when nobody is waiting.
    pub average_wait_minutes: Option<f64>,
}

impl QueueStatistics {
    pub fn compute(
        records: &[PatientRecord],
        urgent_threshold: Score,
        now: DateTime<Utc>,
    ) -> Self {
        let by_tier = UrgencyTier::ordered()
            .into_iter()
            .map(|tier| TierCount {
                tier,
                tier_label: tier.label(),
                count: records.iter().filter(|record| record.tier == tier).count(),
            })
            .collect();

        let by_status = LifecycleStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                status_label: status.label(),
                count: records
                    .iter()
                    .filter(|record| record.status == status)
                    .count(),
            })
            .collect();

        let urgent_backlog = records
            .iter()
            .filter(|record| record.is_urgent_waiting(urgent_threshold))
            .count();

        let waits: Vec<i64> = records
            .iter()
            .filter(|record| record.status == LifecycleStatus::Waiting)
            .map(|record| record.wait_minutes(now))
            .collect();
        let average_wait_minutes = if waits.is_empty() {
            None
        } else {
            Some(waits.iter().sum::<i64>() as f64 / waits.len() as f64)
        };

        Self {
            total: records.len(),
            by_tier,
            by_status,
            urgent_backlog,
            average_wait_minutes,
        }
    }

    pub fn tier_count(&self, tier: UrgencyTier) -> usize {
        self.by_tier
            .iter()
            .find(|entry| entry.tier == tier)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn status_count(&self, status: LifecycleStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
