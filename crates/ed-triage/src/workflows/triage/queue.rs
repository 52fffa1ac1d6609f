use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdmissionNumber, LifecycleStatus, PatientId, Score};
use super::error::{TriageError, ValidationError};
use super::record::{AdmissionRequest, PatientRecord};
use super::scoring::TierBoundaries;

pub const DEFAULT_ADMISSION_PREFIX: &str = "URG";

/// Which slice of the queue a view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFilter {
    /// Everyone not yet discharged.
    #[default]
    Active,
    Status(LifecycleStatus),
    All,
}

impl QueueFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "active" => Some(QueueFilter::Active),
            "all" => Some(QueueFilter::All),
            other => LifecycleStatus::parse(other).map(QueueFilter::Status),
        }
    }

    pub fn matches(self, record: &PatientRecord) -> bool {
        match self {
            QueueFilter::Active => record.status != LifecycleStatus::Discharged,
            QueueFilter::Status(status) => record.status == status,
            QueueFilter::All => true,
        }
    }
}

/// Queue priority: higher score first, then earlier arrival, then admission order.
///
/// The admission sequence is unique, which makes the order total.
pub fn queue_order(a: &PatientRecord, b: &PatientRecord) -> CmpOrdering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.arrival_time.cmp(&b.arrival_time))
        .then_with(|| a.sequence.cmp(&b.sequence))
}

type SharedRecord = Arc<Mutex<PatientRecord>>;

/// In-memory set of admitted patients for one session.
///
/// Admission takes the map write lock; every other mutation locks only the target record, so
/// different patients can be updated concurrently while changes to one patient serialize.
#[derive(Debug)]
pub struct PatientQueue {
    admission_prefix: String,
    sequence: AtomicU64,
    records: RwLock<BTreeMap<PatientId, SharedRecord>>,
}

impl Default for PatientQueue {
    fn default() -> Self {
        Self::new(DEFAULT_ADMISSION_PREFIX)
    }
}

impl PatientQueue {
    pub fn new(admission_prefix: impl Into<String>) -> Self {
        Self {
            admission_prefix: admission_prefix.into(),
            sequence: AtomicU64::new(1),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn admit(&self, request: AdmissionRequest) -> Result<PatientRecord, TriageError> {
        self.admit_at(request, Utc::now())
    }

    /// Admission with an explicit arrival timestamp (session seeding, replays).
    pub fn admit_at(
        &self,
        request: AdmissionRequest,
        arrival_time: DateTime<Utc>,
    ) -> Result<PatientRecord, TriageError> {
        request.identity.validate()?;
        let assessment = request.assessment.ok_or(ValidationError::MissingScore)?;

        let mut records = self.records.write().map_err(|_| TriageError::poisoned())?;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let record = PatientRecord {
            id: PatientId::generate(),
            admission_number: AdmissionNumber::format(
                &self.admission_prefix,
                arrival_time.year(),
                sequence,
            ),
            sequence,
            identity: request.identity,
            arrival_time,
            computed_score: assessment.computed,
            score: assessment.effective(),
            tier: assessment.tier,
            status: LifecycleStatus::Waiting,
            admitted_by: request.admitted_by,
            assigned_caregiver: None,
            diagnosis: None,
            transfer_destination: None,
            notes: Vec::new(),
            updated_at: arrival_time,
        };

        records.insert(record.id.clone(), Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }

    pub fn get(&self, id: &PatientId) -> Result<PatientRecord, TriageError> {
        let shared = self.shared(id)?;
        let record = shared.lock().map_err(|_| TriageError::poisoned())?;
        Ok(record.clone())
    }

    /// Runs `mutate` against a working copy of the record while holding its lock, and only
    /// commits the copy when `mutate` succeeds.
    pub fn update<T, F>(&self, id: &PatientId, mutate: F) -> Result<T, TriageError>
    where
        F: FnOnce(&mut PatientRecord) -> Result<T, TriageError>,
    {
        let shared = self.shared(id)?;
        let mut record = shared.lock().map_err(|_| TriageError::poisoned())?;

        let mut working = record.clone();
        let outcome = mutate(&mut working)?;
        *record = working;
        Ok(outcome)
    }

    pub fn visible_for(&self, filter: QueueFilter) -> Result<Vec<PatientRecord>, TriageError> {
        let mut visible: Vec<PatientRecord> = self
            .snapshot()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        visible.sort_by(queue_order);
        Ok(visible)
    }

    /// Waiting patients at or above `threshold`, in queue order.
    pub fn urgent_backlog(&self, threshold: Score) -> Result<Vec<PatientRecord>, TriageError> {
        let mut backlog: Vec<PatientRecord> = self
            .snapshot()?
            .into_iter()
            .filter(|record| record.is_urgent_waiting(threshold))
            .collect();
        backlog.sort_by(queue_order);
        Ok(backlog)
    }

    /// Re-derives every tier from the current scores. Returns how many records changed tier.
    pub fn reclassify_all(&self, boundaries: &TierBoundaries) -> Result<usize, TriageError> {
        let ids: Vec<PatientId> = {
            let records = self.records.read().map_err(|_| TriageError::poisoned())?;
            records.keys().cloned().collect()
        };

        let mut changed = 0;
        for id in ids {
            if self.update(&id, |record| Ok(record.reclassify(boundaries)))? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn snapshot(&self) -> Result<Vec<PatientRecord>, TriageError> {
        let records = self.records.read().map_err(|_| TriageError::poisoned())?;
        records
            .values()
            .map(|shared| {
                shared
                    .lock()
                    .map(|record| record.clone())
                    .map_err(|_| TriageError::poisoned())
            })
            .collect()
    }

    pub fn len(&self) -> Result<usize, TriageError> {
        let records = self.records.read().map_err(|_| TriageError::poisoned())?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool, TriageError> {
        Ok(self.len()? == 0)
    }

    fn shared(&self, id: &PatientId) -> Result<SharedRecord, TriageError> {
        let records = self.records.read().map_err(|_| TriageError::poisoned())?;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| TriageError::NotFound(id.clone()))
    }
}
