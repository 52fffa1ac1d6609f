use chrono::NaiveDate;
use ed_triage::workflows::triage::{AlertError, AlertPublisher, UrgentAlert};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps urgent alerts in memory and mirrors them to the log; stands in for the ward pager.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<UrgentAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: UrgentAlert) -> Result<(), AlertError> {
        info!(
            patient_id = %alert.patient_id,
            admission_number = %alert.admission_number,
            score = alert.score,
            tier = alert.tier.code(),
            "urgent patient waiting"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert log poisoned".to_string()))?;
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<UrgentAlert> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed_triage::workflows::triage::{
        AdmissionNumber, CareCircuit, PatientId, UrgencyTier,
    };

    #[test]
    fn publisher_records_alerts() {
        let publisher = InMemoryAlertPublisher::default();
        publisher
            .publish(UrgentAlert {
                patient_id: PatientId("p-1".to_string()),
                admission_number: AdmissionNumber::format("URG", 2026, 4),
                score: 10,
                tier: UrgencyTier::Critical,
                circuit: CareCircuit::DirectToReception,
            })
            .expect("publish succeeds");

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].admission_number.0, "URG-2026-004");
    }

    #[test]
    fn parse_date_reports_the_bad_input() {
        assert!(parse_date("2026-03-14").is_ok());
        let err = parse_date("14/03/2026").expect_err("wrong format");
        assert!(err.contains("14/03/2026"));
    }
}
