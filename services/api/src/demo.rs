use crate::infra::InMemoryAlertPublisher;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use ed_triage::error::AppError;
use ed_triage::workflows::triage::queue::DEFAULT_ADMISSION_PREFIX;
use ed_triage::workflows::triage::{
    Actor, AdmissionForm, AlertPublisher, LifecycleStatus, PatientIdentity,
    PatientRecord, QueueFilter, QueueStatistics, Role, ScoringEngine, StaffId, TriageAnswer,
    TriageAnswerSet, TriageDeskService, TriageError, TriageSettings, UrgencyTier,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Shift date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Only print the dashboard for this role (urgentiste, receptionniste, medecin, admin).
    #[arg(long, value_parser = parse_role)]
    pub(crate) role: Option<Role>,
    /// Print the department statistics as JSON after the dashboards.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// Pain level, 0 to 10
    #[arg(long)]
    pub(crate) pain: Option<f64>,
    /// Breathing difficulty
    #[arg(long)]
    pub(crate) breathing: bool,
    /// Active bleeding
    #[arg(long)]
    pub(crate) bleeding: bool,
    /// Loss of consciousness
    #[arg(long)]
    pub(crate) unconscious: bool,
    /// Fever above 39°C
    #[arg(long)]
    pub(crate) fever: bool,
    /// Severe trauma
    #[arg(long)]
    pub(crate) trauma: bool,
    /// Manual adjustment of the final score (1-10)
    #[arg(long = "override")]
    pub(crate) score_override: Option<i64>,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| {
        format!("unknown role '{raw}' (expected urgentiste, receptionniste, medecin or admin)")
    })
}

impl ScoreArgs {
    fn answers(&self) -> TriageAnswerSet {
        let mut answers = TriageAnswerSet::new();
        if let Some(pain) = self.pain {
            answers.insert("q1", TriageAnswer::Number(pain));
        }
        for (id, flag) in [
            ("q2", self.breathing),
            ("q3", self.bleeding),
            ("q4", self.unconscious),
            ("q5", self.fever),
            ("q6", self.trauma),
        ] {
            answers.insert(id, TriageAnswer::Flag(flag));
        }
        answers
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let engine = ScoringEngine::default();
    let mut assessment = engine.assess(&args.answers());
    if let Some(value) = args.score_override {
        assessment = engine
            .override_score(assessment, value)
            .map_err(TriageError::from)?;
    }

    println!("Questionnaire de triage");
    for contribution in &assessment.contributions {
        println!("  {:<32} {:>5.2}", contribution.prompt, contribution.points);
    }
    println!("  {:<32} {:>5.2}", "Total brut", assessment.raw);
    println!("\n{}", assessment.summary());
    println!("Circuit : {}", assessment.circuit.label());
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let shift_date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let service = TriageDeskService::new(
        TriageSettings::default(),
        DEFAULT_ADMISSION_PREFIX,
        alerts.clone(),
    );

    let admitted = seed_shift(&service, shift_date)?;
    let now = at(shift_date, 12, 0);

    println!("Service des urgences : {} passages le {shift_date}", admitted.len());
    println!("Alertes urgentes émises : {}", alerts.events().len());

    for (actor, title) in roster() {
        if args.role.is_some_and(|role| Some(role) != actor.role) {
            continue;
        }
        println!("\n== {title} ==");
        render_dashboard(&service, &actor, now)?;
    }

    if args.json {
        let stats = service.statistics(&admin(), now)?;
        match serde_json::to_string_pretty(&stats) {
            Ok(body) => println!("\n{body}"),
            Err(err) => eprintln!("failed to render statistics: {err}"),
        }
    }

    Ok(())
}

/// How a seeded patient ends up by the time the dashboards are printed.
#[derive(Debug, Clone, Copy)]
enum SeedOutcome {
    Waiting,
    AssignedTo(&'static str),
    InConsultation {
        doctor: &'static str,
        note: Option<&'static str>,
    },
    Discharged {
        doctor: &'static str,
        diagnosis: &'static str,
    },
}

struct SeedPatient {
    surname: &'static str,
    given_name: &'static str,
    age: u16,
    reason: &'static str,
    contact: &'static str,
    pain: u8,
    flags: &'static [&'static str],
    score_override: Option<i64>,
    arrival: (u32, u32),
    notes: &'static [&'static str],
    outcome: SeedOutcome,
}

const SHIFT: [SeedPatient; 7] = [
    SeedPatient {
        surname: "Khelifa",
        given_name: "Molka",
        age: 34,
        reason: "Douleur thoracique aiguë",
        contact: "+216 55 123 456",
        pain: 10,
        flags: &["q2", "q4", "q5"],
        score_override: None,
        arrival: (8, 15),
        notes: &["Douleur thoracique depuis 2h", "Antécédents cardiaques familiaux"],
        outcome: SeedOutcome::InConsultation {
            doctor: "dr-mansour",
            note: None,
        },
    },
    SeedPatient {
        surname: "Fattalah",
        given_name: "Ahmed",
        age: 45,
        reason: "Fracture suspectée au bras droit",
        contact: "+216 98 765 432",
        pain: 7,
        flags: &["q3", "q6"],
        score_override: None,
        arrival: (9, 30),
        notes: &["Chute en escalier"],
        outcome: SeedOutcome::Waiting,
    },
    SeedPatient {
        surname: "Ben Ali",
        given_name: "Fatma",
        age: 28,
        reason: "Fièvre élevée et maux de tête",
        contact: "+216 22 334 556",
        pain: 7,
        flags: &["q2", "q5"],
        score_override: None,
        arrival: (10, 0),
        notes: &["Fièvre 39.5°C depuis hier"],
        outcome: SeedOutcome::Waiting,
    },
    SeedPatient {
        surname: "Trabelsi",
        given_name: "Omar",
        age: 62,
        reason: "Difficulté respiratoire sévère",
        contact: "+216 50 112 233",
        pain: 8,
        flags: &["q2", "q4", "q5"],
        score_override: Some(10),
        arrival: (10, 45),
        notes: &["BPCO connu", "Saturation O2: 88%"],
        outcome: SeedOutcome::AssignedTo("dr-bouazizi"),
    },
    SeedPatient {
        surname: "Ben Youssef",
        given_name: "Sana",
        age: 19,
        reason: "Entorse de la cheville",
        contact: "+216 93 445 667",
        pain: 4,
        flags: &["q6"],
        score_override: None,
        arrival: (11, 20),
        notes: &["Accident sportif"],
        outcome: SeedOutcome::Waiting,
    },
    SeedPatient {
        surname: "Hammami",
        given_name: "Yassine",
        age: 50,
        reason: "Douleur abdominale intense",
        contact: "+216 27 889 001",
        pain: 10,
        flags: &["q4", "q5"],
        score_override: None,
        arrival: (7, 50),
        notes: &["Vomissements depuis ce matin", "Suspicion appendicite"],
        outcome: SeedOutcome::InConsultation {
            doctor: "dr-mansour",
            note: Some("Appendicite aiguë - Chirurgie programmée"),
        },
    },
    SeedPatient {
        surname: "Saidi",
        given_name: "Rim",
        age: 41,
        reason: "Coupure profonde à la main",
        contact: "+216 54 667 889",
        pain: 8,
        flags: &["q3"],
        score_override: None,
        arrival: (6, 30),
        notes: &["Accident domestique", "Sutures effectuées"],
        outcome: SeedOutcome::Discharged {
            doctor: "dr-mansour",
            diagnosis: "Plaie suturée - Contrôle J+7",
        },
    },
];

fn triage_nurse() -> Actor {
    Actor::new("nizar", Role::Urgentiste)
}

fn admin() -> Actor {
    Actor::new("sofiane", Role::Admin)
}

fn roster() -> Vec<(Actor, &'static str)> {
    vec![
        (triage_nurse(), "Urgentiste (Nizar Chaabane)"),
        (
            Actor::new("amira", Role::Receptionniste),
            "Réceptionniste (Amira Gharbi)",
        ),
        (
            Actor::new("dr-mansour", Role::Medecin),
            "Médecin (Dr. Karim Mansour)",
        ),
        (
            Actor::new("dr-bouazizi", Role::Medecin),
            "Médecin (Dr. Leila Bouazizi)",
        ),
        (admin(), "Administrateur (Sofiane Mejri)"),
    ]
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Replays a morning shift through the service, each step performed by the role allowed to do it.
fn seed_shift<A>(
    service: &TriageDeskService<A>,
    shift_date: NaiveDate,
) -> Result<Vec<PatientRecord>, AppError>
where
    A: AlertPublisher + 'static,
{
    let nurse = triage_nurse();
    let admin = admin();
    let mut admitted = Vec::with_capacity(SHIFT.len());

    for patient in &SHIFT {
        let mut answers = TriageAnswerSet::new().with_number("q1", patient.pain);
        for flag in patient.flags {
            answers = answers.with_flag(flag, true);
        }
        let form = AdmissionForm {
            identity: PatientIdentity {
                surname: patient.surname.to_string(),
                given_name: patient.given_name.to_string(),
                age: Some(patient.age),
                reason: patient.reason.to_string(),
                contact: patient.contact.to_string(),
            },
            answers: Some(answers),
            score_override: patient.score_override,
        };
        let (hour, minute) = patient.arrival;
        let record = service.admit_at(&nurse, form, at(shift_date, hour, minute))?;

        for note in patient.notes {
            service.append_note(&nurse, &record.id, note)?;
        }

        match patient.outcome {
            SeedOutcome::Waiting => {}
            SeedOutcome::AssignedTo(doctor) => {
                service.reassign(&admin, &record.id, Some(StaffId::new(doctor)))?;
            }
            SeedOutcome::InConsultation { doctor, note } => {
                let doctor = Actor::new(doctor, Role::Medecin);
                service.reassign(&admin, &record.id, Some(doctor.staff_id.clone()))?;
                service.claim(&doctor, &record.id, Some(LifecycleStatus::Waiting))?;
                if let Some(note) = note {
                    service.append_note(&doctor, &record.id, note)?;
                }
            }
            SeedOutcome::Discharged { doctor, diagnosis } => {
                let doctor = Actor::new(doctor, Role::Medecin);
                service.reassign(&admin, &record.id, Some(doctor.staff_id.clone()))?;
                service.claim(&doctor, &record.id, Some(LifecycleStatus::Waiting))?;
                service.discharge(
                    &doctor,
                    &record.id,
                    diagnosis,
                    Some(LifecycleStatus::InConsultation),
                )?;
            }
        }

        admitted.push(service.queue().get(&record.id)?);
    }

    Ok(admitted)
}

fn render_dashboard<A>(
    service: &TriageDeskService<A>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<(), AppError>
where
    A: AlertPublisher + 'static,
{
    match actor.role {
        Some(Role::Admin) => {
            let stats = service.statistics(actor, now)?;
            render_statistics(&stats);
            let settings = service.settings(actor)?;
            let boundaries = settings.boundaries();
            println!(
                "Seuils : critique >= {}, élevé >= {}, modéré >= {}",
                boundaries.critical(),
                boundaries.high(),
                boundaries.moderate()
            );
            for question in settings.questions() {
                println!("  {} {:<32} poids {}", question.id, question.prompt, question.weight);
            }
        }
        Some(Role::Receptionniste) => {
            let backlog = service.urgent_backlog(actor)?;
            println!("Urgences en attente : {}", backlog.len());
            render_queue(&service.view_queue(actor, QueueFilter::Active)?, now);
        }
        _ => render_queue(&service.view_queue(actor, QueueFilter::Active)?, now),
    }
    Ok(())
}

fn render_queue(records: &[PatientRecord], now: DateTime<Utc>) {
    if records.is_empty() {
        println!("(aucun patient)");
        return;
    }
    for record in records {
        let view = record.view();
        let caregiver = view
            .assigned_caregiver
            .as_ref()
            .map(|staff| staff.0.as_str())
            .unwrap_or("-");
        println!(
            "{:<14} {:<22} {:>5} {:<9} {:<16} {:>4} min  {}",
            view.admission_number.0,
            view.display_name,
            record.score.to_string(),
            view.tier_label,
            view.status_label,
            record.wait_minutes(now),
            caregiver
        );
    }
}

fn render_statistics(stats: &QueueStatistics) {
    println!("Patients : {}", stats.total);
    for tier in UrgencyTier::ordered() {
        println!("  {:<10} {}", tier.label(), stats.tier_count(tier));
    }
    for status in LifecycleStatus::ordered() {
        println!("  {:<16} {}", status.label(), stats.status_count(status));
    }
    println!("Urgences en attente : {}", stats.urgent_backlog);
    match stats.average_wait_minutes {
        Some(minutes) => println!("Attente moyenne : {minutes:.0} min"),
        None => println!("Attente moyenne : -"),
    }
}
