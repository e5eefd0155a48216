//! Dual-phase constraint-satisfying duty-roster scheduling engine.
//!
//! [`generate_schedule`] is the single entry point: it validates a
//! [`config::SchedulerConfig`], runs the strict Phase-1 distributor, then
//! the relaxed Phase-2 improver, and returns a [`GenerationReport`]
//! bundling the resulting schedule with its statistics. The engine
//! performs no I/O; callers own persistence and transport.

pub mod backup;
pub mod cancellation;
pub mod config;
pub mod constraints;
pub mod error;
pub mod model;
pub mod phase1;
pub mod phase2;
pub mod quota;
pub mod scorer;
pub mod stats;

use std::collections::HashMap;

use shared::WorkerId;
use thiserror::Error;

use cancellation::CancellationToken;
use config::SchedulerConfig;
use constraints::Violation;
use error::ConfigError;
use model::Schedule;
use phase1::UnresolvedMandatory;
use phase2::Objective;
use stats::Deviation;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Everything a caller needs after a generation run: the schedule itself,
/// the targets it was built against, any mandatory days that could not be
/// honored, any surviving soft violations, the final objective terms, and
/// per-worker deviations.
///
/// A cancelled run is not an error (see spec §5/§7): `cancelled` is set and
/// the rest of the report reflects the best draft produced before the
/// cancellation was observed.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub schedule: Schedule,
    pub targets: HashMap<WorkerId, u32>,
    pub unresolved_mandatories: Vec<UnresolvedMandatory>,
    pub violations: Vec<Violation>,
    pub objective: Objective,
    pub deviations: Vec<Deviation>,
    /// How many of `config.phase1_attempts` independent attempts ran.
    pub attempts_run: u32,
    pub cancelled: bool,
}

/// Runs the full two-phase generation pipeline described in spec §4.
///
/// Returns [`EngineError::Config`] if `config` fails validation. Never
/// produces a schedule carrying a hard [`Violation`] — Phase-1 guarantees
/// this by construction and Phase-2 never relaxes it. Cancellation does not
/// produce an error: the best draft available at the checkpoint is
/// returned with [`GenerationReport::cancelled`] set.
#[tracing::instrument(skip(config, cancellation), fields(start = %config.start_date, end = %config.end_date, workers = config.workers.len()))]
pub fn generate_schedule(
    config: &SchedulerConfig,
    cancellation: Option<&CancellationToken>,
) -> EngineResult<GenerationReport> {
    config.validate()?;

    let targets = quota::compute_targets(config);
    tracing::debug!(targets = targets.len(), "computed worker targets");

    let is_cancelled = || cancellation.map(|t| t.is_cancelled()).unwrap_or(false);

    if is_cancelled() {
        tracing::info!("generation cancelled before phase 1 started");
        let schedule = Schedule::new(config.start_date, config.end_date, |d| model::calendar::slots_for_date(d, config));
        return Ok(finish_report(schedule, config, targets, Vec::new(), config.phase1_attempts.max(1), true));
    }

    let attempt = phase1::distribute(config, &targets);
    tracing::info!(filled = attempt.filled, total = attempt.total_slots, "phase 1 distribution complete");

    if is_cancelled() {
        tracing::info!("generation cancelled after phase 1, returning best-so-far draft");
        return Ok(finish_report(
            attempt.schedule,
            config,
            targets,
            attempt.unresolved_mandatories,
            config.phase1_attempts.max(1),
            true,
        ));
    }

    let mut schedule = attempt.schedule;
    let moves = phase2::improve(&mut schedule, config, &targets);
    tracing::info!(moves = moves.len(), "phase 2 improvement complete");

    Ok(finish_report(schedule, config, targets, attempt.unresolved_mandatories, config.phase1_attempts.max(1), false))
}

fn finish_report(
    schedule: Schedule,
    config: &SchedulerConfig,
    targets: HashMap<WorkerId, u32>,
    unresolved_mandatories: Vec<UnresolvedMandatory>,
    attempts_run: u32,
    cancelled: bool,
) -> GenerationReport {
    let violations = constraints::check_schedule(&schedule, config);
    debug_assert!(violations.iter().all(|v| !v.is_hard()), "generation must never surface a hard violation");

    let objective = phase2::objective(&schedule, config, &targets);
    let deviations = stats::deviations(&schedule, config, &targets);

    GenerationReport {
        schedule,
        targets,
        unresolved_mandatories,
        violations,
        objective,
        deviations,
        attempts_run,
        cancelled,
    }
}
