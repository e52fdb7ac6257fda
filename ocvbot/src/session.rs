//! Session checkpoints and the state of the session-control loop
//!
//! A run is split into sessions separated by breaks. Within a session, five
//! checkpoints spread between the minimum and maximum session duration mark
//! the moments at which the control loop rolls to decide whether to log out.

use crate::errors::BotError;
use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const CHECKPOINT_COUNT: usize = 5;

/// Duration and session-count bounds, all validated `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub min_session_duration_secs: u64,
    pub max_session_duration_secs: u64,
    pub min_break_duration_secs: u64,
    pub max_break_duration_secs: u64,
    pub min_sessions: u32,
    pub max_sessions: u32,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), BotError> {
        check_bounds(
            "session_duration",
            self.min_session_duration_secs,
            self.max_session_duration_secs,
        )?;
        check_bounds(
            "break_duration",
            self.min_break_duration_secs,
            self.max_break_duration_secs,
        )?;
        check_bounds(
            "sessions",
            u64::from(self.min_sessions),
            u64::from(self.max_sessions),
        )
    }
}

fn check_bounds(name: &str, min: u64, max: u64) -> Result<(), BotError> {
    if min > max {
        return Err(BotError::InvalidConfig(format!(
            "min_{name} ({min}) must not exceed max_{name} ({max})"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub checked: bool,
}

impl Checkpoint {
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp(i64::try_from(self.timestamp).ok()?, 0)
            .map(|utc| utc.with_timezone(&Local))
    }
}

/// Checkpoints and session target for one process run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub checkpoints: [Checkpoint; CHECKPOINT_COUNT],
    pub session_total: u32,
    pub min_break_duration_secs: u64,
    pub max_break_duration_secs: u64,
}

/// Build the run's schedule anchored at `start` (seconds since the epoch).
///
/// The first and last checkpoints sit exactly at `start + min` and
/// `start + max`; the three between them split the span into quarters.
pub fn build_schedule<R: Rng + ?Sized>(
    config: &SessionConfig,
    start: u64,
    rng: &mut R,
) -> Result<Schedule, BotError> {
    config.validate()?;

    let min = config.min_session_duration_secs;
    let max = config.max_session_duration_secs;
    let interval = (max - min) as f64 / 4.0;
    let first = start + min;

    let mut checkpoints = [Checkpoint {
        timestamp: first,
        checked: false,
    }; CHECKPOINT_COUNT];
    for (i, checkpoint) in checkpoints.iter_mut().enumerate().take(4).skip(1) {
        checkpoint.timestamp = first + (interval * i as f64).round() as u64;
    }
    checkpoints[CHECKPOINT_COUNT - 1].timestamp = start + max;

    let session_total = rng.gen_range(config.min_sessions..=config.max_sessions);

    let schedule = Schedule {
        checkpoints,
        session_total,
        min_break_duration_secs: config.min_break_duration_secs,
        max_break_duration_secs: config.max_break_duration_secs,
    };
    match schedule.checkpoints[0].local_time() {
        Some(at) => info!("Checkpoint 1 is at {}, session_total is {}", at, session_total),
        None => info!(
            "Checkpoint 1 is at {}, session_total is {}",
            first, session_total
        ),
    }
    Ok(schedule)
}

/// Outcome of evaluating one due checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointDecision {
    /// Zero-based checkpoint index.
    pub checkpoint: usize,
    pub end_session: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Take a break of this length, then start the next session.
    Break(Duration),
    /// All sessions are done; the process should exit.
    Finished,
}

/// Mutable run state owned by the session-control loop.
#[derive(Debug, Clone)]
pub struct SessionState {
    schedule: Schedule,
    session_num: u32,
}

impl SessionState {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            session_num: 0,
        }
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.schedule.checkpoints
    }

    pub fn session_total(&self) -> u32 {
        self.schedule.session_total
    }

    /// Sessions completed so far.
    pub fn session_num(&self) -> u32 {
        self.session_num
    }

    /// Earliest unchecked checkpoint that has already passed.
    pub fn next_due(&self, now: u64) -> Option<usize> {
        self.schedule
            .checkpoints
            .iter()
            .position(|c| !c.checked && c.timestamp <= now)
    }

    /// Roll for the due checkpoint, if any, and mark it checked whatever the
    /// roll says. Each checkpoint yields at most one decision; the last one
    /// always ends the session.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        now: u64,
        rng: &mut R,
    ) -> Option<CheckpointDecision> {
        let index = self.next_due(now)?;
        let end_session = rng.gen_bool(logout_probability(index));
        self.schedule.checkpoints[index].checked = true;
        debug!(checkpoint = index + 1, end_session, "Checkpoint evaluated");
        Some(CheckpointDecision {
            checkpoint: index,
            end_session,
        })
    }

    /// Record a finished session and decide what comes next.
    pub fn complete_session<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SessionEnd {
        self.session_num += 1;
        if self.session_num >= self.schedule.session_total {
            info!(
                "Completed {} of {} sessions, finishing",
                self.session_num, self.schedule.session_total
            );
            return SessionEnd::Finished;
        }

        let secs = rng.gen_range(
            self.schedule.min_break_duration_secs..=self.schedule.max_break_duration_secs,
        );
        info!(
            "Completed {} of {} sessions, breaking for {}s",
            self.session_num, self.schedule.session_total, secs
        );
        SessionEnd::Break(Duration::from_secs(secs))
    }
}

/// Chance that checkpoint `index` (zero-based) ends the session: 1/5, 1/4,
/// 1/3, 1/2, then certain at the final checkpoint.
fn logout_probability(index: usize) -> f64 {
    if index + 1 >= CHECKPOINT_COUNT {
        1.0
    } else {
        1.0 / (CHECKPOINT_COUNT + 1 - (index + 1)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const T0: u64 = 1_700_000_000;

    fn config(min: u64, max: u64) -> SessionConfig {
        SessionConfig {
            min_session_duration_secs: min,
            max_session_duration_secs: max,
            min_break_duration_secs: 60,
            max_break_duration_secs: 120,
            min_sessions: 1,
            max_sessions: 3,
        }
    }

    fn timestamps(schedule: &Schedule) -> Vec<u64> {
        schedule.checkpoints.iter().map(|c| c.timestamp).collect()
    }

    #[test]
    fn test_schedule_checkpoints() {
        let mut rng = StdRng::seed_from_u64(1);
        let schedule = build_schedule(&config(1800, 3600), T0, &mut rng).unwrap();
        assert_eq!(
            timestamps(&schedule),
            vec![T0 + 1800, T0 + 2250, T0 + 2700, T0 + 3150, T0 + 3600]
        );
        assert!(schedule.checkpoints.iter().all(|c| !c.checked));
    }

    #[test]
    fn test_schedule_is_ordered_with_exact_endpoints() {
        let mut rng = StdRng::seed_from_u64(2);
        for (min, max) in [(0, 0), (5, 5), (0, 1), (7, 10), (60, 61), (123, 4567)] {
            let schedule = build_schedule(&config(min, max), T0, &mut rng).unwrap();
            let ts = timestamps(&schedule);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]), "{ts:?}");
            assert_eq!(ts[0], T0 + min);
            assert_eq!(ts[4], T0 + max);
        }
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = build_schedule(&config(60, 30), T0, &mut rng).unwrap_err();
        assert!(matches!(err, BotError::InvalidConfig(_)));
        assert!(err.is_fatal());

        let mut bad_break = config(30, 60);
        bad_break.min_break_duration_secs = 500;
        assert!(bad_break.validate().is_err());

        let mut bad_sessions = config(30, 60);
        bad_sessions.min_sessions = 4;
        assert!(build_schedule(&bad_sessions, T0, &mut rng).is_err());
    }

    #[test]
    fn test_session_total_within_bounds() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut fixed = config(10, 20);
        fixed.min_sessions = 2;
        fixed.max_sessions = 2;
        for _ in 0..50 {
            assert_eq!(build_schedule(&fixed, T0, &mut rng).unwrap().session_total, 2);
        }

        for _ in 0..200 {
            let total = build_schedule(&config(10, 20), T0, &mut rng)
                .unwrap()
                .session_total;
            assert!((1..=3).contains(&total));
        }
    }

    #[test]
    fn test_next_due_picks_earliest_unchecked() {
        let mut rng = StdRng::seed_from_u64(5);
        let schedule = build_schedule(&config(100, 500), T0, &mut rng).unwrap();
        let mut state = SessionState::new(schedule);

        assert_eq!(state.next_due(T0), None);
        assert_eq!(state.next_due(T0 + 100), Some(0));
        assert_eq!(state.next_due(T0 + 10_000), Some(0));

        state.evaluate(T0 + 10_000, &mut rng).unwrap();
        assert!(state.checkpoints()[0].checked);
        assert_eq!(state.next_due(T0 + 10_000), Some(1));
    }

    #[test]
    fn test_each_checkpoint_decides_once_and_last_forces_logout() {
        let mut rng = StdRng::seed_from_u64(6);
        let schedule = build_schedule(&config(100, 500), T0, &mut rng).unwrap();
        let mut state = SessionState::new(schedule);
        let late = T0 + 1_000;

        let decisions: Vec<_> = std::iter::from_fn(|| state.evaluate(late, &mut rng)).collect();
        assert_eq!(decisions.len(), CHECKPOINT_COUNT);
        assert_eq!(
            decisions.iter().map(|d| d.checkpoint).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!(decisions[4].end_session);
        assert!(state.checkpoints().iter().all(|c| c.checked));
        assert_eq!(state.evaluate(late, &mut rng), None);
    }

    #[test]
    fn test_logout_probability_rises_to_certainty() {
        let odds: Vec<f64> = (0..CHECKPOINT_COUNT).map(logout_probability).collect();
        assert_eq!(odds, vec![0.2, 0.25, 1.0 / 3.0, 0.5, 1.0]);
    }

    #[test]
    fn test_complete_session_breaks_then_finishes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cfg = config(10, 20);
        cfg.min_sessions = 3;
        cfg.max_sessions = 3;
        let mut state = SessionState::new(build_schedule(&cfg, T0, &mut rng).unwrap());

        for expected in 1..=2 {
            match state.complete_session(&mut rng) {
                SessionEnd::Break(d) => assert!((60..=120).contains(&d.as_secs())),
                SessionEnd::Finished => panic!("finished after {expected} sessions"),
            }
            assert_eq!(state.session_num(), expected);
        }
        assert_eq!(state.complete_session(&mut rng), SessionEnd::Finished);
        assert_eq!(state.session_num(), 3);
    }

    #[test]
    fn test_schedule_json_shape() {
        let mut rng = StdRng::seed_from_u64(8);
        let schedule = build_schedule(&config(100, 500), T0, &mut rng).unwrap();
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["checkpoints"].as_array().unwrap().len(), CHECKPOINT_COUNT);
        assert_eq!(json["checkpoints"][4]["timestamp"], T0 + 500);
        assert_eq!(json["checkpoints"][0]["checked"], false);
        assert_eq!(json["session_total"], schedule.session_total);
    }

    #[test]
    fn test_checkpoint_local_time() {
        let checkpoint = Checkpoint {
            timestamp: T0,
            checked: false,
        };
        assert_eq!(checkpoint.local_time().unwrap().timestamp(), T0 as i64);
    }
}
