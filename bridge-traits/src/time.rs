//! Time Abstractions
//!
//! Provides an injectable time source and scheduler so that deadline and
//! retry logic can be exercised without real wall-clock delay.
//!
//! Deadlines are measured on the monotonic [`Clock::instant`]; the wall
//! clock from [`Clock::now`] is only for display and logs, since it can be
//! stepped backwards or forwards by the system.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Time source and scheduler trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// async fn wait_a_bit(clock: &dyn Clock) {
///     let start = clock.instant();
///     clock.sleep(std::time::Duration::from_secs(1)).await;
///     println!("waited {:?}", clock.elapsed_since(start));
/// }
/// ```
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic instant for measuring elapsed time
    fn instant(&self) -> Instant;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);

    /// Monotonic time elapsed since `earlier`, saturating at zero
    fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.instant().saturating_duration_since(earlier)
    }
}

/// System clock implementation using actual system time and Tokio timers
///
/// `instant` follows Tokio's clock, so it honours paused test time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
struct ManualState {
    wall: DateTime<Utc>,
    instant: Instant,
}

/// Virtual clock for tests and simulations.
///
/// `sleep` returns immediately after advancing the clock by the requested
/// duration, and every requested sleep is recorded. The wall clock can be
/// stepped independently with [`ManualClock::set_wall_time`] without
/// disturbing the monotonic instant.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                wall: start,
                instant: Instant::now(),
            }),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock forward without recording a sleep
    ///
    /// Never overflows: the wall clock saturates at
    /// `DateTime::<Utc>::MAX_UTC` and an instant step that cannot be
    /// represented is skipped.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
        state.wall = state
            .wall
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if let Some(next) = state.instant.checked_add(duration) {
            state.instant = next;
        }
    }

    /// Step the wall clock to `wall`, as an NTP correction would
    pub fn set_wall_time(&self, wall: DateTime<Utc>) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).wall = wall;
    }

    /// Durations of every `sleep` call, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).wall
    }

    fn instant(&self) -> Instant {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).instant
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}
