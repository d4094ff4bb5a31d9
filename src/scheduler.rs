//! Cooperative scheduler firing the monitor at configured clock times and the
//! health check at the top of every hour.
//!
//! The loop runs on one task and polls the clock every tick. A cycle that
//! overruns later fire times makes the scheduler skip those fires instead of
//! running them back to back.

use crate::config::Config;
use crate::health::HealthCheck;
use crate::monitor::Monitor;
use crate::notify::NotificationSink;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default sleep between clock checks.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// When the monitor cycle fires, in local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorPlan {
    /// Every `hours` hours starting at local midnight.
    Interval { hours: u32 },
    /// Explicit clock times, sorted and deduplicated.
    Times(Vec<NaiveTime>),
}

impl MonitorPlan {
    /// Builds the plan; explicit `monitor_times` take precedence over the interval.
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.monitor_times.is_empty() {
            let times = config
                .monitor_times
                .iter()
                .map(|t| {
                    NaiveTime::parse_from_str(t.trim(), "%H:%M")
                        .with_context(|| format!("Invalid monitor time '{}', expected HH:MM", t))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::times(times));
        }

        Self::interval(config.monitor_interval_hours)
    }

    pub fn interval(hours: u32) -> Result<Self> {
        if !(1..=24).contains(&hours) {
            bail!("Monitor interval must be between 1 and 24 hours, got {}", hours);
        }
        Ok(Self::Interval { hours })
    }

    pub fn times(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Self::Times(times)
    }

    /// Clock times at which the monitor fires each day.
    pub fn daily_times(&self) -> Vec<NaiveTime> {
        match self {
            MonitorPlan::Interval { hours } => (0..24)
                .step_by(*hours as usize)
                .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
                .collect(),
            MonitorPlan::Times(times) => times.clone(),
        }
    }

    /// First fire time strictly after `now`. Local times that do not exist
    /// (DST gaps) are skipped; ambiguous ones resolve to the earlier instant.
    pub fn next_after(&self, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let times = self.daily_times();
        let today = now.date_naive();

        (0..=2)
            .filter_map(|days| today.checked_add_signed(ChronoDuration::days(days)))
            .flat_map(|date| times.iter().map(move |t| date.and_time(*t)))
            .filter_map(|local| resolve(&tz, local))
            .find(|at| *at > now)
    }
}

/// Next top of the hour in local time, strictly after `now`. Both
/// occurrences of a repeated hour (DST fall-back) count as fires.
pub fn next_hour_after(now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let hour = now.naive_local().with_minute(0)?.with_second(0)?.with_nanosecond(0)?;

    (0..=3)
        .map(|h| hour + ChronoDuration::hours(h))
        .flat_map(|local| {
            let mapped = tz.from_local_datetime(&local);
            [mapped.earliest(), mapped.latest()]
        })
        .flatten()
        .filter(|at| *at > now)
        .min()
}

fn resolve(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local).earliest()
}

/// Which cycles are due on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub monitor: bool,
    pub health: bool,
}

/// Fire-time bookkeeping, independent of the clock source.
#[derive(Debug, Clone)]
pub struct Schedule {
    plan: MonitorPlan,
    next_monitor: DateTime<Tz>,
    next_health: DateTime<Tz>,
}

impl Schedule {
    /// Starts a schedule whose first fires come strictly after `now`.
    pub fn new(plan: MonitorPlan, now: DateTime<Tz>) -> Result<Self> {
        let next_monitor =
            plan.next_after(now).ok_or_else(|| anyhow!("Monitor plan has no fire times"))?;
        let next_health =
            next_hour_after(now).ok_or_else(|| anyhow!("Could not compute next health check"))?;
        Ok(Self { plan, next_monitor, next_health })
    }

    pub fn next_monitor(&self) -> DateTime<Tz> {
        self.next_monitor
    }

    pub fn next_health(&self) -> DateTime<Tz> {
        self.next_health
    }

    /// Reports which cycles are due at `now` and advances past every fire
    /// time up to `now`, so fires missed while a cycle was running are
    /// dropped rather than queued.
    pub fn poll(&mut self, now: DateTime<Tz>) -> Due {
        let mut due = Due::default();

        if now >= self.next_monitor {
            due.monitor = true;
            let skipped = count_skipped(self.next_monitor, now, |t| self.plan.next_after(t));
            if skipped > 0 {
                warn!("Skipping {} missed monitor fire(s)", skipped);
            }
            if let Some(next) = self.plan.next_after(now) {
                self.next_monitor = next;
            }
        }

        if now >= self.next_health {
            due.health = true;
            let skipped = count_skipped(self.next_health, now, next_hour_after);
            if skipped > 0 {
                warn!("Skipping {} missed health check(s)", skipped);
            }
            if let Some(next) = next_hour_after(now) {
                self.next_health = next;
            }
        }

        due
    }
}

/// Fire times after `from` and up to `now`, excluding `from` itself.
fn count_skipped(
    from: DateTime<Tz>,
    now: DateTime<Tz>,
    next: impl Fn(DateTime<Tz>) -> Option<DateTime<Tz>>,
) -> usize {
    let mut count = 0;
    let mut at = from;
    while let Some(following) = next(at) {
        if following > now || count >= 1000 {
            break;
        }
        count += 1;
        at = following;
    }
    count
}

/// Creates a stop signal for [`Scheduler::run`]. Send `true` (or drop the
/// sender) to stop the loop after the current cycle.
pub fn stop_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Drives the monitor and health check cycles forever.
pub struct Scheduler {
    monitor: Monitor,
    health: HealthCheck,
    sink: NotificationSink,
    plan: MonitorPlan,
    tz: Tz,
    tick: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(
        monitor: Monitor,
        health: HealthCheck,
        sink: NotificationSink,
        plan: MonitorPlan,
        tz: Tz,
    ) -> Self {
        Self { monitor, health, sink, plan, tz, tick: DEFAULT_TICK, run_on_start: false }
    }

    /// Sets the sleep between clock checks.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Runs one monitor and one health check before entering the loop.
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Runs one monitor cycle followed by one health check cycle.
    pub async fn run_once(&mut self) {
        self.monitor.run_cycle(&self.sink).await;
        self.health.run_cycle(&self.sink).await;
    }

    /// Runs until the stop signal fires. Cycles never end the loop; only the
    /// stop signal does.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<()> {
        let mut schedule = Schedule::new(self.plan.clone(), self.now())?;

        info!(
            "Scheduler started ({}): monitor at {}, next monitor {}, next health check {}",
            self.tz,
            self.plan
                .daily_times()
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect::<Vec<_>>()
                .join("/"),
            schedule.next_monitor().format("%Y-%m-%d %H:%M"),
            schedule.next_health().format("%Y-%m-%d %H:%M"),
        );

        if self.run_on_start {
            self.run_once().await;
        }

        loop {
            if *stop.borrow() {
                break;
            }

            let due = schedule.poll(self.now());
            if due.monitor {
                self.monitor.run_cycle(&self.sink).await;
                debug!("Next monitor cycle at {}", schedule.next_monitor());
            }
            if due.health {
                self.health.run_cycle(&self.sink).await;
                debug!("Next health check at {}", schedule.next_health());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }
}
