use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{range_bounds, SchedulerConfig};
use crate::ticket_checker::{DateCheckResult, TicketChecker};
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub dates_checked: usize,
    pub dates_failed: usize,
    pub trains_seen: usize,
    pub notifications_sent: usize,
    pub elapsed_ms: u64,
}

/// Polls every target date concurrently, sleeps a random interval, repeats
/// until the shutdown token is cancelled.
pub struct PollScheduler {
    checker: Arc<TicketChecker>,
    dates: Vec<String>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
}

impl PollScheduler {
    pub fn new(
        checker: Arc<TicketChecker>,
        dates: Vec<String>,
        config: SchedulerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            checker,
            dates,
            config,
            shutdown,
        }
    }

    /// Uniformly drawn from `time_to_sleep_range`.
    pub fn next_sleep(&self) -> Duration {
        let (min, max) = range_bounds(&self.config.time_to_sleep_range).unwrap_or((0, 0));
        Duration::from_secs(rand::thread_rng().gen_range(min..=max))
    }

    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting scheduler for {} dates: {:?}", self.dates.len(), self.dates);

        let mut cycle = 0;
        loop {
            cycle += 1;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                report = self.run_cycle(cycle) => {
                    tracing::info!(
                        "Cycle {} finished in {}ms: {} dates checked, {} failed, {} trains, {} notifications",
                        report.cycle,
                        report.elapsed_ms,
                        report.dates_checked,
                        report.dates_failed,
                        report.trains_seen,
                        report.notifications_sent
                    );
                }
            }

            let sleep = self.next_sleep();
            tracing::info!("Sleeping for {} seconds before next iteration", sleep.as_secs());

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(sleep) => {}
            }
        }

        tracing::info!("Scheduler stopped after {} cycles", cycle);
        Ok(())
    }

    /// One task per date; waits for all of them. A task that times out or
    /// panics counts as a failed date and does not affect the others.
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let start_time = Instant::now();
        tracing::info!("Starting cycle {} over {} dates", cycle, self.dates.len());

        let task_timeout = Duration::from_secs(self.config.task_timeout_secs);
        let mut tasks = JoinSet::new();

        for date in &self.dates {
            let checker = Arc::clone(&self.checker);
            let date = date.clone();

            tasks.spawn(async move {
                match tokio::time::timeout(task_timeout, checker.check_date(&date)).await {
                    Ok(result) => result,
                    // Any blocking render of this date keeps running until it returns.
                    Err(_) => {
                        tracing::error!(
                            "Check for date {} timed out after {}s",
                            date,
                            task_timeout.as_secs()
                        );
                        DateCheckResult::failed(
                            &date,
                            format!("timed out after {}s", task_timeout.as_secs()),
                            task_timeout.as_millis() as u64,
                        )
                    }
                }
            });
        }

        let mut report = CycleReport {
            cycle,
            dates_checked: 0,
            dates_failed: 0,
            trains_seen: 0,
            notifications_sent: 0,
            elapsed_ms: 0,
        };

        while let Some(joined) = tasks.join_next().await {
            report.dates_checked += 1;
            match joined {
                Ok(result) => {
                    if !result.success {
                        report.dates_failed += 1;
                    }
                    report.trains_seen += result.trains.len();
                    report.notifications_sent += result.notifications_sent;
                }
                Err(e) => {
                    tracing::error!("Date check task aborted in cycle {}: {}", cycle, e);
                    report.dates_failed += 1;
                }
            }
        }

        report.elapsed_ms = start_time.elapsed().as_millis() as u64;
        report
    }
}
