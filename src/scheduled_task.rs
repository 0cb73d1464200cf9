use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mongodb::Database;
use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio::{
        self,
        sync::Notify,
        task::JoinHandle,
        time::Duration,
    },
    Build, Rocket,
};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    db::{
        access_code::{rotate_global, NewAccessCode},
        daily_assignment::{day_key, ensure_auto, NewDailyAssignment},
        question::Question,
    },
    mongodb::Coll,
};

/// A background task that runs its body immediately on spawn and then again
/// at every point chosen by `next_run`. The body must be idempotent: restarts
/// and early triggers re-run it against the same store state.
pub struct PeriodicTask {
    handle: JoinHandle<()>,
    signal: Arc<Notify>,
}

impl PeriodicTask {
    /// Spawn the task. `next_run` maps the current time to the next scheduled
    /// run; a result in the past reruns the body immediately.
    pub fn spawn<N, F, Fut>(name: &'static str, next_run: N, body: F) -> Self
    where
        N: Fn(DateTime<Utc>) -> DateTime<Utc> + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send,
    {
        let signal = Arc::new(Notify::new());
        let task_signal = signal.clone();
        let handle = tokio::spawn(async move {
            loop {
                if let Err(err) = body().await {
                    error!("Periodic task '{name}' failed: {err}");
                }
                let pause = duration_until(next_run(Utc::now()));
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = task_signal.notified() => {
                        info!("Periodic task '{name}' triggered early");
                    }
                }
            }
        });
        Self { handle, signal }
    }

    /// Run the body now instead of waiting for the next scheduled point.
    /// The schedule continues from the early run.
    pub fn trigger_now(&self) {
        self.signal.notify_one();
    }

    /// Stop the task permanently.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Convert a `DateTime` into a duration from the current instant.
/// A `DateTime` in the past will produce a duration of zero.
fn duration_until(datetime: DateTime<Utc>) -> Duration {
    let target_timestamp = datetime.timestamp_millis();
    let now_timestamp = Utc::now().timestamp_millis();
    let time_diff = u64::try_from(target_timestamp - now_timestamp).unwrap_or(0);
    Duration::from_millis(time_diff)
}

/// The two long-lived timers of the service, held in managed state so they
/// live as long as the server.
pub struct Scheduler {
    pub rotation: PeriodicTask,
    pub daily: PeriodicTask,
}

/// A fairing that spawns the global-code rotation timer and the
/// daily-assignment timer. Both bodies also run once at startup, covering
/// restarts after a rotation boundary or local midnight.
pub struct SchedulerFairing;

#[rocket::async_trait]
impl Fairing for SchedulerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Scheduler",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(db) = rocket.state::<Database>().cloned() else {
            error!("Scheduler requires the database fairing to run first");
            return Err(rocket);
        };
        let Some(config) = rocket.state::<Config>() else {
            error!("Scheduler requires the config fairing to run first");
            return Err(rocket);
        };
        let code_ttl = config.code_ttl();
        let pool_size = config.daily_pool_size();

        let codes = Coll::<NewAccessCode>::from_db(&db);
        let rotation = PeriodicTask::spawn(
            "code-rotation",
            move |now| now + code_ttl,
            move || {
                let codes = codes.clone();
                async move {
                    let code = rotate_global(&codes, code_ttl).await?;
                    info!("Rotated global access code: {}", code.code);
                    Ok(())
                }
            },
        );

        let assignments = Coll::<NewDailyAssignment>::from_db(&db);
        let questions = Coll::<Question>::from_db(&db);
        let daily = PeriodicTask::spawn(
            "daily-assignment",
            |now| day_key(now) + ChronoDuration::days(1),
            move || {
                let assignments = assignments.clone();
                let questions = questions.clone();
                async move {
                    if let Some(assignment) =
                        ensure_auto(&assignments, &questions, pool_size).await?
                    {
                        info!(
                            "Created auto daily assignment with {} questions",
                            assignment.question_ids.len()
                        );
                    }
                    Ok(())
                }
            },
        );

        Ok(rocket.manage(Scheduler { rotation, daily }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rocket::async_test]
    async fn periodic_task_runs_triggers_and_cancels() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        // Schedule far in the future so only the initial run and explicit
        // triggers ever fire.
        let task = PeriodicTask::spawn(
            "test-task",
            |now| now + ChronoDuration::hours(1),
            || async {
                RUNS.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        // The body runs once immediately on spawn.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);

        // An early trigger runs it again.
        task.trigger_now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(RUNS.load(Ordering::SeqCst), 2);

        // After cancellation, triggers do nothing.
        task.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(RUNS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn past_datetimes_clamp_to_zero() {
        let past = Utc::now() - ChronoDuration::hours(1);
        assert_eq!(duration_until(past), Duration::ZERO);
    }
}
