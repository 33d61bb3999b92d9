//! Timeout- and cancellation-bounded solving.
//!
//! Solver calls are synchronous and CPU bound. [`solve_bounded`] runs the call
//! through `spawn_blocking` on a current-thread tokio runtime and races it
//! against `tokio::time::timeout` and the caller's [`CancellationToken`]. The
//! timeout is also handed to the backend as its own time limit so solvers that
//! support one stop by themselves; the runtime is shut down in the background,
//! so a worker that ignores the limit never blocks the caller.

use std::future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Builder;
use tokio::task::JoinError;
pub use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::SolveBackend;
use crate::error::SolverError;
use crate::problem::LpProblem;
use crate::solution::{LpSolution, SolutionStatus};

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock limit; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl SolveOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.cancel.is_none()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

enum Race {
    Finished(Result<Result<LpSolution, SolverError>, JoinError>),
    TimedOut,
    Cancelled,
}

fn elapsed_ms(start: Instant) -> i64 {
    start.elapsed().as_millis() as i64
}

fn cancelled(start: Instant) -> LpSolution {
    LpSolution::terminated(SolutionStatus::Cancelled, "cancelled by caller", elapsed_ms(start))
}

/// Solve `problem` with `backend`, honouring the timeout and cancellation
/// token in `options`.
///
/// Without a timeout or token the backend runs on the calling thread. Blocks
/// the calling thread, so it must not be called from inside an async task.
pub fn solve_bounded(
    backend: Arc<dyn SolveBackend>,
    problem: Arc<LpProblem>,
    options: &SolveOptions,
) -> Result<LpSolution, SolverError> {
    let start = Instant::now();
    if options.is_unbounded() {
        return backend.solve(&problem);
    }
    let backend_id = backend.id().to_string();
    if options.is_cancelled() {
        warn!(backend = %backend_id, "solve cancelled before start");
        return Ok(cancelled(start));
    }

    let runtime = Builder::new_current_thread()
        .enable_time()
        .thread_name(format!("cep-solve-{}", backend_id))
        .build()?;
    let time_limit = options.timeout;
    let worker = runtime.spawn_blocking(move || backend.solve_within(&problem, time_limit));
    debug!(backend = %backend_id, timeout = ?time_limit, "solve worker started");

    let race = runtime.block_on(async {
        let finished = async {
            match time_limit {
                Some(limit) => tokio::time::timeout(limit, worker).await.ok(),
                None => Some(worker.await),
            }
        };
        let cancel = async {
            match &options.cancel {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel => Race::Cancelled,
            joined = finished => match joined {
                Some(joined) => Race::Finished(joined),
                None => Race::TimedOut,
            },
        }
    });
    runtime.shutdown_background();

    match race {
        Race::Finished(Ok(result)) => result,
        Race::Finished(Err(err)) => {
            warn!(backend = %backend_id, error = %err, "solve worker did not finish");
            Err(SolverError::WorkerPanicked(backend_id))
        }
        Race::TimedOut => {
            let limit = time_limit.unwrap_or_default();
            warn!(backend = %backend_id, limit_ms = limit.as_millis() as u64, "solve timed out");
            Ok(LpSolution::terminated(
                SolutionStatus::Timeout,
                format!("no result after {:.3}s", limit.as_secs_f64()),
                elapsed_ms(start),
            ))
        }
        Race::Cancelled => {
            warn!(backend = %backend_id, "solve cancelled by caller");
            Ok(cancelled(start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemType;
    use std::sync::Mutex;
    use std::thread;

    struct SleepyBackend {
        delay: Duration,
    }

    impl SolveBackend for SleepyBackend {
        fn id(&self) -> &str {
            "sleepy"
        }

        fn supports(&self, _problem_type: ProblemType) -> bool {
            true
        }

        fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
            thread::sleep(self.delay);
            Ok(LpSolution::optimal(0.0, vec![0.0; problem.num_variables()], 0))
        }
    }

    /// Stops at its own limit, like an interior-point solver with `time_limit`.
    #[derive(Default)]
    struct LimitedBackend {
        seen: Mutex<Option<Duration>>,
    }

    impl SolveBackend for LimitedBackend {
        fn id(&self) -> &str {
            "limited"
        }

        fn supports(&self, _problem_type: ProblemType) -> bool {
            true
        }

        fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
            self.solve_within(problem, None)
        }

        fn solve_within(
            &self,
            _problem: &LpProblem,
            time_limit: Option<Duration>,
        ) -> Result<LpSolution, SolverError> {
            *self.seen.lock().unwrap() = time_limit;
            Ok(LpSolution::terminated(SolutionStatus::Timeout, "solver time limit", 0))
        }
    }

    struct PanickingBackend;

    impl SolveBackend for PanickingBackend {
        fn id(&self) -> &str {
            "panicky"
        }

        fn supports(&self, _problem_type: ProblemType) -> bool {
            true
        }

        fn solve(&self, _problem: &LpProblem) -> Result<LpSolution, SolverError> {
            panic!("backend exploded")
        }
    }

    fn problem() -> Arc<LpProblem> {
        Arc::new(LpProblem::new("empty"))
    }

    #[test]
    fn fast_backend_finishes_within_timeout() {
        let backend = Arc::new(SleepyBackend {
            delay: Duration::from_millis(1),
        });
        let options = SolveOptions::default().with_timeout(Duration::from_secs(10));
        let solution = solve_bounded(backend, problem(), &options).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
    }

    #[test]
    fn slow_backend_times_out() {
        let backend = Arc::new(SleepyBackend {
            delay: Duration::from_secs(5),
        });
        let options = SolveOptions::default().with_timeout(Duration::from_millis(50));
        let start = Instant::now();
        let solution = solve_bounded(backend, problem(), &options).unwrap();
        assert_eq!(solution.status, SolutionStatus::Timeout);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn timeout_reaches_the_backend_as_its_own_limit() {
        let backend = Arc::new(LimitedBackend::default());
        let options = SolveOptions::default().with_timeout(Duration::from_secs(30));
        let solution = solve_bounded(backend.clone(), problem(), &options).unwrap();
        assert_eq!(solution.status, SolutionStatus::Timeout);
        assert_eq!(solution.message.as_deref(), Some("solver time limit"));
        assert_eq!(*backend.seen.lock().unwrap(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn cancelled_token_stops_waiting() {
        let backend = Arc::new(SleepyBackend {
            delay: Duration::from_secs(5),
        });
        let token = CancellationToken::new();
        token.cancel();
        let options = SolveOptions::default().with_cancellation(token);
        let solution = solve_bounded(backend, problem(), &options).unwrap();
        assert_eq!(solution.status, SolutionStatus::Cancelled);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn cancelling_mid_solve_returns_promptly() {
        let backend = Arc::new(SleepyBackend {
            delay: Duration::from_secs(5),
        });
        let token = CancellationToken::new();
        let options = SolveOptions::default().with_cancellation(token.clone());
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });
        let start = Instant::now();
        let solution = solve_bounded(backend, problem(), &options).unwrap();
        canceller.join().unwrap();
        assert_eq!(solution.status, SolutionStatus::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn panicking_worker_is_reported() {
        let options = SolveOptions::default().with_timeout(Duration::from_secs(10));
        let err = solve_bounded(Arc::new(PanickingBackend), problem(), &options).unwrap_err();
        assert!(matches!(err, SolverError::WorkerPanicked(ref id) if id == "panicky"));
    }
}
