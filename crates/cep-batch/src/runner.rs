use crate::job::{jobs_from_spec, SweepJob, SweepJobRecord};
use crate::manifest::{write_sweep_manifest, SweepManifest};
use crate::spec::SweepSpec;
use anyhow::{Context, Result};
use cep_algo::{run_opt, OptResult};
use cep_core::{CepError, ClusteredTimeSeries, InputData, SolveFailure};
use cep_solver_common::{CancellationToken, SolveOptions};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

pub struct SweepRunnerConfig {
    pub spec: SweepSpec,
    pub output_root: PathBuf,
    /// Also write every solved result to `<output_root>/<scenario>/result.json`.
    pub write_results: bool,
    /// Abandons running and pending solves when triggered.
    pub cancel: Option<CancellationToken>,
}

impl SweepRunnerConfig {
    pub fn new(spec: SweepSpec, output_root: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            output_root: output_root.into(),
            write_results: false,
            cancel: None,
        }
    }
}

/// Outcome counts and the manifest location of a finished sweep.
pub struct SweepSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<SweepJobRecord>,
}

/// Solve every scenario of the sweep against the same input data.
///
/// Assembly and solve failures of a single scenario end up in its record;
/// only I/O on the output root and pool construction fail the sweep.
pub fn run_sweep(
    data: &InputData,
    ts: &ClusteredTimeSeries,
    config: &SweepRunnerConfig,
) -> Result<SweepSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating sweep output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.spec.threads == 0 {
        num_cpus::get()
    } else {
        config.spec.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for sweep runs")?;

    let mut options = config.spec.solve_options();
    if let Some(token) = &config.cancel {
        options = options.with_cancellation(token.clone());
    }

    let jobs = jobs_from_spec(&config.spec);
    info!(
        sweep = %config.spec.name,
        jobs = jobs.len(),
        threads = thread_count,
        backend = %config.spec.backend,
        "starting sweep"
    );

    // par_iter keeps declaration order in the collected records
    let job_records: Vec<SweepJobRecord> = pool.install(|| {
        jobs.par_iter()
            .map(|job| run_job(job, data, ts, config, &options))
            .collect()
    });

    let manifest = SweepManifest::from_records(
        config.spec.name.clone(),
        config.spec.backend.to_string(),
        job_records,
    );
    let manifest_path = config.output_root.join("sweep_manifest.json");
    write_sweep_manifest(&manifest_path, &manifest)?;
    info!(
        sweep = %config.spec.name,
        success = manifest.success,
        failure = manifest.failure,
        statuses = ?manifest.status_counts,
        "sweep finished"
    );

    Ok(SweepSummary {
        success: manifest.success,
        failure: manifest.failure,
        manifest_path,
        jobs: manifest.jobs,
    })
}

fn run_job(
    job: &SweepJob,
    data: &InputData,
    ts: &ClusteredTimeSeries,
    config: &SweepRunnerConfig,
    options: &SolveOptions,
) -> SweepJobRecord {
    let started = Instant::now();
    let mut record = SweepJobRecord {
        job_id: job.job_id.clone(),
        scenario_id: job.scenario_id.clone(),
        descriptor: job.config.descriptor.clone(),
        status: "ok".to_string(),
        objective: None,
        diagnostic: None,
        error: None,
        solve_time_ms: None,
        elapsed_ms: 0,
        output: None,
    };

    match run_opt(data, ts, &job.config, config.spec.backend.backend(), options) {
        Ok(result) => {
            record.objective = Some(result.objective);
            record.solve_time_ms = Some(result.solve_time_ms);
            if config.write_results {
                let path = config
                    .output_root
                    .join(&job.scenario_id)
                    .join("result.json");
                match write_result(&result, &path) {
                    Ok(()) => record.output = Some(path.display().to_string()),
                    Err(err) => {
                        warn!(job = %job.job_id, "writing result failed: {err:#}");
                        record.status = "error".to_string();
                        record.error = Some(format!("{err:#}"));
                    }
                }
            }
        }
        Err(CepError::SolveFailed { status, diagnostic }) => {
            warn!(job = %job.job_id, %status, "sweep job did not solve");
            record.status = failure_label(&status).to_string();
            record.error = Some(status.to_string());
            record.diagnostic = diagnostic;
        }
        Err(err) => {
            warn!(job = %job.job_id, "sweep job failed: {err}");
            record.status = "error".to_string();
            record.error = Some(err.to_string());
        }
    }

    record.elapsed_ms = started.elapsed().as_millis() as i64;
    info!(
        job = %record.job_id,
        status = %record.status,
        elapsed_ms = record.elapsed_ms,
        "sweep job finished"
    );
    record
}

fn failure_label(status: &SolveFailure) -> &'static str {
    match status {
        SolveFailure::Infeasible => "infeasible",
        SolveFailure::Unbounded => "unbounded",
        SolveFailure::Timeout => "timeout",
        SolveFailure::Cancelled => "cancelled",
        SolveFailure::SolverError(_) => "error",
    }
}

fn write_result(result: &OptResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating result directory '{}'", parent.display()))?;
    }
    result
        .to_json_file(path)
        .with_context(|| format!("writing result '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_labels_match_manifest_vocabulary() {
        assert_eq!(failure_label(&SolveFailure::Infeasible), "infeasible");
        assert_eq!(failure_label(&SolveFailure::Timeout), "timeout");
        assert_eq!(
            failure_label(&SolveFailure::SolverError("numerical trouble".into())),
            "error"
        );
    }
}
