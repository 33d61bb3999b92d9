//! The JSON record a sweep leaves behind in its output root.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use crate::job::SweepJobRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepManifest {
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub backend: String,
    pub num_jobs: usize,
    pub success: usize,
    pub failure: usize,
    /// Jobs per record status, e.g. `{"ok": 3, "infeasible": 1}`.
    #[serde(default)]
    pub status_counts: BTreeMap<String, usize>,
    pub jobs: Vec<SweepJobRecord>,
}

impl SweepManifest {
    /// Tally `jobs` into a manifest stamped with the current time.
    pub fn from_records(
        name: impl Into<String>,
        backend: impl Into<String>,
        jobs: Vec<SweepJobRecord>,
    ) -> Self {
        let mut status_counts = BTreeMap::new();
        for job in &jobs {
            *status_counts.entry(job.status.clone()).or_insert(0) += 1;
        }
        let success = jobs.iter().filter(|job| job.is_ok()).count();
        Self {
            created_at: Utc::now(),
            name: name.into(),
            backend: backend.into(),
            num_jobs: jobs.len(),
            success,
            failure: jobs.len() - success,
            status_counts,
            jobs,
        }
    }

    pub fn job(&self, scenario_id: &str) -> Option<&SweepJobRecord> {
        self.jobs.iter().find(|job| job.scenario_id == scenario_id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SweepJobRecord> {
        self.jobs.iter().filter(|job| !job.is_ok())
    }

    /// Solved scenario with the lowest objective.
    pub fn cheapest(&self) -> Option<&SweepJobRecord> {
        self.jobs
            .iter()
            .filter(|job| job.is_ok())
            .filter_map(|job| job.objective.map(|objective| (objective, job)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, job)| job)
    }

    /// Counts must agree with the job list they summarize.
    fn check_counts(&self) -> Result<()> {
        if self.num_jobs != self.jobs.len() {
            bail!(
                "manifest lists {} jobs but num_jobs is {}",
                self.jobs.len(),
                self.num_jobs
            );
        }
        let success = self.jobs.iter().filter(|job| job.is_ok()).count();
        if self.success != success || self.failure != self.num_jobs - success {
            bail!(
                "manifest counts {} ok / {} failed but its jobs hold {} ok / {} failed",
                self.success,
                self.failure,
                success,
                self.num_jobs - success
            );
        }
        Ok(())
    }
}

/// Write through a sibling temp file and rename, so readers never see a
/// half-written manifest.
pub fn write_sweep_manifest(path: &Path, manifest: &SweepManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(manifest).context("serializing sweep manifest to JSON")?;
    let staging = path.with_extension("json.partial");
    fs::write(&staging, json)
        .with_context(|| format!("writing sweep manifest '{}'", staging.display()))?;
    fs::rename(&staging, path).with_context(|| {
        format!(
            "moving sweep manifest into place: {} -> {}",
            staging.display(),
            path.display()
        )
    })?;
    Ok(())
}

pub fn load_sweep_manifest(path: &Path) -> Result<SweepManifest> {
    let file = File::open(path)
        .with_context(|| format!("opening sweep manifest '{}'", path.display()))?;
    let manifest: SweepManifest = serde_json::from_reader(file)
        .with_context(|| format!("parsing sweep manifest '{}'", path.display()))?;
    manifest
        .check_counts()
        .with_context(|| format!("in sweep manifest '{}'", path.display()))?;
    Ok(manifest)
}
