use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tec_model::{FileKind, MeshSummary};

use crate::config::BatchConfig;
use crate::convert::{collect_dat_files, convert_file, output_path_for};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: FileKind,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MeshSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Convert every matching file under `root`.
///
/// Only discovery failures abort the batch. A file that fails to read,
/// parse or write is recorded as [`FileStatus::Failed`] and the rest carry
/// on. Outcomes are always in sorted input order.
pub fn convert_batch(root: &Path, config: &BatchConfig) -> Result<BatchReport> {
    let output_dir = config.resolved_output_dir(root);
    let files = collect_dat_files(root, &config.suffix, Some(output_dir.as_path()))?;

    let jobs = plan_outputs(&files, &output_dir, &config.suffix);
    let outcomes: Vec<FileOutcome> = if config.parallel {
        jobs.par_iter().map(convert_one).collect()
    } else {
        jobs.iter().map(convert_one).collect()
    };

    let succeeded = outcomes
        .iter()
        .filter(|outcome| outcome.status == FileStatus::Success)
        .count();
    let failed = outcomes.len() - succeeded;

    Ok(BatchReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        root: root.to_path_buf(),
        output_dir,
        succeeded,
        failed,
        outcomes,
    })
}

struct Job<'a> {
    input: &'a Path,
    output: PathBuf,
    /// Earlier input (in sorted order) that already claimed `output`.
    claimed_by: Option<&'a Path>,
}

/// Map every input to its output path. The output directory is flat, so two
/// inputs with the same file name collide; the first one in sorted order
/// keeps the output and the rest are failed without being converted.
fn plan_outputs<'a>(files: &'a [PathBuf], output_dir: &Path, suffix: &str) -> Vec<Job<'a>> {
    let mut owners: HashMap<PathBuf, &'a Path> = HashMap::new();
    files
        .iter()
        .map(|input| {
            let output = output_path_for(input, output_dir, suffix);
            let claimed_by = match owners.entry(output.clone()) {
                Entry::Occupied(owner) => Some(*owner.get()),
                Entry::Vacant(slot) => {
                    slot.insert(input.as_path());
                    None
                }
            };
            Job {
                input: input.as_path(),
                output,
                claimed_by,
            }
        })
        .collect()
}

fn convert_one(job: &Job<'_>) -> FileOutcome {
    let result = match job.claimed_by {
        Some(owner) => Err(format!(
            "output {} already written for {}",
            job.output.display(),
            owner.display()
        )),
        None => convert_file(job.input, &job.output).map_err(|err| err.to_string()),
    };

    let (status, summary, error) = match result {
        Ok(summary) => (FileStatus::Success, Some(summary), None),
        Err(err) => (FileStatus::Failed, None, Some(err)),
    };
    FileOutcome {
        input: job.input.to_path_buf(),
        output: job.output.clone(),
        kind: FileKind::from_path(job.input),
        status,
        summary,
        error,
    }
}

pub fn save_report(path: impl AsRef<Path>, report: &BatchReport) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(report)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tec_dat::ElementKind;

    #[test]
    fn report_roundtrip_preserves_outcomes() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let path = dir.path().join("reports/batch.json");
        let report = BatchReport {
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            root: PathBuf::from("/runs"),
            output_dir: PathBuf::from("/runs/vtk_output"),
            succeeded: 1,
            failed: 1,
            outcomes: vec![
                FileOutcome {
                    input: PathBuf::from("/runs/wing_surface_nf.dat"),
                    output: PathBuf::from("/runs/vtk_output/wing_surface_nf.vtk"),
                    kind: FileKind::Surface,
                    status: FileStatus::Success,
                    summary: Some(MeshSummary {
                        num_nodes: 4,
                        num_elements: 2,
                        element_kind: ElementKind::Triangle,
                        point_fields: 1,
                        cell_fields: 2,
                        connectivity_len: 6,
                    }),
                    error: None,
                },
                FileOutcome {
                    input: PathBuf::from("/runs/station_nf.dat"),
                    output: PathBuf::from("/runs/vtk_output/station_nf.vtk"),
                    kind: FileKind::Other,
                    status: FileStatus::Failed,
                    summary: None,
                    error: Some("format error: missing variables".to_string()),
                },
            ],
        };

        save_report(&path, &report).expect("save should succeed");
        let text = fs::read_to_string(&path).expect("report should be readable");
        assert!(text.contains("\"status\": \"FAILED\""));
        assert!(text.contains("\"kind\": \"surface\""));

        let loaded: BatchReport = serde_json::from_str(&text).expect("report should decode");
        assert_eq!(loaded, report);
        assert_eq!(loaded.total(), 2);
        assert!(!loaded.is_clean());
    }

    #[test]
    fn same_name_in_two_cases_fails_the_later_one() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let root = dir.path();
        let zone = "VARIABLES = X,Y,Z\nZONE N=2, E=1, ZONETYPE=FELINESEG\n0 1\n0 0\n0 0\n1 2\n";
        for case in ["case_a", "case_b"] {
            fs::create_dir_all(root.join(case)).expect("mkdir");
            fs::write(root.join(case).join("cut_line_nf.dat"), zone).expect("write input");
        }

        for parallel in [false, true] {
            let config = BatchConfig {
                parallel,
                ..BatchConfig::default()
            };
            let report = convert_batch(root, &config).expect("batch should run");
            assert_eq!(report.total(), 2);
            assert_eq!(report.succeeded, 1);
            assert_eq!(report.failed, 1);

            let first = &report.outcomes[0];
            let second = &report.outcomes[1];
            assert_eq!(first.input, root.join("case_a/cut_line_nf.dat"));
            assert_eq!(first.status, FileStatus::Success);
            assert_eq!(second.status, FileStatus::Failed);
            assert_eq!(second.output, first.output);
            let error = second.error.as_deref().unwrap_or_default();
            assert!(error.contains("already written"), "{error}");
        }
    }
}
