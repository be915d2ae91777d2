//! Corpus walking and dispatch
//!
//! Every directory that directly contains files is a test group. Groups are visited depth-first
//! in lexicographic order, files within a group likewise. Linked directories are not followed.
//! A sequential run reports each scenario the moment it is classified.
//!
//! With more than one job, files run on a rayon pool and each produces a [`FileRun`]: the
//! outcomes plus that file's partial [`RunSummary`]. Runs are collected in traversal order and
//! replayed to the reporter one file at a time, and the partial summaries are summed in a single
//! reduction, so the report and the counters match a sequential run.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::classify::{Classifier, Outcome};
use super::error::HarnessError;
use super::report::{ScenarioReport, TestReporter};
use super::summary::RunSummary;
use super::toolchain::{Compile, Execute};
use crate::meta::{MetadataSource, TestCase, normalize_key};

/// A directory and the files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Everything one corpus file produced.
#[derive(Debug, Clone)]
pub struct FileRun<'a> {
    pub path: PathBuf,
    pub key: String,
    /// `None` when the file has no metadata entry
    pub case: Option<&'a TestCase>,
    pub outcomes: Vec<Outcome>,
    pub summary: RunSummary,
}

/// Walk the corpus under `root` and collect its test groups.
///
/// Hidden entries (leading `.`) are skipped. An unreadable subdirectory is logged and skipped;
/// an unreadable root is an error.
pub fn discover_groups(root: &Path) -> Result<Vec<TestGroup>, HarnessError> {
    if !root.is_dir() {
        return Err(HarnessError::CorpusNotFound(root.to_path_buf()));
    }
    let mut groups = Vec::new();
    let (files, dirs) = list_dir(root).map_err(|source| HarnessError::ReadDir {
        path: root.to_path_buf(),
        source,
    })?;
    collect_groups(root, files, dirs, &mut groups);
    Ok(groups)
}

fn collect_groups(dir: &Path, files: Vec<PathBuf>, dirs: Vec<PathBuf>, groups: &mut Vec<TestGroup>) {
    if !files.is_empty() {
        groups.push(TestGroup {
            dir: dir.to_path_buf(),
            files,
        });
    }
    for sub in dirs {
        match list_dir(&sub) {
            Ok((files, dirs)) => collect_groups(&sub, files, dirs, groups),
            Err(e) => tracing::warn!(dir = %sub.display(), error = %e, "skipping unreadable directory"),
        }
    }
}

/// Sorted (files, subdirectories) of `dir`.
fn list_dir(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden {
            continue;
        }
        // `DirEntry::file_type` does not follow links, so a linked directory is never descended.
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!(link = %path.display(), "skipping linked directory");
        } else {
            files.push(path);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// Walks a corpus and classifies every scenario of every file.
pub struct Dispatcher<S, C, E> {
    source: S,
    classifier: Classifier<C, E>,
    jobs: usize,
}

impl<S, C, E> Dispatcher<S, C, E>
where
    S: MetadataSource,
    C: Compile,
    E: Execute,
{
    pub fn new(source: S, classifier: Classifier<C, E>) -> Self {
        Self {
            source,
            classifier,
            jobs: 1,
        }
    }

    /// Number of files processed concurrently. Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Run the whole corpus under `root`, reporting as it goes, and return the final counters.
    #[tracing::instrument(skip_all, fields(root = %root.display(), jobs = self.jobs))]
    pub fn run(&self, root: &Path, reporter: &mut dyn TestReporter) -> Result<RunSummary, HarnessError> {
        let groups = discover_groups(root)?;
        tracing::info!(
            groups = groups.len(),
            files = groups.iter().map(|g| g.files.len()).sum::<usize>(),
            "discovered corpus"
        );

        let summary = if self.jobs > 1 {
            self.run_parallel(root, &groups, reporter)
        } else {
            self.run_sequential(root, &groups, reporter)
        };

        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    fn run_sequential(&self, root: &Path, groups: &[TestGroup], reporter: &mut dyn TestReporter) -> RunSummary {
        let mut summary = RunSummary::new();
        for group in groups {
            reporter.on_group_start(&group.dir);
            for file in &group.files {
                summary = summary.merge(self.stream_file(root, file, reporter));
            }
        }
        summary
    }

    fn run_parallel(&self, root: &Path, groups: &[TestGroup], reporter: &mut dyn TestReporter) -> RunSummary {
        let collect = || {
            groups
                .par_iter()
                .map(|group| {
                    group
                        .files
                        .par_iter()
                        .map(|file| self.run_file(root, file))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        };

        let runs = match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(collect),
            Err(e) => {
                tracing::warn!("failed to create thread pool ({e}), running sequentially");
                return self.run_sequential(root, groups, reporter);
            }
        };

        for (group, group_runs) in groups.iter().zip(&runs) {
            reporter.on_group_start(&group.dir);
            for run in group_runs {
                report_file(reporter, run);
            }
        }

        runs.iter().flatten().map(|run| run.summary).collect()
    }

    /// Classify one file, reporting each scenario as soon as it finishes.
    fn stream_file(&self, root: &Path, path: &Path, reporter: &mut dyn TestReporter) -> RunSummary {
        let key = corpus_key(root, path);
        let mut summary = RunSummary::new();

        let case = match self.source.lookup(&key).and_then(|case| case.validate().map(|_| case)) {
            Ok(case) => case,
            Err(err) => {
                tracing::debug!(%key, %err, "metadata unusable");
                let outcome = Outcome::from(err);
                summary.record(&outcome);
                report_outcome(reporter, path, None, 0, &outcome);
                return summary;
            }
        };

        for index in 0..case.input.len() {
            let outcome = self.classifier.classify(path, case, index);
            summary.record(&outcome);
            report_outcome(reporter, path, Some(case), index, &outcome);
        }
        summary
    }

    /// Resolve metadata for one file and classify all of its scenarios.
    pub fn run_file(&self, root: &Path, path: &Path) -> FileRun<'_> {
        let key = corpus_key(root, path);

        let (case, outcomes) = match self.source.lookup(&key) {
            Ok(case) => (Some(case), self.classifier.classify_case(path, case)),
            Err(err) => {
                tracing::debug!(%key, %err, "metadata lookup failed");
                (None, vec![Outcome::from(err)])
            }
        };

        let mut summary = RunSummary::new();
        for outcome in &outcomes {
            summary.record(outcome);
        }

        FileRun {
            path: path.to_path_buf(),
            key,
            case,
            outcomes,
            summary,
        }
    }
}

fn corpus_key(root: &Path, path: &Path) -> String {
    normalize_key(root, path).unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"))
}

/// Replay one file's results to the reporter.
pub fn report_file(reporter: &mut dyn TestReporter, run: &FileRun<'_>) {
    for (index, outcome) in run.outcomes.iter().enumerate() {
        report_outcome(reporter, &run.path, run.case, index, outcome);
    }
}

fn report_outcome(
    reporter: &mut dyn TestReporter,
    path: &Path,
    case: Option<&TestCase>,
    index: usize,
    outcome: &Outcome,
) {
    match outcome {
        Outcome::MissingMetadata => reporter.on_missing_meta(path),
        Outcome::MalformedMetadata { inputs, outputs } => reporter.on_malformed_meta(path, *inputs, *outputs),
        _ => {
            let Some(case) = case else { return };
            let expected = case.output.get(index).map(Vec::as_slice).unwrap_or_default();
            reporter.on_scenario_complete(&ScenarioReport {
                path,
                title: &case.title,
                index,
                expected,
                outcome,
            });
        }
    }
}
