//! Renders a [`TimelinePlan`] to one output file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::engine::{AudioEngine, AudioFormat, EngineError, EngineJob};
use crate::orchestrator::CancelHandle;

use super::manifest::write_manifest;
use super::plan::{Segment, TimelinePlan};

/// Name of the concat manifest inside the scratch directory.
pub const MANIFEST_NAME: &str = "concat_list.txt";

/// Errors from timeline assembly. All of them are fatal for the run.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The plan holds no clips.
    #[error("Timeline has no clips to assemble")]
    EmptyPlan,

    /// Writing the manifest or creating the output directory failed.
    #[error("Failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A silence or concat job failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AssemblyError {
    fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Files written while assembling.
#[derive(Debug, Clone)]
pub struct AssemblyOutput {
    pub output: PathBuf,
    pub manifest: PathBuf,
    pub silence_files: Vec<PathBuf>,
    pub segment_count: usize,
}

/// Synthesizes gap silences and concatenates all segments.
#[derive(Clone)]
pub struct TimelineAssembler {
    engine: Arc<dyn AudioEngine>,
    scratch_dir: PathBuf,
    format: AudioFormat,
}

impl TimelineAssembler {
    pub fn new(engine: Arc<dyn AudioEngine>, scratch_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            engine,
            scratch_dir: scratch_dir.into(),
            format,
        }
    }

    /// Silence file for the gap before the `position`-th clip.
    fn silence_path(&self, position: usize) -> PathBuf {
        self.scratch_dir
            .join(format!("silence_{:04}_before.wav", position))
    }

    /// Write `plan` to `output`.
    pub fn assemble(
        &self,
        plan: &TimelinePlan,
        output: &Path,
        cancel: &CancelHandle,
    ) -> Result<AssemblyOutput, AssemblyError> {
        if plan.clip_count() == 0 {
            return Err(AssemblyError::EmptyPlan);
        }

        let mut segment_files = Vec::with_capacity(plan.segments.len());
        let mut silence_files = Vec::new();
        let mut clip_position = 0;

        for segment in &plan.segments {
            match segment {
                Segment::Silence { duration_secs } => {
                    let path = self.silence_path(clip_position);
                    let job = EngineJob::Silence {
                        duration_secs: *duration_secs,
                        output: path.clone(),
                        format: self.format,
                    };
                    self.engine.run(&job, cancel)?;
                    silence_files.push(path.clone());
                    segment_files.push(path);
                }
                Segment::Clip { path, .. } => {
                    segment_files.push(path.clone());
                    clip_position += 1;
                }
            }
        }

        let manifest = self.scratch_dir.join(MANIFEST_NAME);
        write_manifest(&manifest, &segment_files)
            .map_err(|e| AssemblyError::io("write concat manifest", e))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AssemblyError::io("create output directory", e))?;
        }

        tracing::debug!(
            "Concatenating {} segments ({} silences) into {}",
            segment_files.len(),
            silence_files.len(),
            output.display()
        );

        let job = EngineJob::Concat {
            manifest: manifest.clone(),
            output: output.to_path_buf(),
            format: self.format,
        };
        self.engine.run(&job, cancel)?;

        Ok(AssemblyOutput {
            output: output.to_path_buf(),
            manifest,
            silence_files,
            segment_count: segment_files.len(),
        })
    }
}
