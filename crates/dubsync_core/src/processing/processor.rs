//! Per-clip normalization and time-compression.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::{AudioEngine, AudioFormat, EngineJob, EngineResult};
use crate::models::ClipMatch;
use crate::orchestrator::CancelHandle;

/// Writes each matched clip into the scratch directory as normalized PCM,
/// applying the clip's `atempo` chain when it overruns its cue.
#[derive(Clone)]
pub struct ClipProcessor {
    engine: Arc<dyn AudioEngine>,
    scratch_dir: PathBuf,
    format: AudioFormat,
}

impl ClipProcessor {
    pub fn new(engine: Arc<dyn AudioEngine>, scratch_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            engine,
            scratch_dir: scratch_dir.into(),
            format,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Scratch path for a clip. The cue index prefix keeps names unique
    /// even when two cues share a source file.
    pub fn output_path(&self, clip: &ClipMatch) -> PathBuf {
        let stem = clip
            .clip_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        self.scratch_dir
            .join(format!("{:04}_{}_processed.wav", clip.cue.index, stem))
    }

    /// Build the engine job for `clip` without running it.
    pub fn job_for(&self, clip: &ClipMatch) -> EngineJob {
        EngineJob::Transcode {
            input: clip.clip_path.clone(),
            output: self.output_path(clip),
            filter: clip.stretch.filter(),
            format: self.format,
        }
    }

    /// Process `clip` and record the written file on it.
    pub fn process(&self, clip: &mut ClipMatch, cancel: &CancelHandle) -> EngineResult<PathBuf> {
        let job = self.job_for(clip);

        tracing::debug!(
            "Cue {}: {} {} (x{:.3})",
            clip.cue.index,
            job.label(),
            clip.clip_path.display(),
            clip.speed_factor()
        );

        self.engine.run(&job, cancel)?;

        let output = job.output().to_path_buf();
        clip.processed_path = Some(output.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stretch::StretchPlan;
    use crate::subtitles::Cue;
    use crate::test_support::{read_duration, write_clip, FakeEngine};
    use tempfile::tempdir;

    fn clip_match(dir: &Path, index: u32, clip_secs: f64, cue_secs: f64) -> ClipMatch {
        let path = dir.join(format!("{:04}_line.wav", index));
        write_clip(&path, clip_secs);
        ClipMatch::new(
            Cue::new(index, 0.0, cue_secs, "line"),
            path,
            clip_secs,
            StretchPlan::for_durations(clip_secs, cue_secs).unwrap(),
        )
    }

    #[test]
    fn output_name_carries_index_and_stem() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new());
        let processor = ClipProcessor::new(engine, dir.path().join("scratch"), AudioFormat::default());
        let clip = clip_match(dir.path(), 12, 1.0, 2.0);

        assert_eq!(
            processor.output_path(&clip),
            dir.path().join("scratch").join("0012_0012_line_processed.wav")
        );
    }

    #[test]
    fn fitting_clip_is_only_transcoded() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new());
        let processor = ClipProcessor::new(engine.clone(), dir.path(), AudioFormat::new(44100));
        let mut clip = clip_match(dir.path(), 1, 1.0, 2.0);

        let out = processor.process(&mut clip, &CancelHandle::new()).unwrap();

        assert_eq!(clip.processed_path.as_deref(), Some(out.as_path()));
        assert!((read_duration(&out).unwrap() - 1.0).abs() < 1e-9);
        let jobs = engine.jobs();
        assert_eq!(jobs.len(), 1);
        assert!(matches!(
            &jobs[0],
            EngineJob::Transcode { filter: None, format, .. } if format.sample_rate == 44100
        ));
    }

    #[test]
    fn overrunning_clip_is_compressed_to_cue() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new());
        let processor = ClipProcessor::new(engine.clone(), dir.path(), AudioFormat::default());
        let mut clip = clip_match(dir.path(), 2, 5.3, 1.0);

        let out = processor.process(&mut clip, &CancelHandle::new()).unwrap();

        assert!((read_duration(&out).unwrap() - 1.0).abs() < 1e-4);
        assert_eq!(engine.jobs()[0].label(), "stretch");
    }

    #[test]
    fn engine_failure_leaves_clip_unprocessed() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new());
        let mut clip = clip_match(dir.path(), 3, 1.0, 2.0);
        engine.fail_on(clip.clip_path.clone());
        let processor = ClipProcessor::new(engine, dir.path(), AudioFormat::default());

        assert!(processor.process(&mut clip, &CancelHandle::new()).is_err());
        assert!(clip.processed_path.is_none());
    }
}
