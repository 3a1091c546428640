use std::path::PathBuf;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Connecting,
    Connected,
    StageStarted(Stage),
    StageFinished(Stage),
    ArtifactSaved {
        stage: Stage,
        path: PathBuf,
    },
}

impl PipelineEvent {
    /// Human-readable status line
    pub fn describe(&self) -> String {
        match self {
            Self::Connecting => "Connecting to mesh service...".to_string(),
            Self::Connected => "Connection successful.".to_string(),
            Self::StageStarted(stage) => {
                format!("Calling '{}' ({})...", stage.endpoint(), stage.name())
            }
            Self::StageFinished(stage) => format!("'{}' completed.", stage.endpoint()),
            Self::ArtifactSaved { path, .. } => format!("Saved {}", path.display()),
        }
    }
}

/// Receives pipeline events as they happen
pub trait ProgressSink {
    fn report(&self, event: &PipelineEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressSink for Silent {
    fn report(&self, _event: &PipelineEvent) {}
}

impl<F: Fn(&PipelineEvent)> ProgressSink for F {
    fn report(&self, event: &PipelineEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_stage_events() {
        let started = PipelineEvent::StageStarted(Stage::MultiView);
        assert_eq!(started.describe(), "Calling '/generate_mvs' (multi-view generation)...");

        let finished = PipelineEvent::StageFinished(Stage::Reconstruct);
        assert_eq!(finished.describe(), "'/make3d' completed.");
    }
}
