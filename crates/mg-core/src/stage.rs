use std::fmt;

/// One remote operation of the fixed three-step pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Preprocess,
    MultiView,
    Reconstruct,
}

impl Stage {
    /// Stage name for display in status lines
    pub fn name(&self) -> &str {
        match self {
            Self::Preprocess => "preprocess",
            Self::MultiView => "multi-view generation",
            Self::Reconstruct => "3D reconstruction",
        }
    }

    /// Endpoint name for API communication
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Preprocess => "/preprocess",
            Self::MultiView => "/generate_mvs",
            Self::Reconstruct => "/make3d",
        }
    }

    /// All stages in execution order
    pub fn all() -> [Stage; 3] {
        [Self::Preprocess, Self::MultiView, Self::Reconstruct]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
