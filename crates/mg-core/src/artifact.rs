use std::path::Path;

/// Locator for data a stage left on the remote side.
/// Only meaningful to the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Server-side path
    pub path: String,
    /// Direct download location, when the service provides one
    pub url: Option<String>,
    /// Name of the file before the service stored it
    pub orig_name: Option<String>,
}

impl ArtifactRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: None,
            orig_name: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_orig_name(mut self, orig_name: impl Into<String>) -> Self {
        self.orig_name = Some(orig_name.into());
        self
    }

    /// Base file name the service assigned, taken from the server path.
    /// Returns `None` when the path ends in a root, `..` or nothing at all.
    pub fn base_name(&self) -> Option<&str> {
        // Server paths may be either flavor regardless of the local platform
        let tail = self.path.rsplit(['/', '\\']).next()?;
        Path::new(tail).file_name()?.to_str()
    }
}

/// The two meshes the reconstruct stage produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshArtifacts {
    pub obj: ArtifactRef,
    pub glb: ArtifactRef,
}
