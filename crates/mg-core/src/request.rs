use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use image::ImageFormat;

pub const DEFAULT_OUTPUT_DIR: &str = "instantmesh_output";
pub const DEFAULT_SAMPLE_STEPS: NonZeroU32 = NonZeroU32::new(75).unwrap();
pub const DEFAULT_SAMPLE_SEED: i64 = 42;

/// Everything one pipeline run needs. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    input_image_path: PathBuf,
    output_dir: PathBuf,
    remove_background: bool,
    sample_steps: NonZeroU32,
    sample_seed: i64,
}

impl GenerationRequest {
    pub fn new(input_image_path: impl Into<PathBuf>) -> Self {
        Self {
            input_image_path: input_image_path.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            remove_background: true,
            sample_steps: DEFAULT_SAMPLE_STEPS,
            sample_seed: DEFAULT_SAMPLE_SEED,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_remove_background(mut self, remove_background: bool) -> Self {
        self.remove_background = remove_background;
        self
    }

    pub fn with_sample_steps(mut self, sample_steps: NonZeroU32) -> Self {
        self.sample_steps = sample_steps;
        self
    }

    pub fn with_sample_seed(mut self, sample_seed: i64) -> Self {
        self.sample_seed = sample_seed;
        self
    }

    pub fn input_image_path(&self) -> &Path {
        &self.input_image_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn remove_background(&self) -> bool {
        self.remove_background
    }

    pub fn sample_steps(&self) -> NonZeroU32 {
        self.sample_steps
    }

    pub fn sample_seed(&self) -> i64 {
        self.sample_seed
    }
}

/// Local paths of every artifact a successful run saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub preprocessed_image: PathBuf,
    pub multiview_image: PathBuf,
    pub obj: PathBuf,
    pub glb: PathBuf,
}

impl GenerationResult {
    pub fn paths(&self) -> [&Path; 4] {
        [
            &self.preprocessed_image,
            &self.multiview_image,
            &self.obj,
            &self.glb,
        ]
    }
}

/// Input image loaded into memory, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InputImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = sniff_mime_type(&file_name, &bytes).to_string();
        Self { file_name, mime_type, bytes }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// Content first, extension second. The service decodes the image itself,
/// so an unknown format is still uploaded as-is.
fn sniff_mime_type(file_name: &str, bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(file_name).ok())
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
