use std::num::NonZeroU32;
use std::path::PathBuf;
use clap::Parser;
use mg_core::request::{DEFAULT_OUTPUT_DIR, DEFAULT_SAMPLE_SEED, DEFAULT_SAMPLE_STEPS};
use mg_core::GenerationRequest;

/// Generate OBJ and GLB meshes from a single image with InstantMesh
#[derive(Parser, Debug)]
#[command(name = "meshgen", version)]
pub struct Args {
    /// Image to reconstruct
    pub input_image: PathBuf,

    /// Directory to save the generated images and meshes
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Sample steps for multi-view generation
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_STEPS)]
    pub steps: NonZeroU32,

    /// Seed for multi-view generation
    #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_SEED, allow_negative_numbers = true)]
    pub seed: i64,

    /// Keep the input background instead of removing it
    #[arg(short, long)]
    pub keep_background: bool,

    /// Space id (owner/name) or app URL; overrides MESHGEN_SPACE
    #[arg(long)]
    pub space: Option<String>,

    /// Per-request timeout in seconds; overrides MESHGEN_TIMEOUT_SECS
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl Args {
    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(&self.input_image)
            .with_output_dir(&self.output)
            .with_remove_background(!self.keep_background)
            .with_sample_steps(self.steps)
            .with_sample_seed(self.seed)
    }
}
