mod cli;
mod config;

use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use mg_core::progress::PipelineEvent;
use mg_core::{GenerationError, GenerationResult, MeshPipeline};
use mg_gradio::GradioClient;
use crate::cli::Args;
use crate::config::MeshgenConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(result) => {
            println!("\nSuccessfully generated and saved 3D models:");
            println!("  Preprocessed image: {}", result.preprocessed_image.display());
            println!("  Multi-view image:   {}", result.multiview_image.display());
            println!("  OBJ format:         {}", result.obj.display());
            println!("  GLB format:         {}", result.glb.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nMesh generation failed: {}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<GenerationResult> {
    let config = MeshgenConfig::load()?
        .with_space(args.space.clone())
        .with_timeout_secs(args.timeout);

    let client = GradioClient::new(config.gradio()).context("Invalid mesh service configuration")?;
    let request = args.request();

    println!(
        "--- Starting 3D mesh generation for '{}' via '{}' ---",
        request.input_image_path().display(),
        config.space
    );

    let result = MeshPipeline::new(client)
        .with_progress(|event: &PipelineEvent| println!("{}", event.describe()))
        .generate(&request)?;

    Ok(result)
}

/// The whole cause chain. Library errors already embed their cause in their
/// message, so only errors carrying anyhow context are expanded.
fn failure_message(err: &anyhow::Error) -> String {
    if err.downcast_ref::<GenerationError>().is_some() {
        err.to_string()
    } else {
        format!("{:#}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_context_failures_show_cause() {
        let err = GradioClient::new(mg_gradio::GradioConfig {
            space: "foo".to_string(),
            ..Default::default()
        })
        .context("Invalid mesh service configuration")
        .err()
        .unwrap();

        assert_eq!(
            failure_message(&err),
            "Invalid mesh service configuration: 'foo' is neither a URL nor an owner/name Space id"
        );
    }

    #[test]
    fn test_generation_failures_print_once() {
        let err = anyhow::Error::from(GenerationError::InputNotFound(PathBuf::from("missing.png")));
        assert_eq!(failure_message(&err), "Input image file not found at 'missing.png'");
    }
}
