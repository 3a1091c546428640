use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use tempfile::NamedTempFile;
use crate::artifact::ArtifactRef;
use crate::error::{GenerationError, Result, ServiceError};
use crate::progress::{PipelineEvent, ProgressSink, Silent};
use crate::request::{GenerationRequest, GenerationResult, InputImage};
use crate::service::{MeshService, MeshSession, ScopedSession};
use crate::stage::Stage;

/// Intermediate images get fixed names; meshes keep their remote names
pub const PREPROCESSED_IMAGE_NAME: &str = "preprocessed_image.png";
pub const MULTIVIEW_IMAGE_NAME: &str = "multiview_generation.png";

/// Drives a [`MeshService`] through preprocess, multi-view and reconstruct,
/// saving every artifact into the request's output directory.
pub struct MeshPipeline<S, P = Silent> {
    service: S,
    progress: P,
}

impl<S: MeshService> MeshPipeline<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            progress: Silent,
        }
    }
}

impl<S: MeshService, P: ProgressSink> MeshPipeline<S, P> {
    pub fn with_progress<Q: ProgressSink>(self, progress: Q) -> MeshPipeline<S, Q> {
        MeshPipeline {
            service: self.service,
            progress,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one request end to end.
    ///
    /// Local validation happens before any remote contact. Once a session is
    /// open it is closed before this returns, whatever the outcome. Artifacts
    /// saved before a failing stage stay on disk.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let image = load_input(request.input_image_path())?;
        prepare_output_dir(request.output_dir())?;

        self.emit(PipelineEvent::Connecting);
        let session = self
            .service
            .connect()
            .map_err(GenerationError::ConnectionFailed)?;
        self.emit(PipelineEvent::Connected);

        let mut session = ScopedSession::new(session);
        let outcome = self.run_stages(session.get_mut(), request, &image);

        // A failed close must not hide what happened during the run
        if let Err(e) = session.release() {
            warn!("Failed to close mesh service session: {}", e);
        }

        match &outcome {
            Ok(result) => info!("Generated mesh {} and {}", result.obj.display(), result.glb.display()),
            Err(e) => warn!("Mesh generation failed: {}", e),
        }

        outcome
    }

    fn run_stages(
        &self,
        session: &mut S::Session,
        request: &GenerationRequest,
        image: &InputImage,
    ) -> Result<GenerationResult> {
        let output_dir = request.output_dir();

        let preprocessed = self.run_stage(Stage::Preprocess, || {
            session.preprocess(image, request.remove_background())
        })?;
        let preprocessed_image = self.save(
            session,
            Stage::Preprocess,
            &preprocessed,
            output_dir.join(PREPROCESSED_IMAGE_NAME),
        )?;

        let multiview = self.run_stage(Stage::MultiView, || {
            session.generate_multiview(&preprocessed, request.sample_steps(), request.sample_seed())
        })?;
        let multiview_image = self.save(
            session,
            Stage::MultiView,
            &multiview,
            output_dir.join(MULTIVIEW_IMAGE_NAME),
        )?;

        // Reads the multi-view state the session holds server-side
        let meshes = self.run_stage(Stage::Reconstruct, || session.reconstruct())?;

        let obj_name = mesh_file_name(&meshes.obj)?;
        let glb_name = mesh_file_name(&meshes.glb)?;
        if obj_name == glb_name {
            return Err(GenerationError::Pipeline {
                stage: Stage::Reconstruct,
                source: ServiceError::protocol(
                    Stage::Reconstruct.endpoint(),
                    format!("both meshes are named '{}'", obj_name),
                ),
            });
        }

        let obj = self.save(session, Stage::Reconstruct, &meshes.obj, output_dir.join(obj_name))?;
        let glb = self.save(session, Stage::Reconstruct, &meshes.glb, output_dir.join(glb_name))?;

        Ok(GenerationResult {
            preprocessed_image,
            multiview_image,
            obj,
            glb,
        })
    }

    fn run_stage<T>(
        &self,
        stage: Stage,
        call: impl FnOnce() -> std::result::Result<T, ServiceError>,
    ) -> Result<T> {
        self.emit(PipelineEvent::StageStarted(stage));
        let output = call().map_err(|source| GenerationError::Pipeline { stage, source })?;
        self.emit(PipelineEvent::StageFinished(stage));
        Ok(output)
    }

    fn save(
        &self,
        session: &mut S::Session,
        stage: Stage,
        artifact: &ArtifactRef,
        dest: PathBuf,
    ) -> Result<PathBuf> {
        let written = copy_artifact(session, artifact, &dest)
            .map_err(|source| GenerationError::Pipeline { stage, source })?;
        debug!("Copied {} ({} bytes) to {}", artifact.path, written, dest.display());
        self.emit(PipelineEvent::ArtifactSaved {
            stage,
            path: dest.clone(),
        });
        Ok(dest)
    }

    fn emit(&self, event: PipelineEvent) {
        debug!("{}", event.describe());
        self.progress.report(&event);
    }
}

/// Run one request against `service` without progress reporting
pub fn generate_mesh<S: MeshService>(service: S, request: &GenerationRequest) -> Result<GenerationResult> {
    MeshPipeline::new(service).generate(request)
}

fn load_input(path: &Path) -> Result<InputImage> {
    if !path.is_file() {
        return Err(GenerationError::InputNotFound(path.to_path_buf()));
    }

    InputImage::load(path).map_err(|source| GenerationError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn prepare_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| GenerationError::OutputDirUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn mesh_file_name(artifact: &ArtifactRef) -> Result<&str> {
    artifact.base_name().ok_or_else(|| GenerationError::Pipeline {
        stage: Stage::Reconstruct,
        source: ServiceError::protocol(
            Stage::Reconstruct.endpoint(),
            format!("mesh artifact '{}' has no file name", artifact.path),
        ),
    })
}

/// Download into a temporary file next to `dest` and move it into place only
/// once every byte arrived. A failed copy leaves `dest` untouched.
fn copy_artifact<S: MeshSession>(
    session: &mut S,
    artifact: &ArtifactRef,
    dest: &Path,
) -> std::result::Result<u64, ServiceError> {
    let dir = dest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;

    let written = {
        let mut writer = BufWriter::new(staged.as_file_mut());
        let written = session.fetch(artifact, &mut writer)?;
        writer.flush()?;
        written
    };

    staged.persist(dest).map_err(|e| e.error)?;
    Ok(written)
}
