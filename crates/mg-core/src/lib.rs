pub mod artifact;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod service;
mod stage;

pub use artifact::{ArtifactRef, MeshArtifacts};
pub use error::{GenerationError, ServiceError};
pub use pipeline::{generate_mesh, MeshPipeline};
pub use request::{GenerationRequest, GenerationResult, InputImage};
pub use service::{MeshService, MeshSession, ScopedSession};
pub use stage::Stage;
