use std::io::Write;
use std::num::NonZeroU32;
use log::{debug, warn};
use crate::artifact::{ArtifactRef, MeshArtifacts};
use crate::error::ServiceError;
use crate::request::InputImage;

/// A remote image-to-mesh service that hands out sessions
pub trait MeshService {
    type Session: MeshSession;

    /// Open a new session. Every run gets its own.
    fn connect(&self) -> Result<Self::Session, ServiceError>;
}

impl<T: MeshService + ?Sized> MeshService for &T {
    type Session = T::Session;

    fn connect(&self) -> Result<Self::Session, ServiceError> {
        (**self).connect()
    }
}

/// Stateful connection to the service.
///
/// The reconstruct stage reads state the multi-view stage left behind, so all
/// three stages of one run must go through the same session.
pub trait MeshSession {
    fn preprocess(
        &mut self,
        image: &InputImage,
        remove_background: bool,
    ) -> Result<ArtifactRef, ServiceError>;

    fn generate_multiview(
        &mut self,
        image: &ArtifactRef,
        sample_steps: NonZeroU32,
        sample_seed: i64,
    ) -> Result<ArtifactRef, ServiceError>;

    fn reconstruct(&mut self) -> Result<MeshArtifacts, ServiceError>;

    /// Stream an artifact's bytes into `dest`, returning how many were written
    fn fetch(&mut self, artifact: &ArtifactRef, dest: &mut dyn Write) -> Result<u64, ServiceError>;

    fn close(self) -> Result<(), ServiceError>;
}

/// Owns a session for the length of one run and closes it exactly once,
/// either through [`ScopedSession::release`] or on drop.
pub struct ScopedSession<S: MeshSession> {
    session: Option<S>,
}

impl<S: MeshSession> ScopedSession<S> {
    pub fn new(session: S) -> Self {
        Self { session: Some(session) }
    }

    pub fn get_mut(&mut self) -> &mut S {
        // Only `release` and `drop` take the session, and both consume the guard
        self.session.as_mut().expect("session already released")
    }

    /// Close the session now and report how that went
    pub fn release(mut self) -> Result<(), ServiceError> {
        match self.session.take() {
            Some(session) => {
                debug!("Closing mesh service session");
                session.close()
            }
            None => Ok(()),
        }
    }
}

impl<S: MeshSession> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Closing mesh service session on drop");
            if let Err(e) = session.close() {
                warn!("Failed to close mesh service session: {}", e);
            }
        }
    }
}
