use std::io::{BufReader, Write};
use std::num::NonZeroU32;
use std::time::Duration;
use log::{debug, info};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use uuid::Uuid;
use mg_core::{ArtifactRef, InputImage, MeshArtifacts, MeshService, MeshSession, ServiceError, Stage};
use crate::error::ClientError;
use crate::schemas::{output_file, AppConfig, CallRequest, CallResponse, FileData};
use crate::space::SpaceRef;
use crate::sse::{read_outcome, StreamOutcome};

pub const DEFAULT_SPACE: &str = "TencentARC/InstantMesh";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct GradioConfig {
    /// Space id (`owner/name`) or app URL
    pub space: String,
    pub hf_token: Option<String>,
    /// Per-request timeout. Mesh stages run for minutes.
    pub timeout: Duration,
}

impl Default for GradioConfig {
    fn default() -> Self {
        Self {
            space: DEFAULT_SPACE.to_string(),
            hf_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Routes of one running app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    root: String,
    prefix: String,
}

impl Routes {
    pub fn new(root: &str, api_prefix: Option<&str>) -> Self {
        let prefix = api_prefix
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{}", p))
            .unwrap_or_default();

        Self {
            root: root.trim_end_matches('/').to_string(),
            prefix,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn config(root: &str) -> String {
        format!("{}/config", root.trim_end_matches('/'))
    }

    pub fn upload(&self) -> String {
        format!("{}{}/upload", self.root, self.prefix)
    }

    pub fn call(&self, endpoint: &str) -> String {
        format!("{}{}/call/{}", self.root, self.prefix, endpoint.trim_start_matches('/'))
    }

    pub fn call_result(&self, endpoint: &str, event_id: &str) -> String {
        format!("{}/{}", self.call(endpoint), event_id)
    }

    /// Download location of an artifact, preferring the one the app handed out
    pub fn file(&self, artifact: &ArtifactRef) -> String {
        match artifact.url.as_deref() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => url.to_string(),
            Some(url) if url.starts_with('/') => format!("{}{}", self.root, url),
            _ => format!("{}{}/file={}", self.root, self.prefix, artifact.path),
        }
    }
}

pub(crate) fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

pub(crate) fn check_status(endpoint: &str, response: Response) -> Result<Response, ServiceError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(ServiceError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// Blocking client for an image-to-mesh Gradio app such as InstantMesh
pub struct GradioClient {
    config: GradioConfig,
    space: SpaceRef,
    http: Client,
}

impl GradioClient {
    pub fn new(config: GradioConfig) -> Result<Self, ClientError> {
        let space = SpaceRef::parse(&config.space)?;
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("meshgen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, space, http })
    }

    pub fn config(&self) -> &GradioConfig {
        &self.config
    }
}

impl MeshService for GradioClient {
    type Session = GradioSession;

    fn connect(&self) -> Result<GradioSession, ServiceError> {
        let token = self.config.hf_token.as_deref();
        let root = self.space.resolve(&self.http, token)?;

        let config_url = Routes::config(&root);
        let response = authorized(self.http.get(&config_url), token)
            .send()
            .map_err(ServiceError::transport)?;
        let app: AppConfig = check_status(&config_url, response)?
            .json()
            .map_err(ServiceError::transport)?;

        let session_hash = Uuid::new_v4().to_string();
        info!(
            "Connected to {} (Gradio {}), session {}",
            root,
            app.version.as_deref().unwrap_or("unknown"),
            session_hash
        );

        Ok(GradioSession {
            http: self.http.clone(),
            routes: Routes::new(&root, app.api_prefix.as_deref()),
            token: self.config.hf_token.clone(),
            session_hash,
        })
    }
}

/// One Gradio session. Every call carries the same `session_hash`, which is
/// what lets `/make3d` see the views `/generate_mvs` produced.
pub struct GradioSession {
    http: Client,
    routes: Routes,
    token: Option<String>,
    session_hash: String,
}

impl GradioSession {
    pub fn session_hash(&self) -> &str {
        &self.session_hash
    }

    fn upload(&self, image: &InputImage) -> Result<FileData, ServiceError> {
        let url = self.routes.upload();
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(ServiceError::transport)?;

        debug!("Uploading {} ({} bytes)", image.file_name, image.bytes.len());
        let response = authorized(self.http.post(&url), self.token.as_deref())
            .multipart(Form::new().part("files", part))
            .send()
            .map_err(ServiceError::transport)?;

        let paths: Vec<String> = check_status(&url, response)?
            .json()
            .map_err(ServiceError::transport)?;
        let path = paths
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::protocol(&url, "upload returned no paths"))?;

        Ok(FileData::uploaded(path, &image.file_name))
    }

    /// Submit a call and block until its event stream finishes
    fn predict(&self, endpoint: &str, data: Vec<Value>) -> Result<Vec<Value>, ServiceError> {
        let url = self.routes.call(endpoint);
        let body = CallRequest {
            data,
            session_hash: &self.session_hash,
        };

        let response = authorized(self.http.post(&url), self.token.as_deref())
            .json(&body)
            .send()
            .map_err(ServiceError::transport)?;
        let call: CallResponse = check_status(endpoint, response)?
            .json()
            .map_err(ServiceError::transport)?;
        debug!("{} queued as event {}", endpoint, call.event_id);

        let url = self.routes.call_result(endpoint, &call.event_id);
        let response = authorized(self.http.get(&url), self.token.as_deref())
            .send()
            .map_err(ServiceError::transport)?;
        let response = check_status(endpoint, response)?;

        match read_outcome(BufReader::new(response), endpoint)? {
            StreamOutcome::Complete(outputs) => Ok(outputs),
            StreamOutcome::Error(message) => Err(ServiceError::Remote {
                endpoint: endpoint.to_string(),
                message: message.unwrap_or_else(|| "the app raised without a message".to_string()),
            }),
        }
    }
}

impl MeshSession for GradioSession {
    fn preprocess(&mut self, image: &InputImage, remove_background: bool) -> Result<ArtifactRef, ServiceError> {
        let endpoint = Stage::Preprocess.endpoint();
        let file = self.upload(image)?;

        let outputs = self.predict(endpoint, vec![json!(file), json!(remove_background)])?;
        output_file(&outputs, 0, endpoint)
    }

    fn generate_multiview(
        &mut self,
        image: &ArtifactRef,
        sample_steps: NonZeroU32,
        sample_seed: i64,
    ) -> Result<ArtifactRef, ServiceError> {
        let endpoint = Stage::MultiView.endpoint();
        let file = FileData::from(image);

        let outputs = self.predict(
            endpoint,
            vec![json!(file), json!(sample_steps.get()), json!(sample_seed)],
        )?;
        output_file(&outputs, 0, endpoint)
    }

    fn reconstruct(&mut self) -> Result<MeshArtifacts, ServiceError> {
        let endpoint = Stage::Reconstruct.endpoint();

        let outputs = self.predict(endpoint, Vec::new())?;
        if outputs.len() != 2 {
            return Err(ServiceError::protocol(
                endpoint,
                format!("expected an OBJ and a GLB, got {} outputs", outputs.len()),
            ));
        }

        Ok(MeshArtifacts {
            obj: output_file(&outputs, 0, endpoint)?,
            glb: output_file(&outputs, 1, endpoint)?,
        })
    }

    fn fetch(&mut self, artifact: &ArtifactRef, dest: &mut dyn Write) -> Result<u64, ServiceError> {
        let url = self.routes.file(artifact);
        debug!("Downloading {}", url);

        let response = authorized(self.http.get(&url), self.token.as_deref())
            .send()
            .map_err(ServiceError::transport)?;
        let mut response = check_status(&url, response)?;

        Ok(std::io::copy(&mut response, dest)?)
    }

    fn close(self) -> Result<(), ServiceError> {
        // The /call API keeps no connection open between calls; dropping the
        // hash ends the session from this side.
        info!("Closed session {}", self.session_hash);
        Ok(())
    }
}
