use serde::{Deserialize, Serialize};
use serde_json::Value;
use mg_core::{ArtifactRef, ServiceError};

const FILE_DATA_TYPE: &str = "gradio.FileData";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpaceHostResponse {
    pub host: String,
}

/// The few fields of the app's `/config` this client cares about
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api_prefix: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallRequest<'a> {
    pub data: Vec<Value>,
    pub session_hash: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CallResponse {
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub kind: String,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            kind: FILE_DATA_TYPE.to_string(),
        }
    }
}

/// A file as Gradio passes it in and out of endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileData {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub meta: FileMeta,
}

impl FileData {
    pub fn uploaded(path: String, orig_name: &str) -> Self {
        Self {
            path,
            url: None,
            orig_name: Some(orig_name.to_string()),
            meta: FileMeta::default(),
        }
    }
}

impl From<&ArtifactRef> for FileData {
    fn from(artifact: &ArtifactRef) -> Self {
        Self {
            path: artifact.path.clone(),
            url: artifact.url.clone(),
            orig_name: artifact.orig_name.clone(),
            meta: FileMeta::default(),
        }
    }
}

impl From<FileData> for ArtifactRef {
    fn from(file: FileData) -> Self {
        Self {
            path: file.path,
            url: file.url,
            orig_name: file.orig_name,
        }
    }
}

/// Older apps return bare server paths instead of file objects
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OutputFile {
    Data(FileData),
    Path(String),
}

impl From<OutputFile> for ArtifactRef {
    fn from(output: OutputFile) -> Self {
        match output {
            OutputFile::Data(file) => file.into(),
            OutputFile::Path(path) => ArtifactRef::new(path),
        }
    }
}

/// Pick the file at `index` out of an endpoint's output array
pub fn output_file(outputs: &[Value], index: usize, endpoint: &str) -> Result<ArtifactRef, ServiceError> {
    let value = outputs.get(index).ok_or_else(|| {
        ServiceError::protocol(
            endpoint,
            format!("expected at least {} outputs, got {}", index + 1, outputs.len()),
        )
    })?;

    let output: OutputFile = serde_json::from_value(value.clone())
        .map_err(|e| ServiceError::protocol(endpoint, format!("output {} is not a file: {}", index, e)))?;

    Ok(output.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_data_output() {
        let outputs = vec![json!({
            "path": "/tmp/gradio/9c1e/tmpa1b2.obj",
            "url": "https://tencentarc-instantmesh.hf.space/file=/tmp/gradio/9c1e/tmpa1b2.obj",
            "size": null,
            "orig_name": "tmpa1b2.obj",
            "mime_type": null,
            "is_stream": false,
            "meta": {"_type": "gradio.FileData"}
        })];

        let artifact = output_file(&outputs, 0, "/make3d").unwrap();
        assert_eq!(artifact.path, "/tmp/gradio/9c1e/tmpa1b2.obj");
        assert_eq!(artifact.orig_name.as_deref(), Some("tmpa1b2.obj"));
        assert!(artifact.url.unwrap().ends_with("/file=/tmp/gradio/9c1e/tmpa1b2.obj"));
    }

    #[test]
    fn test_bare_path_output() {
        let outputs = vec![json!("/tmp/gradio/a/image.png")];
        let artifact = output_file(&outputs, 0, "/preprocess").unwrap();
        assert_eq!(artifact, ArtifactRef::new("/tmp/gradio/a/image.png"));
    }

    #[test]
    fn test_missing_output() {
        let outputs = vec![json!("/tmp/gradio/a/mesh.obj")];
        let err = output_file(&outputs, 1, "/make3d").unwrap_err();
        assert!(matches!(err, ServiceError::Protocol { .. }));
    }

    #[test]
    fn test_non_file_output() {
        let outputs = vec![json!(42)];
        assert!(output_file(&outputs, 0, "/preprocess").is_err());
    }

    #[test]
    fn test_file_data_input_shape() {
        let file = FileData::uploaded("/tmp/gradio/up/drawing.png".to_string(), "drawing.png");
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({
                "path": "/tmp/gradio/up/drawing.png",
                "orig_name": "drawing.png",
                "meta": {"_type": "gradio.FileData"}
            })
        );
    }

    #[test]
    fn test_app_config_prefix() {
        let config: AppConfig = serde_json::from_str(r#"{"version": "5.5.0", "api_prefix": "/gradio_api", "components": []}"#).unwrap();
        assert_eq!(config.api_prefix.as_deref(), Some("/gradio_api"));

        let config: AppConfig = serde_json::from_str(r#"{"version": "4.26.0"}"#).unwrap();
        assert_eq!(config.api_prefix, None);
    }
}
