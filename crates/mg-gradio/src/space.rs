use log::debug;
use reqwest::blocking::Client;
use mg_core::ServiceError;
use crate::client::{authorized, check_status};
use crate::error::ClientError;
use crate::schemas::SpaceHostResponse;

const SPACES_API: &str = "https://huggingface.co/api/spaces";

/// Where the app lives: a direct URL or a Hugging Face Space id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceRef {
    Url(String),
    Hub { owner: String, name: String },
}

impl SpaceRef {
    pub fn parse(reference: &str) -> Result<Self, ClientError> {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(Self::Url(reference.trim_end_matches('/').to_string()));
        }

        match reference.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::Hub {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ClientError::InvalidSpace(reference.to_string())),
        }
    }

    /// Root URL of the running app, without a trailing slash
    pub fn resolve(&self, http: &Client, token: Option<&str>) -> Result<String, ServiceError> {
        match self {
            Self::Url(url) => Ok(url.clone()),
            Self::Hub { owner, name } => {
                let url = format!("{}/{}/{}/host", SPACES_API, owner, name);
                debug!("Resolving Space {}/{} via {}", owner, name, url);

                let response = authorized(http.get(&url), token)
                    .send()
                    .map_err(ServiceError::transport)?;
                let host: SpaceHostResponse = check_status(&url, response)?
                    .json()
                    .map_err(ServiceError::transport)?;

                Ok(host.host.trim_end_matches('/').to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hub_id() {
        assert_eq!(
            SpaceRef::parse("TencentARC/InstantMesh").unwrap(),
            SpaceRef::Hub {
                owner: "TencentARC".to_string(),
                name: "InstantMesh".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            SpaceRef::parse("http://127.0.0.1:7860/").unwrap(),
            SpaceRef::Url("http://127.0.0.1:7860".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for reference in ["InstantMesh", "/InstantMesh", "TencentARC/", "a/b/c", ""] {
            let err = SpaceRef::parse(reference).unwrap_err();
            assert!(matches!(err, ClientError::InvalidSpace(_)), "{}", reference);
        }
    }

    #[test]
    fn test_url_resolves_without_network() {
        let space = SpaceRef::parse("https://tencentarc-instantmesh.hf.space").unwrap();
        let root = space.resolve(&Client::new(), None).unwrap();
        assert_eq!(root, "https://tencentarc-instantmesh.hf.space");
    }
}
