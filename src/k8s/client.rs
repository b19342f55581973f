// Client creation with credential discovery and custom user-agent support for kube 2.x
use super::config::SERVICE_ACCOUNT_TOKEN_PATH;
use crate::error::Result as EwResult;
use hyper::http::{HeaderName, HeaderValue};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where cluster credentials are loaded from, in order of preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A kubeconfig file from `KUBECONFIG` or `~/.kube/config`
    Kubeconfig(PathBuf),
    /// Mounted service-account token plus `KUBERNETES_SERVICE_HOST`/`PORT`
    ServiceAccount,
    /// Whatever `Config::infer` can find
    Infer,
}

impl ConfigSource {
    /// Pick a credential source.
    ///
    /// `env` looks up environment variables and `exists` checks the
    /// filesystem, so the preference order can be exercised without a cluster.
    pub fn discover<E, X>(env: E, exists: X) -> Self
    where
        E: Fn(&str) -> Option<String>,
        X: Fn(&Path) -> bool,
    {
        let kubeconfig = env("KUBECONFIG")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env("HOME")
                    .filter(|h| !h.is_empty())
                    .map(|home| Path::new(&home).join(".kube").join("config"))
            });

        if let Some(path) = kubeconfig {
            if exists(&path) {
                return Self::Kubeconfig(path);
            }
        }

        let has_service_env = env("KUBERNETES_SERVICE_HOST").is_some_and(|h| !h.is_empty())
            && env("KUBERNETES_SERVICE_PORT").is_some_and(|p| !p.is_empty());
        if has_service_env && exists(Path::new(SERVICE_ACCOUNT_TOKEN_PATH)) {
            return Self::ServiceAccount;
        }

        Self::Infer
    }

    /// Discover a source from the real process environment and filesystem
    #[must_use]
    pub fn from_env() -> Self {
        Self::discover(|key| std::env::var(key).ok(), Path::exists)
    }

    /// Load a kube `Config` from this source
    ///
    /// # Errors
    ///
    /// Will return `Err` if the kubeconfig cannot be read or the in-cluster
    /// environment is incomplete
    pub async fn load(&self) -> EwResult<Config> {
        let config = match self {
            Self::Kubeconfig(path) => {
                debug!("📄 Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            Self::ServiceAccount => {
                debug!("📄 Loading in-cluster service-account credentials");
                Config::incluster_env()?
            }
            Self::Infer => {
                debug!("📄 Inferring Kubernetes configuration from default sources");
                Config::infer().await?
            }
        };
        Ok(config)
    }
}

/// Add the user-agent header to a config. Invalid values are logged and
/// the kube default user-agent is kept.
pub fn add_user_agent_header(config: &mut Config, user_agent: Option<&str>) {
    if let Some(user_agent) = user_agent {
        match HeaderValue::from_str(user_agent) {
            Ok(header_value) => config
                .headers
                .push((HeaderName::from_static("user-agent"), header_value)),
            Err(e) => warn!("Ignoring invalid user-agent {:?}: {}", user_agent, e),
        }
    }
}

/// Create a new k8s client to interact with k8s cluster api
///
/// # Errors
///
/// Will return `Err` if credentials can not be discovered or the client can
/// not be built from them
pub async fn new(custom_user_agent: Option<&str>) -> EwResult<Client> {
    let source = ConfigSource::from_env();
    debug!("🔧 Using credential source {:?}", source);

    let mut config = source.load().await?;
    add_user_agent_header(&mut config, custom_user_agent);

    let client = Client::try_from(config)?;

    Ok(client)
}
