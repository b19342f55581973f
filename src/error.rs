use derive_more::From;
use std::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Kube(kube::Error),

    #[from]
    Infer(kube::config::InferConfigError),

    #[from]
    Kubeconfig(kube::config::KubeconfigError),

    #[from]
    InCluster(kube::config::InClusterError),

    /// The watched resource never reported `Ready=True` before the deadline
    Timeout {
        kind: String,
        name: String,
        timeout: Duration,
    },

    /// Custom error message
    Custom(String),
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::Timeout {
                kind,
                name,
                timeout,
            } => write!(
                fmt,
                "timeout reached: {kind} {name} did not become Ready within {}s",
                timeout.as_secs()
            ),
            Self::Kube(e) => write!(fmt, "{e}"),
            Self::Infer(e) => write!(fmt, "error building kubeconfig: {e}"),
            Self::Kubeconfig(e) => write!(fmt, "error building kubeconfig: {e}"),
            Self::InCluster(e) => write!(fmt, "error building in-cluster config: {e}"),
            Self::Custom(msg) => write!(fmt, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
