//! Wait for a Kubernetes `ExternalSecret` (or any resource reporting status
//! conditions) to become `Ready`, tailing its events in the background.

pub mod error;
pub mod k8s;
pub mod watch;
