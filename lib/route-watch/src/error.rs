use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::Error),
}
