use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed routes annotation on ingress {id}: {source}")]
    MalformedRoutes {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Route not found: {0}")]
    RouteNotFound(String),
}
