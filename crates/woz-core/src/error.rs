use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WozError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parse toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl WozError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
