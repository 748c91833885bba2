use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Names the transformations fall back to when a request omits them.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ModelConfig {
    pub name: String,
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_yaml(&content)?)
    }
}
