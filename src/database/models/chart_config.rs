use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Chart settings owned by exactly one component, keyed by the component's index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChartConfig {
    pub index: String,
    pub color: Vec<String>,
    pub types: Vec<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfigFields {
    #[serde(default)]
    pub color: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChartConfigFields {
    pub fn into_config(self, index: &str) -> ChartConfig {
        ChartConfig {
            index: index.to_string(),
            color: self.color,
            types: self.types,
            unit: self.unit,
        }
    }
}
