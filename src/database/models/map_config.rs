use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Map layer definition shared by any number of components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MapConfig {
    pub id: i64,
    pub index: String,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub map_type: String,
    pub source: String,
    pub size: Option<String>,
    pub icon: Option<String>,
    pub paint: Option<Value>,
    pub property: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfigFields {
    pub index: String,
    pub title: String,
    #[serde(rename = "type")]
    pub map_type: String,
    pub source: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub paint: Option<Value>,
    #[serde(default)]
    pub property: Option<Value>,
}

impl MapConfigFields {
    pub fn into_config(self, id: i64) -> MapConfig {
        MapConfig {
            id,
            index: self.index,
            title: self.title,
            map_type: self.map_type,
            source: self.source,
            size: self.size,
            icon: self.icon,
            paint: self.paint,
            property: self.property,
        }
    }
}
