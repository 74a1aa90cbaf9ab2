use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::chart_config::{ChartConfig, ChartConfigFields};
use super::map_config::MapConfigFields;
use crate::filter::{ColumnDef, ColumnType, EntitySchema, FilterRecord, FilterValue};

/// Unique constraint on `components.index`
pub const COMPONENT_INDEX_KEY: &str = "components_index_key";

/// Columns of `components` that list queries may filter and sort on.
/// JSON and array columns are not filterable.
pub static COMPONENTS: EntitySchema = EntitySchema {
    table: "components",
    primary_key: "id",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer),
        ColumnDef::new("index", ColumnType::Text),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("time_from", ColumnType::Text),
        ColumnDef::new("time_to", ColumnType::Text),
        ColumnDef::new("update_freq", ColumnType::Integer),
        ColumnDef::new("update_freq_unit", ColumnType::Text),
        ColumnDef::new("source", ColumnType::Text),
        ColumnDef::new("short_desc", ColumnType::Text),
        ColumnDef::new("long_desc", ColumnType::Text),
        ColumnDef::new("use_case", ColumnType::Text),
        ColumnDef::new("created_at", ColumnType::Timestamp),
        ColumnDef::new("updated_at", ColumnType::Timestamp),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Component {
    pub id: i64,
    pub index: String,
    pub name: String,
    pub history_config: Option<Value>,
    pub map_filter: Option<Value>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub update_freq: Option<i32>,
    pub update_freq_unit: Option<String>,
    pub source: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub use_case: Option<String>,
    pub links: Vec<String>,
    pub contributors: Vec<String>,
    pub map_config_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub chart_config: Option<ChartConfig>,
}

impl Component {
    /// Distinct referenced map config ids, ascending (lock acquisition order)
    pub fn distinct_map_config_ids(&self) -> Vec<i64> {
        let mut ids = self.map_config_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl FilterRecord for Component {
    fn column_value(&self, column: &str) -> FilterValue {
        match column {
            "id" => FilterValue::Integer(self.id),
            "index" => FilterValue::Text(self.index.clone()),
            "name" => FilterValue::Text(self.name.clone()),
            "time_from" => self.time_from.clone().into(),
            "time_to" => self.time_to.clone().into(),
            "update_freq" => self
                .update_freq
                .map(|v| FilterValue::Integer(v as i64))
                .unwrap_or(FilterValue::Null),
            "update_freq_unit" => self.update_freq_unit.clone().into(),
            "source" => self.source.clone().into(),
            "short_desc" => self.short_desc.clone().into(),
            "long_desc" => self.long_desc.clone().into(),
            "use_case" => self.use_case.clone().into(),
            "created_at" => FilterValue::Timestamp(self.created_at),
            "updated_at" => FilterValue::Timestamp(self.updated_at),
            _ => FilterValue::Null,
        }
    }
}

/// Mutable metadata of a component; an update replaces all of it at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentFields {
    pub name: String,
    #[serde(default)]
    pub history_config: Option<Value>,
    #[serde(default)]
    pub map_filter: Option<Value>,
    #[serde(default)]
    pub time_from: Option<String>,
    #[serde(default)]
    pub time_to: Option<String>,
    #[serde(default)]
    pub update_freq: Option<i32>,
    #[serde(default)]
    pub update_freq_unit: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub short_desc: Option<String>,
    #[serde(default)]
    pub long_desc: Option<String>,
    #[serde(default)]
    pub use_case: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
}

/// Payload for creating a component together with its sub-configurations.
/// `map_config_ids` references existing map configs; `map_configs` defines new ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComponent {
    pub index: String,
    #[serde(flatten)]
    pub fields: ComponentFields,
    #[serde(default)]
    pub chart_config: Option<ChartConfigFields>,
    #[serde(default)]
    pub map_config_ids: Vec<i64>,
    #[serde(default)]
    pub map_configs: Vec<MapConfigFields>,
}
