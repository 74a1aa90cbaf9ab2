pub mod chart_config;
pub mod component;
pub mod map_config;

pub use chart_config::{ChartConfig, ChartConfigFields};
pub use component::{Component, ComponentFields, NewComponent, COMPONENTS, COMPONENT_INDEX_KEY};
pub use map_config::{MapConfig, MapConfigFields};
