pub mod loader;
pub mod schema;
pub mod template;

pub use loader::{load_config, load_config_from_str, load_config_from_yaml_str};
pub use schema::{
    ApiMode, Config, MonitorConfig, OllamaConfig, OnlineApiConfig, Provider, TableConfig,
};
pub use template::{parse_column_list, scaffold_output_columns, PromptTemplate};
