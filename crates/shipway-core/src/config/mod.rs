//! Loading the deployment configuration (`shipway.toml`).

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_shipway_toml, parse_shipway_toml_str};
pub use paths::{CONFIG_FILE_NAME, default_config_path, global_config_dir};
pub use schema::{BuildSection, ShipwayConfig};
pub use store::ConfigStore;
