//! Configuration loading and validation
//!
//! Configuration is a TOML file with kebab-case keys; every field has a
//! default so the crawler can run without any file at all.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig};
pub use validation::validate;
