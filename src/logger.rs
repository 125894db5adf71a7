//! Local logging, used when logfire export is not configured.

use log::LevelFilter;
use simplelog::{Config, ConfigBuilder, LevelPadding, SimpleLogger};

/// Only records of this crate are printed, dependencies stay quiet
fn local_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_level_padding(LevelPadding::Right)
        .set_target_level(LevelFilter::Debug)
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build()
}

pub fn setup_simple_logger(level: LevelFilter) -> anyhow::Result<()> {
    Ok(SimpleLogger::init(level, local_config())?)
}
