//! Environment source: `ROUTEGUIDE__SECTION__KEY=value`, e.g.
//! `ROUTEGUIDE__PIPELINE__CONTENT_TIMEOUT_MS=45000`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "ROUTEGUIDE";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
