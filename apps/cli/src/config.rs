//! CLI configuration
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - `eclectic.toml` in the working directory (or the `--config` path)
//! - `ECLECTIC_*` environment variables, `__` between levels
//!   (`ECLECTIC_COMPILER__EXPAND=false`), `.env` included

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use eclectic_criteria::{CriteriaCompiler, JsonOptions, Operator};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Top-level comparison operator, e.g. `=` or `<>`.
    pub operator: String,
    pub expand: bool,
    /// Reject unknown operator keys instead of skipping them.
    pub strict: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            operator: "=".to_string(),
            expand: true,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("eclectic").required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("ECLECTIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if Operator::parse(&self.compiler.operator).is_none() {
            return Err(format!(
                "compiler.operator '{}' is not one of =, <>, <, >, <=, >=, LIKE, IN, NOT IN",
                self.compiler.operator
            ));
        }
        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            return Err(format!("logging.level '{}' is not a log level", self.logging.level));
        }
        Ok(())
    }

    /// Compiler settings; call after [`CliConfig::validate`].
    pub fn compiler(&self) -> CriteriaCompiler {
        CriteriaCompiler::new()
            .with_operator(Operator::parse(&self.compiler.operator).unwrap_or_default())
            .with_expand(self.compiler.expand)
    }

    pub fn json_options(&self) -> JsonOptions {
        JsonOptions {
            strict: self.compiler.strict,
        }
    }
}
