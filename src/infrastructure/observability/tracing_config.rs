/// Configuration for tracing initialization, built from `Settings`.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub level: String,
    pub json_format: bool,
}

impl TracingConfig {
    /// Filter used when `RUST_LOG` is unset: the configured level everywhere,
    /// debug for this crate outside production.
    pub fn default_directives(&self) -> String {
        if self.environment == "prod" {
            format!("{},tower_http=info", self.level)
        } else {
            format!("{},vaultd=debug,tower_http=debug", self.level)
        }
    }
}
