use vaultd::infrastructure::observability::TracingConfig;
use vaultd::presentation::{Environment, Settings};

fn config(environment: &str) -> TracingConfig {
    TracingConfig {
        environment: environment.to_string(),
        level: "warn".to_string(),
        json_format: false,
    }
}

#[test]
fn given_local_environment_when_building_directives_then_crate_logs_at_debug() {
    assert_eq!(
        config("local").default_directives(),
        "warn,vaultd=debug,tower_http=debug"
    );
}

#[test]
fn given_prod_environment_when_building_directives_then_configured_level_applies() {
    assert_eq!(config("prod").default_directives(), "warn,tower_http=info");
}

#[test]
fn given_loaded_settings_when_building_tracing_config_then_environment_is_named() {
    let settings = Settings::load(Environment::Test).unwrap();

    let config = settings.tracing_config(Environment::Test);

    assert_eq!(config.environment, "test");
    assert_eq!(config.level, settings.logging.level);
}
