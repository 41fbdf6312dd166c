use crate::AppConfig;
use figment::Jail;

#[test]
fn test_defaults_applied() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", r#"app_name = "csi-driver""#)?;

        let config = AppConfig::load(".").expect("config should load");
        assert_eq!(config.app_name, "csi-driver");
        assert_eq!(config.app_env, "development");
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.verbosity, 0);
        assert_eq!(config.interceptor.level, 5);
        assert!(config.is_development());
        Ok(())
    });
}

#[test]
fn test_env_file_overrides_default() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "default.toml",
            r#"
            app_name = "csi-driver"

            [telemetry]
            verbosity = 2
            "#,
        )?;
        jail.create_file(
            "production.toml",
            r#"
            app_env = "production"

            [telemetry]
            log_level = "warn"
            "#,
        )?;
        jail.set_env("APP_ENV", "production");

        let config = AppConfig::load(".").expect("config should load");
        assert!(config.is_production());
        assert_eq!(config.telemetry.log_level, "warn");
        assert_eq!(config.telemetry.verbosity, 2);
        Ok(())
    });
}

#[test]
fn test_prefixed_env_overrides_files() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", r#"app_name = "csi-driver""#)?;
        jail.set_env("CSI_TELEMETRY__VERBOSITY", "5");
        jail.set_env("CSI_INTERCEPTOR__LEVEL", "4");

        let config = AppConfig::load(".").expect("config should load");
        assert_eq!(config.telemetry.verbosity, 5);
        assert_eq!(config.interceptor.level, 4);
        Ok(())
    });
}

#[test]
fn test_missing_app_name_fails() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", "[telemetry]\nverbosity = 1")?;

        assert!(AppConfig::load(".").is_err());
        Ok(())
    });
}
