use super::*;
use figment::Jail;

fn valid() -> Settings {
    Settings {
        database_url: Some("memory://".to_string()),
        ..Settings::default()
    }
}

#[test]
fn test_settings_validation() {
    let settings = valid();
    assert!(settings.validate().is_ok());

    // Test invalid log level
    let mut invalid_settings = settings.clone();
    invalid_settings.log_level = "loud".to_string();
    assert!(invalid_settings.validate().is_err());

    // Test zero sweep interval
    let mut invalid_settings = settings.clone();
    invalid_settings.sweep.interval_secs = 0;
    assert!(invalid_settings.validate().is_err());

    // Test zero threshold
    let mut invalid_settings = settings.clone();
    invalid_settings.sweep.inactivity_threshold_secs = 0;
    assert!(invalid_settings.validate().is_err());

    // Test missing store
    let mut invalid_settings = settings.clone();
    invalid_settings.database_url = None;
    assert!(matches!(invalid_settings.validate(), Err(AppError::Config(_))));
}

#[test]
fn test_sweep_defaults() {
    let sweep = SweepSettings::default();
    assert_eq!(sweep.interval(), Duration::from_secs(15));
    assert_eq!(sweep.threshold(), Duration::from_secs(10));
    assert!(sweep.threshold() < sweep.interval());
}

#[test]
fn test_load_settings() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(
            "config.toml",
            r#"
            bind_addr = "127.0.0.1:3000"
            log_level = "debug"
            database_url = "file://chat-data"

            [sweep]
            interval_secs = 30
            inactivity_threshold_secs = 20
            "#,
        )?;

        // Environment variable takes precedence
        jail.set_env("CHATROOM_LOG_LEVEL", "warn");
        jail.set_env("CHATROOM_SWEEP__INTERVAL_SECS", "45");

        let settings = Settings::load().map_err(|e| e.to_string())?;
        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.sweep.interval_secs, 45);
        assert_eq!(settings.sweep.inactivity_threshold_secs, 20);
        assert_eq!(
            settings.store_location().map_err(|e| e.to_string())?,
            StoreLocation::File("chat-data".into())
        );
        Ok(())
    });
}

#[test]
fn test_database_url_from_plain_env() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("DATABASE_URL", "memory://");

        let settings = Settings::load_from("missing.toml").map_err(|e| e.to_string())?;
        assert_eq!(settings.bind_addr.to_string(), "0.0.0.0:5000");
        assert_eq!(
            settings.store_location().map_err(|e| e.to_string())?,
            StoreLocation::Memory
        );
        Ok(())
    });
}

#[test]
fn test_missing_database_url_is_fatal() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        assert!(matches!(Settings::load(), Err(AppError::Config(_))));
        Ok(())
    });
}
