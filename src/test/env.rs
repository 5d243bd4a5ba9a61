#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serial_test::serial;

    use crate::env::AppConfig;

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "DB_MAX_CONNECTIONS",
        "SESSION_TTL_HOURS",
        "SESSION_CLEANUP_INTERVAL_SECS",
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD",
    ];

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            let config = AppConfig::from_env();

            assert_eq!(config.database_url, "sqlite://wellness.db?mode=rwc");
            assert_eq!(config.db_max_connections, 5);
            assert_eq!(config.session_ttl, chrono::Duration::hours(24));
            assert_eq!(config.session_cleanup_interval, Duration::from_secs(3600));
            assert!(config.admin_email.is_none());
            assert!(config.admin_password.is_none());
        });
    }

    #[test]
    #[serial]
    fn overrides_are_read() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite://other.db")),
                ("DB_MAX_CONNECTIONS", Some("12")),
                ("SESSION_TTL_HOURS", Some(" 2 ")),
                ("SESSION_CLEANUP_INTERVAL_SECS", Some("90")),
                ("ADMIN_EMAIL", Some(" Root@Example.com ")),
                ("ADMIN_PASSWORD", Some("hunter22")),
            ],
            || {
                let config = AppConfig::from_env();

                assert_eq!(config.database_url, "sqlite://other.db");
                assert_eq!(config.db_max_connections, 12);
                assert_eq!(config.session_ttl, chrono::Duration::hours(2));
                assert_eq!(config.session_cleanup_interval, Duration::from_secs(90));
                assert_eq!(config.admin_email.as_deref(), Some("root@example.com"));
                assert_eq!(config.admin_password.as_deref(), Some("hunter22"));
                assert!(!format!("{:?}", config).contains("hunter22"));
            },
        );
    }

    #[test]
    #[serial]
    fn invalid_values_fall_back() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("  ")),
                ("DB_MAX_CONNECTIONS", Some("many")),
                ("SESSION_TTL_HOURS", Some("0")),
                ("SESSION_CLEANUP_INTERVAL_SECS", Some("-5")),
                ("ADMIN_EMAIL", Some("   ")),
                ("ADMIN_PASSWORD", Some("")),
            ],
            || {
                let config = AppConfig::from_env();
                let defaults = AppConfig::default();

                assert_eq!(config.database_url, defaults.database_url);
                assert_eq!(config.db_max_connections, defaults.db_max_connections);
                assert_eq!(config.session_ttl, defaults.session_ttl);
                assert_eq!(config.session_cleanup_interval, defaults.session_cleanup_interval);
                assert!(config.admin_email.is_none());
                assert!(config.admin_password.is_none());
            },
        );
    }
}
