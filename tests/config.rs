// ABOUTME: Integration tests for registry parsing and validation.
// ABOUTME: Tests YAML parsing, discovery, and every load-time rejection.

use muster::config::*;
use proptest::prelude::*;
use std::fs;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_registry() {
        let yaml = r#"
services:
  - name: elasticsearch
    tier: 0
    probe:
      type: http
      url: http://localhost:9200
    timeout: 30s
    interval: 5s
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.platform, "muster");
        assert_eq!(config.quorum.threshold(), 1.0);
        assert_eq!(config.registry.len(), 1);
        assert!(config.hooks.start.is_none());

        let es = config.registry.get("elasticsearch").unwrap();
        assert_eq!(es.timeout, Duration::from_secs(30));
        assert_eq!(es.interval, Duration::from_secs(5));
        assert_eq!(es.address(), "http://localhost:9200");
    }

    #[test]
    fn parse_full_registry() {
        let yaml = r#"
platform: soc-lab
quorum: 0.75
hooks_dir: scripts/hooks
hooks:
  start: docker compose up -d {service}
  stop: [docker, compose, stop, "{service}"]

services:
  - name: elasticsearch
    tier: 0
    probe:
      type: http
      url: http://localhost:9200/_cluster/health
      expect_status: [200]
      timeout: 2s
    timeout: 2m
    interval: 5s
    address: https://es.lab:9200

  - name: kibana
    tier: 1
    probe:
      type: tcp
      address: localhost:5601
    timeout: 60
    interval: 10

  - name: wazuh-manager
    tier: 1
    probe:
      type: exec
      command: /var/ossec/bin/wazuh-control status
    timeout: 90s
    interval: 5s
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.platform, "soc-lab");
        assert_eq!(config.quorum.threshold(), 0.75);
        assert_eq!(config.hooks_dir, std::path::PathBuf::from("scripts/hooks"));
        assert_eq!(
            config.hooks.start.as_deref().unwrap(),
            ["docker", "compose", "up", "-d", "{service}"]
        );
        assert_eq!(config.hooks.stop.as_ref().unwrap().len(), 4);

        assert_eq!(config.registry.tier_count(), 2);
        let tier1: Vec<_> = config
            .registry
            .tier(1)
            .into_iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(tier1, ["kibana", "wazuh-manager"]);

        let es = config.registry.get("elasticsearch").unwrap();
        assert_eq!(es.timeout, Duration::from_secs(120));
        assert_eq!(es.attempt_timeout(), Duration::from_secs(2));
        assert_eq!(es.address(), "https://es.lab:9200");

        let kibana = config.registry.get("kibana").unwrap();
        assert_eq!(kibana.timeout, Duration::from_secs(60));
        assert_eq!(kibana.attempt_timeout(), Duration::from_secs(10));

        let wazuh = config.registry.get("wazuh-manager").unwrap();
        assert_eq!(
            wazuh.probe.check,
            ProbeCheck::Exec {
                command: vec![
                    "/var/ossec/bin/wazuh-control".to_string(),
                    "status".to_string()
                ]
            }
        );
    }

    #[test]
    fn hooks_render_service_name() {
        let template: Vec<String> = ["docker", "compose", "up", "-d", SERVICE_PLACEHOLDER]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            render_argv(&template, "kibana"),
            ["docker", "compose", "up", "-d", "kibana"]
        );
    }
}

mod validation {
    use super::*;

    fn registry_with(entries: &str) -> Result<Config, ConfigError> {
        Config::from_yaml(&format!("services:\n{entries}"))
    }

    fn entry(name: &str, tier: i64, timeout: &str, interval: &str) -> String {
        format!(
            "  - name: \"{name}\"\n    tier: {tier}\n    probe: {{type: tcp, address: \"{name}:80\"}}\n    timeout: {timeout}\n    interval: {interval}\n"
        )
    }

    #[test]
    fn rejects_empty_registry() {
        assert!(matches!(
            Config::from_yaml("platform: soc\n"),
            Err(ConfigError::NoServices)
        ));
        assert!(matches!(
            Config::from_yaml("services: []\n"),
            Err(ConfigError::NoServices)
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let yaml = entry("es", 0, "30s", "5s") + &entry("es", 1, "30s", "5s");
        assert!(matches!(
            registry_with(&yaml),
            Err(ConfigError::DuplicateName(name)) if name.as_str() == "es"
        ));
    }

    #[test]
    fn rejects_negative_tier() {
        assert!(matches!(
            registry_with(&entry("es", -1, "30s", "5s")),
            Err(ConfigError::NegativeTier { tier: -1, .. })
        ));
    }

    #[test]
    fn rejects_tier_out_of_range() {
        assert!(matches!(
            registry_with(&entry("es", 4_294_967_296, "30s", "5s")),
            Err(ConfigError::TierTooLarge { tier: 4_294_967_296, .. })
        ));
    }

    #[test]
    fn rejects_tier_gap() {
        let yaml = entry("es", 0, "30s", "5s") + &entry("kibana", 2, "30s", "5s");
        assert!(matches!(registry_with(&yaml), Err(ConfigError::TierGap(1))));
    }

    #[test]
    fn rejects_registry_not_starting_at_zero() {
        assert!(matches!(
            registry_with(&entry("es", 1, "30s", "5s")),
            Err(ConfigError::TierGap(0))
        ));
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(matches!(
            registry_with(&entry("es", 0, "0", "5s")),
            Err(ConfigError::NonPositiveTimeout(_))
        ));
        assert!(matches!(
            registry_with(&entry("es", 0, "-30s", "5s")),
            Err(ConfigError::NonPositiveTimeout(_))
        ));
        assert!(matches!(
            registry_with(&entry("es", 0, "30s", "0s")),
            Err(ConfigError::NonPositiveInterval(_))
        ));
    }

    #[test]
    fn rejects_interval_longer_than_timeout() {
        assert!(matches!(
            registry_with(&entry("es", 0, "5s", "30s")),
            Err(ConfigError::IntervalExceedsTimeout { .. })
        ));
    }

    #[test]
    fn rejects_attempt_timeout_longer_than_interval() {
        let yaml = r#"
services:
  - name: es
    tier: 0
    probe: {type: tcp, address: "es:9200", timeout: 10s}
    timeout: 30s
    interval: 5s
"#;
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::InvalidAttemptTimeout { .. })
        ));
    }

    #[test]
    fn rejects_invalid_quorum() {
        let yaml = format!("quorum: 1.5\nservices:\n{}", entry("es", 0, "30s", "5s"));
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(ConfigError::InvalidQuorum(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let yaml = format!("replicas: 3\nservices:\n{}", entry("es", 0, "30s", "5s"));
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn rejects_invalid_service_name() {
        assert!(matches!(
            registry_with(&entry("Elastic", 0, "30s", "5s")),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn rejects_empty_hook_command() {
        let yaml = format!("hooks:\n  start: []\nservices:\n{}", entry("es", 0, "30s", "5s"));
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(ConfigError::EmptyHookCommand("start"))
        ));
    }

    proptest! {
        #[test]
        fn duplicate_names_always_rejected(
            names in prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..6),
            dup in any::<prop::sample::Index>(),
        ) {
            let mut yaml = String::new();
            for name in &names {
                yaml.push_str(&entry(name, 0, "30s", "5s"));
            }
            yaml.push_str(&entry(dup.get::<String>(&names), 0, "30s", "5s"));

            prop_assert!(matches!(
                registry_with(&yaml),
                Err(ConfigError::DuplicateName(_))
            ));
        }
    }
}

mod discovery {
    use super::*;

    const MINIMAL: &str = "services:\n  - {name: es, tier: 0, probe: {type: tcp, address: \"es:9200\"}, timeout: 30s, interval: 5s}\n";

    #[test]
    fn discovers_muster_yml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.hooks_dir, dir.path().join(DEFAULT_HOOKS_DIR));
    }

    #[test]
    fn discovers_dot_muster_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".muster")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.registry.len(), 1);
        // Hooks still resolve against the project root.
        assert_eq!(config.hooks_dir, dir.path().join(DEFAULT_HOOKS_DIR));
    }

    #[test]
    fn missing_registry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staging.yml");
        fs::write(&path, MINIMAL).unwrap();

        let config = Config::resolve(Some(&path), dir.path()).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("nope.yml");
        assert!(matches!(
            Config::resolve(Some(&missing), dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_config(dir.path(), Some("lab"), false).unwrap();
        assert!(Config::load(&path).is_ok());

        assert!(matches!(
            init_config(dir.path(), None, false),
            Err(ConfigError::AlreadyExists(_))
        ));
        assert!(init_config(dir.path(), None, true).is_ok());
    }
}
