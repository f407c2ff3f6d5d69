use filesfound::{FilesFoundTriggerConfig, PersistedTrigger, Settings};
use tempfile::TempDir;

fn job_trigger(text: &str) -> PersistedTrigger {
    let settings = Settings::from_toml(text).expect("settings should parse");
    settings.jobs[0].trigger.clone()
}

#[test]
fn legacy_single_config_becomes_a_list() {
    let trigger = job_trigger(
        r#"
[[jobs]]
name = "old"

[jobs.trigger]
timer_spec = "*/5 * * * *"
directory = " /in "
files = "*.csv"
"#,
    );
    assert!(matches!(trigger, PersistedTrigger::LegacySingle { .. }));

    let migrated = trigger.migrate().unwrap();
    assert_eq!(migrated.spec(), "*/5 * * * *");
    assert_eq!(
        migrated.configs(),
        &[FilesFoundTriggerConfig::new(None, "/in", "*.csv", "", "1")]
    );
}

#[test]
fn legacy_primary_comes_before_additional_configs() {
    let trigger = job_trigger(
        r#"
[[jobs]]
name = "old"

[jobs.trigger]
spec = "0 * * * *"
node = "agent-1"
directory = "/primary"
files = "**"
ignored_files = "*.tmp"

[[jobs.trigger.additional_configs]]
directory = "/second"
files = "*.xml"
trigger_number = "2"

[[jobs.trigger.additional_configs]]
directory = "/third"
files = "*.json"
"#,
    );
    assert!(matches!(trigger, PersistedTrigger::LegacyWithAdditional { .. }));

    let configs = trigger.migrate().unwrap().configs().to_vec();
    assert_eq!(configs.len(), 3);
    assert_eq!(
        configs[0],
        FilesFoundTriggerConfig::new(Some("agent-1"), "/primary", "**", "*.tmp", "1")
    );
    assert_eq!(configs[1].directory(), "/second");
    assert_eq!(configs[1].trigger_number(), "2");
    assert_eq!(configs[2].directory(), "/third");
}

#[test]
fn empty_current_list_gets_one_empty_config() {
    let trigger = job_trigger(
        r#"
[[jobs]]
name = "new"

[jobs.trigger]
spec = "0 * * * *"
configs = []
"#,
    );
    assert!(trigger.is_current());
    assert_eq!(
        trigger.migrate().unwrap().configs(),
        &[FilesFoundTriggerConfig::default()]
    );
}

#[test]
fn saving_migrated_settings_writes_the_current_shape() {
    let settings = Settings::from_toml(
        r#"
[[jobs]]
name = "old"
command = ["true"]

[jobs.trigger]
timer_spec = "*/5 * * * *"
directory = "/in"
files = "*.csv"
"#,
    )
    .unwrap();

    let migrated = settings.migrated().unwrap();
    assert!(migrated.jobs[0].trigger.is_current());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filesfound.toml");
    migrated.save(&path).unwrap();

    let reloaded = Settings::load(&path).unwrap();
    assert_eq!(reloaded, migrated);
    assert_eq!(reloaded.migrated().unwrap(), reloaded);
    assert_eq!(
        reloaded.jobs[0].trigger.configs(),
        vec![FilesFoundTriggerConfig::new(None, "/in", "*.csv", "", "1")]
    );
}

fn parse_error(text: &str) -> String {
    match Settings::from_toml(text) {
        Ok(settings) => panic!("expected a parse error, got {:?}", settings.jobs),
        Err(e) => e.to_string(),
    }
}

#[test]
fn type_error_in_configs_is_rejected_not_downgraded() {
    let error = parse_error(
        r#"
[[jobs]]
name = "import"

[jobs.trigger]
spec = "*/5 * * * *"

[[jobs.trigger.configs]]
directory = "/srv/inbox"
files = "**/*.csv"
trigger_number = 3
"#,
    );
    assert!(error.contains("invalid type"), "{}", error);
}

#[test]
fn type_error_in_additional_configs_is_rejected() {
    let error = parse_error(
        r#"
[[jobs]]
name = "old"

[jobs.trigger]
spec = "0 * * * *"
directory = "/primary"
files = "**"

[[jobs.trigger.additional_configs]]
directory = "/second"
files = ["*.xml"]
"#,
    );
    assert!(error.contains("invalid type"), "{}", error);
}

#[test]
fn misspelled_trigger_key_is_rejected() {
    let error = parse_error(
        r#"
[[jobs]]
name = "import"

[jobs.trigger]
spec = "*/5 * * * *"

[[jobs.trigger.config]]
directory = "/srv/inbox"
files = "**/*.csv"
"#,
    );
    assert!(error.contains("unknown field"), "{}", error);
}

#[test]
fn configs_mixed_with_legacy_fields_is_rejected() {
    let error = parse_error(
        r#"
[[jobs]]
name = "import"

[jobs.trigger]
spec = "*/5 * * * *"
directory = "/legacy"

[[jobs.trigger.configs]]
directory = "/srv/inbox"
files = "**/*.csv"
"#,
    );
    assert!(error.contains("cannot be combined with directory"), "{}", error);
}

#[test]
fn malformed_settings_are_left_on_disk_untouched() {
    let text = r#"
[[jobs]]
name = "import"

[jobs.trigger]
spec = "*/5 * * * *"

[[jobs.trigger.configs]]
directory = "/srv/inbox"
files = "**/*.csv"
trigger_number = 3
"#;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filesfound.toml");
    std::fs::write(&path, text).unwrap();

    assert!(Settings::load(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn legacy_primary_with_node_but_no_additional_configs_keeps_its_node() {
    let trigger = job_trigger(
        r#"
[[jobs]]
name = "old"

[jobs.trigger]
spec = "0 * * * *"
node = "agent-1"
directory = "/primary"
files = "**"
trigger_number = "4"
"#,
    );
    assert_eq!(
        trigger.configs(),
        vec![FilesFoundTriggerConfig::new(Some("agent-1"), "/primary", "**", "", "4")]
    );
}
