use super::settings::{PartialIrcSettings, PartialSettings, PartialWikiSettings, Settings};
use super::{load_config, merge, normalize_channel};
use crate::utils::error::SettingsError;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.irc.port, 6667);
    assert_eq!(settings.irc.trigger, "#status");
    assert_eq!(settings.timing.save_timeout_ms, 300_000);
    assert_eq!(settings.timing.poll_interval_ms, 500);
    assert_eq!(settings.timing.send_delay_ms, 500);
    assert!(settings.wiki.is_none());
    assert!(settings.alertfile.is_none());
}

#[test]
fn test_normalize_channel() {
    assert_eq!(normalize_channel("ops").as_deref(), Some("#ops"));
    assert_eq!(normalize_channel(" #infra ").as_deref(), Some("#infra"));
    assert_eq!(normalize_channel("&local").as_deref(), Some("&local"));
    assert_eq!(normalize_channel("  "), None);
}

#[test]
fn test_merge_fills_defaults_and_normalizes() {
    let partial = PartialSettings {
        irc: Some(PartialIrcSettings {
            channels: Some(vec!["ops".into(), "#dev".into(), "".into()]),
            nicks: Some(vec![" alice ".into(), "bob".into()]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let settings = merge(partial);
    assert_eq!(settings.irc.channels, vec!["#ops", "#dev"]);
    assert_eq!(settings.irc.nicks, vec!["alice", "bob"]);
    assert_eq!(settings.irc.nick, "statusbot");
    assert!(settings.validate().is_ok());
}

#[test]
fn test_incomplete_wiki_section_is_disabled() {
    let partial = PartialSettings {
        wiki: Some(PartialWikiSettings {
            url: Some("https://wiki.example.com/w/api.php".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(merge(partial).wiki.is_none());
}

#[test]
fn test_validate_requires_channels() {
    let settings = Settings::default();
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::Missing("irc.channels"))
    ));
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("statusbot.toml");
    let toml = r#"
        [irc]
        server = "irc.example.net"
        port = 6697
        nick = "opsbot"
        channels = ["ops", "infra"]
        nicks = ["alice"]
        trigger = "!status"

        [timing]
        send_delay_ms = 0

        [wiki]
        url = "https://wiki.example.com/w/api.php"
        username = "StatusBot"
        password = "secret"
        pageid = 1781

        [alertfile]
        dir = "/tmp/alerts"
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config(Some(&path)).expect("load_config failed");
    assert_eq!(cfg.irc.server, "irc.example.net");
    assert_eq!(cfg.irc.port, 6697);
    assert_eq!(cfg.irc.channels, vec!["#ops", "#infra"]);
    assert_eq!(cfg.irc.trigger, "!status");
    assert_eq!(cfg.timing.send_delay_ms, 0);
    assert_eq!(cfg.timing.poll_interval_ms, 500);
    assert_eq!(cfg.wiki.as_ref().map(|w| w.pageid), Some(1781));
    assert_eq!(cfg.alertfile.as_ref().map(|a| a.dir.as_str()), Some("/tmp/alerts"));
    assert!(cfg.microblog.is_none());
}

#[test]
#[serial]
fn load_config_reads_environment_lists() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("statusbot.toml");
    fs::write(&path, "[irc]\nnick = \"opsbot\"\n").expect("write config file");

    temp_env::with_vars(
        [
            ("STATUSBOT__IRC__CHANNELS", Some("ops,infra")),
            ("STATUSBOT__IRC__NICKS", Some("alice,bob")),
        ],
        || {
            let cfg = load_config(Some(&path)).expect("load_config failed");
            assert_eq!(cfg.irc.channels, vec!["#ops", "#infra"]);
            assert_eq!(cfg.irc.nicks, vec!["alice", "bob"]);
            assert_eq!(cfg.irc.nick, "opsbot");
        },
    );
}
