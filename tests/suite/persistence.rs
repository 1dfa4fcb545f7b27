//! State files written through the library API.

use std::fs;

use anchorage_config::{FeeSchedule, Limits, RegistryConfig, Roles};
use anchorage_core::{Call, PayoutLedger, Registry, StateFileError, load_state, save_state};
use anchorage_types::{AccountId, AnchorId, BlockHeight, Fingerprint, LinkId};

use crate::common::GENESIS;

fn config() -> RegistryConfig {
    let roles = Roles::new(
        AccountId::from_label("curator"),
        AccountId::from_label("linker"),
        AccountId::from_label("timekeeper"),
    )
    .expect("roles");
    let fee = FeeSchedule::new(AccountId::from_label("treasurer"), 25).expect("fee");
    RegistryConfig::new(roles, BlockHeight::new(GENESIS), Some(fee), Limits::default())
        .expect("config")
}

fn at(label: &str, block: u64) -> Call {
    Call::new(AccountId::from_label(label), BlockHeight::new(block))
}

fn populated() -> Registry {
    let mut registry = Registry::new(config());
    let curator = at("curator", GENESIS);
    for label in ["a1", "a2"] {
        registry
            .pin(
                &curator,
                AnchorId::from_label(label),
                2,
                Fingerprint::from_label(label),
                &[],
            )
            .expect("pin");
    }
    registry
        .update_content(&curator, AnchorId::from_label("a1"), Fingerprint::from_label("v2"))
        .expect("update");
    registry
        .forge_link(
            &at("linker", GENESIS + 1),
            LinkId::from_label("l1"),
            AnchorId::from_label("a1"),
            AnchorId::from_label("a2"),
            4,
            70,
            Fingerprint::from_label("l1"),
        )
        .expect("forge");
    registry
        .stake(&at("staker", GENESIS + 2).with_value(40), AnchorId::from_label("a2"))
        .expect("stake");
    registry
        .deposit(&at("donor", GENESIS + 3).with_value(4000))
        .expect("deposit");
    registry
}

#[test]
fn reloaded_registry_matches_and_keeps_going() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.json");
    let registry = populated();
    save_state(&registry, &path).expect("save");

    let mut loaded = load_state(&path, config()).expect("load");
    assert_eq!(loaded.snapshot(5, 5), registry.snapshot(5, 5));
    assert_eq!(loaded.links().slots(), registry.links().slots());
    assert_eq!(
        loaded
            .content_history(&AnchorId::from_label("a1"))
            .expect("history"),
        registry
            .content_history(&AnchorId::from_label("a1"))
            .expect("history")
    );
    assert_eq!(
        loaded
            .commitments()
            .lock_until(&AnchorId::from_label("a2")),
        registry
            .commitments()
            .lock_until(&AnchorId::from_label("a2"))
    );

    let mut payouts = PayoutLedger::default();
    let swept = loaded
        .sweep_fees(&at("curator", GENESIS + 4), &mut payouts)
        .expect("sweep");
    assert_eq!(swept, 10);
    assert_eq!(payouts.total_to(&AccountId::from_label("treasurer")), 10);
}

#[test]
fn interrupted_swap_is_recovered_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.json");
    save_state(&populated(), &path).expect("save");
    fs::rename(&path, path.with_extension("bak")).expect("park state as backup");

    let loaded = load_state(&path, config()).expect("load from backup");
    assert_eq!(loaded.anchors().len(), 2);
    assert!(path.exists());
}

#[test]
fn future_version_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.json");
    save_state(&populated(), &path).expect("save");

    let raw = fs::read_to_string(&path).expect("read");
    let bumped = raw.replacen("\"version\": 1", "\"version\": 99", 1);
    assert_ne!(raw, bumped);
    fs::write(&path, bumped).expect("write");

    assert!(matches!(
        load_state(&path, config()),
        Err(StateFileError::Version { found: 99, .. })
    ));
}
