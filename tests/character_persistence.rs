//! Row persistence: save/load through the Sled store, quest column
//! migration on login and the save-on-drop path.
mod common;

use std::sync::Arc;

use charcore::character::{
    Character, CharacterId, CharacterRegistry, CharacterStore, Column, EquipLocation, LogSession,
};
use common::*;

fn text(row: &charcore::character::Row, column: &str) -> String {
    match row.get(column) {
        Some(Column::Text(value)) => value.clone(),
        other => panic!("column {} is {:?}", column, other),
    }
}

fn int(row: &charcore::character::Row, column: &str) -> i64 {
    match row.get(column) {
        Some(Column::Int(value)) => *value,
        other => panic!("column {} is {:?}", column, other),
    }
}

#[tokio::test]
async fn logout_persists_inventory_and_paperdoll() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "alice", RecordingSession::new());
    {
        let mut alice = handle.lock().expect("lock");
        assert!(alice.add_item(GOLD, 120));
        assert!(alice.add_item(STR_RING, 2));
        assert!(alice.equip(STR_RING, 1));
    }

    registry.logout(handle.id()).await.expect("logout");
    assert!(registry.get(handle.id()).is_none());
    drop(handle);

    let row = tw.world.store.load_row("alice").expect("row");
    assert_eq!(text(&row, "inventory"), "1,120;6,1;");
    assert_eq!(text(&row, "paperdoll"), "0,0,0,0,0,0,0,0,0,0,6,0,0,0,0,");

    let reloaded = registry.load("alice", Arc::new(LogSession)).expect("reload");
    let alice = reloaded.lock().expect("lock");
    assert_eq!(alice.has_item(GOLD, false), 120);
    assert_eq!(alice.sheet().paperdoll.get(EquipLocation::Ring2), STR_RING);
}

#[test]
fn login_migrates_legacy_quest_column() {
    let tw = world_with(quests(), |_| {});
    let mut row = Character::blank_row("bob");
    row.insert("quest".into(), Column::Text("0,begin;5,gone,3;".into()));
    tw.world.store.update_row("bob", &row).expect("seed");

    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = registry.load("bob", Arc::new(LogSession)).expect("load");
    let mut bob = handle.lock().expect("lock");

    let report = bob.login();
    assert_eq!(report.resumed, 1);
    assert_eq!(report.inactive, 1);
    assert_eq!(bob.get_quest(0).map(|q| q.context.state_name().to_string()), Some("begin".into()));

    let saved = bob.to_row();
    assert_eq!(text(&saved, "quest"), "0,begin,{};5,gone,{};");
}

#[tokio::test]
async fn save_before_login_keeps_stored_quest_blob() {
    let tw = world_with(quests(), |_| {});
    let mut row = Character::blank_row("carol");
    row.insert("quest".into(), Column::Text("0,begin;5,gone,3;".into()));
    tw.world.store.update_row("carol", &row).expect("seed");

    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = registry.load("carol", Arc::new(LogSession)).expect("load");
    handle.save().await.expect("save");

    let stored = tw.world.store.load_row("carol").expect("row");
    assert_eq!(text(&stored, "quest"), "0,begin;5,gone,3;");
}

#[test]
fn detached_hydration_leaves_character_offline() {
    let tw = world_with(quests(), |_| {});
    let mut row = Character::blank_row("erin");
    row.insert("quest".into(), Column::Text("3,begin,{items_seen=1};5,gone;".into()));
    tw.world.store.update_row("erin", &row).expect("seed");

    let loaded = tw.world.store.load_row("erin").expect("row");
    let mut erin = Character::from_row(Arc::clone(&tw.world), CharacterId(0), &loaded, Arc::new(LogSession))
        .expect("character");
    let report = erin.hydrate_quests();

    assert_eq!((report.resumed, report.inactive), (1, 1));
    assert!(!erin.is_online());
    assert!(erin.get_quest(0).is_none(), "default quest waits for login");
    assert_eq!(erin.hydrate_quests().resumed, 0);
    assert_eq!(text(&erin.to_row(), "quest"), "3,begin,{items_seen=1};5,gone,{};");
}

#[tokio::test]
async fn logout_unregisters_a_character_that_never_logged_in() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = registry.create("fynn", Arc::new(LogSession)).expect("create");
    assert_eq!(registry.len(), 1);

    registry.logout(handle.id()).await.expect("logout");
    assert!(registry.is_empty());
    assert!(registry.get(handle.id()).is_none());
}

#[test]
fn dropping_an_online_character_saves_it() {
    let tw = world();
    {
        let registry = CharacterRegistry::new(Arc::clone(&tw.world));
        let handle = online(&registry, "dave", RecordingSession::new());
        assert!(handle.lock().expect("lock").add_item(GOLD, 7));
    }

    let row = tw.world.store.load_row("dave").expect("row");
    assert_eq!(text(&row, "inventory"), "1,7;");
}

#[tokio::test]
async fn overlapping_saves_both_complete() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "erin", RecordingSession::new());
    handle.lock().expect("lock").sheet_mut().level = 3;

    let other = handle.clone();
    let (first, second) = tokio::join!(handle.save(), other.save());
    first.expect("first save");
    second.expect("second save");

    let row = tw.world.store.load_row("erin").expect("row");
    assert_eq!(int(&row, "level"), 3);
}

#[test]
fn missing_character_is_not_found() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let err = registry.load("nobody", Arc::new(LogSession)).err().expect("error");
    assert!(matches!(err, charcore::character::CharacterError::NotFound(_)));
}

#[test]
fn mistyped_column_is_reported() {
    let tw = world();
    let mut row = Character::blank_row("frank");
    row.insert("level".into(), Column::Text("high".into()));
    tw.world.store.update_row("frank", &row).expect("seed");

    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let err = registry.load("frank", Arc::new(LogSession)).err().expect("error");
    assert!(matches!(
        err,
        charcore::character::CharacterError::Column { column: "level", .. }
    ));
}
