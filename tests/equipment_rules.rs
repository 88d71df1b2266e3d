//! Equip/unequip through the character aggregate: slot aliasing, two-handed
//! exclusion, requirements and trade escrow.
mod common;

use std::sync::Arc;

use charcore::character::{CharacterRegistry, EquipLocation};
use common::*;

#[test]
fn paired_slots_follow_subloc() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "alice", RecordingSession::new());
    let mut alice = handle.lock().expect("lock");

    assert!(alice.add_item(STR_RING, 3));
    assert!(alice.equip(STR_RING, 0));
    assert!(alice.equip(STR_RING, 1));
    assert!(!alice.equip(STR_RING, 1), "second slot already taken");

    let doll = &alice.sheet().paperdoll;
    assert_eq!(doll.get(EquipLocation::Ring1), STR_RING);
    assert_eq!(doll.get(EquipLocation::Ring2), STR_RING);
    assert_eq!(alice.has_item(STR_RING, false), 1);

    assert!(alice.unequip(STR_RING, 1));
    assert_eq!(alice.sheet().paperdoll.get(EquipLocation::Ring2), 0);
    assert_eq!(alice.sheet().paperdoll.get(EquipLocation::Ring1), STR_RING);
    assert_eq!(alice.has_item(STR_RING, false), 2);
}

#[test]
fn any_nonzero_subloc_round_trips_through_second_slot() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "ariel", RecordingSession::new());
    let mut ariel = handle.lock().expect("lock");

    assert!(ariel.add_item(STR_RING, 1));
    assert!(ariel.equip(STR_RING, 7));
    assert_eq!(ariel.sheet().paperdoll.get(EquipLocation::Ring2), STR_RING);
    assert!(ariel.unequip(STR_RING, 7));
    assert_eq!(ariel.sheet().paperdoll.get(EquipLocation::Ring2), 0);
    assert_eq!(ariel.has_item(STR_RING, false), 1);
}

#[test]
fn shield_blocks_two_handed_weapon_with_message() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let session = RecordingSession::new();
    let handle = online(&registry, "bruno", Arc::clone(&session));
    let mut bruno = handle.lock().expect("lock");

    assert!(bruno.add_item(BUCKLER, 1));
    assert!(bruno.add_item(GREATSWORD, 1));
    assert!(bruno.equip(BUCKLER, 0));
    assert!(!bruno.equip(GREATSWORD, 0));
    assert_eq!(bruno.sheet().paperdoll.get(EquipLocation::Weapon), 0);
    assert_eq!(bruno.has_item(GREATSWORD, false), 1);
    assert_eq!(
        session.statuses(),
        vec!["You are not able to wield a two-handed weapon while holding a shield.".to_string()]
    );
}

#[test]
fn two_handed_weapon_blocks_shield_but_not_quiver() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let session = RecordingSession::new();
    let handle = online(&registry, "celia", Arc::clone(&session));
    let mut celia = handle.lock().expect("lock");

    for item in [GREATSWORD, BUCKLER, QUIVER] {
        assert!(celia.add_item(item, 1));
    }
    assert!(celia.equip(GREATSWORD, 0));
    assert!(!celia.equip(BUCKLER, 0));
    assert_eq!(
        session.statuses().last().map(String::as_str),
        Some("You are not able to hold a shield while wielding a two-handed weapon.")
    );
    assert!(celia.equip(QUIVER, 0));
    assert_eq!(celia.sheet().paperdoll.get(EquipLocation::Shield), QUIVER);
}

#[test]
fn dual_wield_weapon_allows_shield() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "darius", RecordingSession::new());
    let mut darius = handle.lock().expect("lock");

    assert!(darius.add_item(TWIN_BLADE, 1));
    assert!(darius.add_item(BUCKLER, 1));
    assert!(darius.equip(BUCKLER, 0));
    assert!(darius.equip(TWIN_BLADE, 0));
}

#[test]
fn armor_gender_and_requirements() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "emile", RecordingSession::new());
    let mut emile = handle.lock().expect("lock");

    // Blank characters are female.
    assert!(emile.add_item(TUNIC, 1));
    assert!(emile.add_item(GOWN, 1));
    assert!(!emile.equip(TUNIC, 0));
    assert!(emile.equip(GOWN, 0));

    assert!(emile.add_item(KNIGHT_HELM, 1));
    assert!(!emile.equip(KNIGHT_HELM, 0), "level and class too low");
    emile.sheet_mut().level = 5;
    emile.sheet_mut().class = PALADIN;
    emile.calculate_stats(false);
    assert!(emile.equip(KNIGHT_HELM, 0), "paladin inherits the knight requirement");
}

#[test]
fn items_in_trade_escrow_cannot_be_equipped() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let a = online(&registry, "fiona", RecordingSession::new());
    let b = online(&registry, "gavin", RecordingSession::new());
    assert!(a.lock().expect("lock").add_item(STR_RING, 1));

    assert!(registry.open_trade(a.id(), b.id()).expect("open"));
    assert!(registry.add_trade_item(a.id(), STR_RING, 1).expect("offer"));

    let mut fiona = a.lock().expect("lock");
    assert_eq!(fiona.has_item(STR_RING, false), 0);
    assert_eq!(fiona.has_item(STR_RING, true), 1);
    assert!(!fiona.equip(STR_RING, 0));
}

#[test]
fn unequip_of_unknown_slot_is_refused() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "hilda", RecordingSession::new());
    let mut hilda = handle.lock().expect("lock");

    assert!(!hilda.unequip(0, 0));
    assert!(!hilda.unequip(STR_RING, 0));
}

#[test]
fn drop_all_keeps_lore_and_cursed_items() {
    let tw = world();
    let registry = CharacterRegistry::new(Arc::clone(&tw.world));
    let handle = online(&registry, "ivo", RecordingSession::new());
    let map = MockMap::new();
    let mut ivo = handle.lock().expect("lock");
    ivo.place(map.clone());

    for (item, amount) in [(GOLD, 30), (LORE_TOKEN, 1), (CURSED_RING, 1), (STR_RING, 1)] {
        assert!(ivo.add_item(item, amount));
    }
    assert!(ivo.equip(CURSED_RING, 0));
    assert!(ivo.equip(STR_RING, 1));

    let dropped = ivo.drop_all();
    assert_eq!(dropped.len(), 2);
    assert!(dropped.iter().any(|entry| entry.id == GOLD && entry.amount == 30));
    assert!(dropped.iter().any(|entry| entry.id == STR_RING && entry.amount == 1));
    assert_eq!(ivo.has_item(LORE_TOKEN, false), 1);
    assert_eq!(ivo.sheet().paperdoll.get(EquipLocation::Ring1), CURSED_RING);
    assert_eq!(ivo.sheet().paperdoll.get(EquipLocation::Ring2), 0);
    assert_eq!(map.dropped.lock().expect("dropped").len(), 2);
}
