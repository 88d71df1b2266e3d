//! Equip / unequip transitions over the paperdoll.
//!
//! Both transitions are all-or-nothing: every precondition is checked before
//! the inventory or the paperdoll is touched. The caller recomputes stats on
//! success.

use super::defs::{DefinitionTables, ItemData, ItemKind, ItemSubtype};
use super::paperdoll::EquipLocation;
use super::sheet::CharacterSheet;
use super::types::ItemId;

/// Why an equip attempt was refused. These are rule outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipRejection {
    /// Not held outside trade escrow.
    NotHeld,
    /// The item has no paperdoll slot.
    NotWearable,
    /// Armor made for the other gender.
    Gender,
    /// A two-handed weapon cannot go next to the equipped shield.
    ShieldBlocksTwoHanded,
    /// The shield cannot go next to the equipped two-handed weapon.
    TwoHandedBlocksShield,
    /// Level, class or attribute requirement not met.
    Requirements,
    /// The target physical slot already holds an item.
    SlotOccupied,
}

impl EquipRejection {
    /// Status line shown to the player, if the rejection is announced.
    pub fn status_message(self) -> Option<&'static str> {
        match self {
            EquipRejection::ShieldBlocksTwoHanded => {
                Some("You are not able to wield a two-handed weapon while holding a shield.")
            }
            EquipRejection::TwoHandedBlocksShield => {
                Some("You are not able to hold a shield while wielding a two-handed weapon.")
            }
            _ => None,
        }
    }
}

/// A two-handed weapon and an off-hand item may be worn together when the
/// weapon is built for dual wielding or the off-hand item is ammunition.
fn two_handed_compatible(weapon: &ItemData, off_hand: &ItemData) -> bool {
    weapon.dual_wield_graphic != 0 || off_hand.subtype.is_ammo_like()
}

/// Validate an equip attempt without mutating anything.
///
/// `available` is the amount held outside trade escrow.
pub fn check_equip(
    sheet: &CharacterSheet,
    tables: &DefinitionTables,
    item: ItemId,
    subloc: u8,
    available: i32,
) -> Result<EquipLocation, EquipRejection> {
    if item == 0 || available < 1 {
        return Err(EquipRejection::NotHeld);
    }

    let data = tables.item(item);
    let target = data.kind.slot().ok_or(EquipRejection::NotWearable)?;

    if data.kind == ItemKind::Armor && data.gender != sheet.gender {
        return Err(EquipRejection::Gender);
    }

    if data.kind == ItemKind::Weapon && data.subtype == ItemSubtype::TwoHanded {
        let shield = sheet.paperdoll.get(EquipLocation::Shield);
        if shield != 0 && !two_handed_compatible(data, tables.item(shield)) {
            return Err(EquipRejection::ShieldBlocksTwoHanded);
        }
    }

    if data.kind == ItemKind::Shield {
        let weapon_id = sheet.paperdoll.get(EquipLocation::Weapon);
        if weapon_id != 0 {
            let weapon = tables.item(weapon_id);
            if weapon.subtype == ItemSubtype::TwoHanded && !two_handed_compatible(weapon, data) {
                return Err(EquipRejection::TwoHandedBlocksShield);
            }
        }
    }

    let class_ok = data.class_req == 0
        || data.class_req == sheet.class
        || tables.class(sheet.class).base == data.class_req;
    if i32::from(sheet.level) < data.level_req || !class_ok || !sheet.display.meets(&data.req) {
        return Err(EquipRejection::Requirements);
    }

    let location = target.location(subloc);
    if !sheet.paperdoll.is_empty(location) {
        return Err(EquipRejection::SlotOccupied);
    }

    Ok(location)
}

/// Move one unit of `item` from the inventory into its slot.
pub fn equip(
    sheet: &mut CharacterSheet,
    tables: &DefinitionTables,
    item: ItemId,
    subloc: u8,
    available: i32,
) -> Result<EquipLocation, EquipRejection> {
    let location = check_equip(sheet, tables, item, subloc, available)?;
    sheet.take_item(item, 1);
    sheet.paperdoll.set(location, item);
    Ok(location)
}

/// Clear the slot holding `item` whose subloc matches and return one unit
/// to the inventory.
pub fn unequip(sheet: &mut CharacterSheet, item: ItemId, subloc: u8, max_item: i32) -> Option<EquipLocation> {
    let location = sheet.paperdoll.find(item, subloc)?;
    if !sheet.push_item(item, 1, max_item) {
        return None;
    }
    sheet.paperdoll.set(location, 0);
    Some(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::defs::ClassData;
    use crate::character::types::{Attributes, Gender, ItemEntry};

    fn tables() -> DefinitionTables {
        DefinitionTables::from_records(
            vec![
                ItemData { id: 1, name: "Gold".into(), kind: ItemKind::Currency, ..Default::default() },
                ItemData {
                    id: 2,
                    name: "Greatsword".into(),
                    kind: ItemKind::Weapon,
                    subtype: ItemSubtype::TwoHanded,
                    ..Default::default()
                },
                ItemData { id: 3, name: "Buckler".into(), kind: ItemKind::Shield, ..Default::default() },
                ItemData {
                    id: 4,
                    name: "Quiver".into(),
                    kind: ItemKind::Shield,
                    subtype: ItemSubtype::Arrows,
                    ..Default::default()
                },
                ItemData { id: 5, name: "Ring".into(), kind: ItemKind::Ring, ..Default::default() },
                ItemData {
                    id: 6,
                    name: "Gown".into(),
                    kind: ItemKind::Armor,
                    gender: Gender::Female,
                    ..Default::default()
                },
                ItemData {
                    id: 7,
                    name: "Staff".into(),
                    kind: ItemKind::Weapon,
                    level_req: 3,
                    class_req: 2,
                    req: Attributes { wis: 5, ..Default::default() },
                    ..Default::default()
                },
                ItemData {
                    id: 8,
                    name: "Twin Blades".into(),
                    kind: ItemKind::Weapon,
                    subtype: ItemSubtype::TwoHanded,
                    dual_wield_graphic: 12,
                    ..Default::default()
                },
            ],
            vec![
                ClassData { id: 1, name: "Acolyte".into(), base: 2, ..Default::default() },
                ClassData { id: 2, name: "Priest".into(), ..Default::default() },
            ],
            Vec::new(),
        )
    }

    fn holding(items: &[(ItemId, i32)]) -> CharacterSheet {
        CharacterSheet {
            inventory: items.iter().map(|(id, amount)| ItemEntry::new(*id, *amount)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_equip_then_unequip_restores_inventory() {
        let tables = tables();
        let mut sheet = holding(&[(5, 2)]);
        assert_eq!(equip(&mut sheet, &tables, 5, 1, 2), Ok(EquipLocation::Ring2));
        assert_eq!(sheet.owned(5), 1);
        assert_eq!(unequip(&mut sheet, 5, 0, 100), None);
        assert_eq!(unequip(&mut sheet, 5, 1, 100), Some(EquipLocation::Ring2));
        assert_eq!(sheet.owned(5), 2);
        assert!(sheet.paperdoll.is_empty(EquipLocation::Ring2));
    }

    #[test]
    fn test_two_handed_blocked_by_shield() {
        let tables = tables();
        let mut sheet = holding(&[(2, 1), (3, 1)]);
        equip(&mut sheet, &tables, 3, 0, 1).expect("shield");
        let before = sheet.clone();
        assert_eq!(equip(&mut sheet, &tables, 2, 0, 1), Err(EquipRejection::ShieldBlocksTwoHanded));
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_two_handed_allows_ammo_and_dual_wield() {
        let tables = tables();
        let mut sheet = holding(&[(2, 1), (4, 1), (3, 1), (8, 1)]);
        equip(&mut sheet, &tables, 2, 0, 1).expect("weapon");
        assert_eq!(equip(&mut sheet, &tables, 4, 0, 1), Ok(EquipLocation::Shield));

        let mut sheet = holding(&[(3, 1), (8, 1)]);
        equip(&mut sheet, &tables, 3, 0, 1).expect("shield");
        assert_eq!(equip(&mut sheet, &tables, 8, 0, 1), Ok(EquipLocation::Weapon));
    }

    #[test]
    fn test_shield_blocked_by_two_handed() {
        let tables = tables();
        let mut sheet = holding(&[(2, 1), (3, 1)]);
        equip(&mut sheet, &tables, 2, 0, 1).expect("weapon");
        let rejection = equip(&mut sheet, &tables, 3, 0, 1).unwrap_err();
        assert_eq!(rejection, EquipRejection::TwoHandedBlocksShield);
        assert!(rejection.status_message().is_some());
    }

    #[test]
    fn test_requirements_use_display_attributes_and_base_class() {
        let tables = tables();
        let mut sheet = holding(&[(7, 1)]);
        sheet.class = 1;
        sheet.level = 3;
        sheet.base.wis = 9;
        assert_eq!(equip(&mut sheet, &tables, 7, 0, 1), Err(EquipRejection::Requirements));
        sheet.display.wis = 5;
        assert_eq!(equip(&mut sheet, &tables, 7, 0, 1), Ok(EquipLocation::Weapon));
    }

    #[test]
    fn test_gender_escrow_and_occupied_slot() {
        let tables = tables();
        let mut sheet = holding(&[(6, 1), (5, 3)]);
        sheet.gender = Gender::Male;
        assert_eq!(equip(&mut sheet, &tables, 6, 0, 1), Err(EquipRejection::Gender));
        assert_eq!(equip(&mut sheet, &tables, 5, 0, 0), Err(EquipRejection::NotHeld));
        equip(&mut sheet, &tables, 5, 0, 3).expect("ring");
        assert_eq!(equip(&mut sheet, &tables, 5, 0, 2), Err(EquipRejection::SlotOccupied));
        assert_eq!(equip(&mut sheet, &tables, 1, 0, 1), Err(EquipRejection::NotWearable));
    }
}
