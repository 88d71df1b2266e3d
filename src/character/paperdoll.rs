/// Fixed 15-slot equipment array ("paperdoll").
///
/// Ring, Armlet and Bracer are logical pairs split over two physical slots;
/// the binary `subloc` picks between them.
use serde::{Deserialize, Serialize};

use super::types::ItemId;

pub const PAPERDOLL_SLOTS: usize = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipLocation {
    Boots,
    Accessory,
    Gloves,
    Belt,
    Armor,
    Necklace,
    Hat,
    Shield,
    Weapon,
    Ring1,
    Ring2,
    Armlet1,
    Armlet2,
    Bracer1,
    Bracer2,
}

pub const EQUIP_LOCATIONS: [EquipLocation; PAPERDOLL_SLOTS] = [
    EquipLocation::Boots,
    EquipLocation::Accessory,
    EquipLocation::Gloves,
    EquipLocation::Belt,
    EquipLocation::Armor,
    EquipLocation::Necklace,
    EquipLocation::Hat,
    EquipLocation::Shield,
    EquipLocation::Weapon,
    EquipLocation::Ring1,
    EquipLocation::Ring2,
    EquipLocation::Armlet1,
    EquipLocation::Armlet2,
    EquipLocation::Bracer1,
    EquipLocation::Bracer2,
];

/// Logical slot a piece of equipment targets. Paired slots resolve to one
/// of two physical locations through [`PAIRED_SLOTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    Single(EquipLocation),
    Paired(PairedSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedSlot {
    Ring,
    Armlet,
    Bracer,
}

/// Physical locations of each paired slot, indexed by subloc.
pub const PAIRED_SLOTS: [(PairedSlot, [EquipLocation; 2]); 3] = [
    (PairedSlot::Ring, [EquipLocation::Ring1, EquipLocation::Ring2]),
    (PairedSlot::Armlet, [EquipLocation::Armlet1, EquipLocation::Armlet2]),
    (PairedSlot::Bracer, [EquipLocation::Bracer1, EquipLocation::Bracer2]),
];

impl PairedSlot {
    pub fn locations(self) -> [EquipLocation; 2] {
        PAIRED_SLOTS
            .iter()
            .find(|(pair, _)| *pair == self)
            .map(|(_, locations)| *locations)
            .unwrap_or([EquipLocation::Ring1, EquipLocation::Ring2])
    }
}

impl SlotTarget {
    /// Physical location for the given subloc. Single slots ignore subloc.
    pub fn location(self, subloc: u8) -> EquipLocation {
        match self {
            SlotTarget::Single(location) => location,
            SlotTarget::Paired(pair) => pair.locations()[usize::from(subloc != 0)],
        }
    }
}

impl EquipLocation {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        EQUIP_LOCATIONS.get(index).copied()
    }

    /// Subloc addressing this physical slot: 1 for the second slot of a
    /// pair, 0 for everything else.
    pub fn subloc(self) -> u8 {
        match self {
            EquipLocation::Ring2 | EquipLocation::Armlet2 | EquipLocation::Bracer2 => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paperdoll {
    slots: [ItemId; PAPERDOLL_SLOTS],
}

impl Paperdoll {
    pub fn from_slots(slots: [ItemId; PAPERDOLL_SLOTS]) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[ItemId; PAPERDOLL_SLOTS] {
        &self.slots
    }

    pub fn get(&self, location: EquipLocation) -> ItemId {
        self.slots[location.index()]
    }

    pub fn set(&mut self, location: EquipLocation, item: ItemId) {
        self.slots[location.index()] = item;
    }

    pub fn is_empty(&self, location: EquipLocation) -> bool {
        self.get(location) == 0
    }

    /// Occupied slots in physical order.
    pub fn equipped(&self) -> impl Iterator<Item = (EquipLocation, ItemId)> + '_ {
        EQUIP_LOCATIONS
            .iter()
            .map(move |location| (*location, self.get(*location)))
            .filter(|(_, item)| *item != 0)
    }

    /// First slot holding `item` whose subloc matches. Any non-zero subloc
    /// addresses the second slot of a pair.
    pub fn find(&self, item: ItemId, subloc: u8) -> Option<EquipLocation> {
        if item == 0 {
            return None;
        }
        let subloc = u8::from(subloc != 0);
        self.equipped()
            .find(|(location, held)| *held == item && location.subloc() == subloc)
            .map(|(location, _)| location)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        item != 0 && self.slots.contains(&item)
    }
}
