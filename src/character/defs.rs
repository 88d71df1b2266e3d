//! Static item, class and spell definition tables.
//!
//! Tables are read-only after load and shared by every character. Lookups by
//! unknown id return an empty record (id 0) so rule code never has to branch
//! on a missing definition.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::CharacterError;
use super::paperdoll::{EquipLocation, PairedSlot, SlotTarget};
use super::types::{Attributes, ClassId, Gender, ItemId, SpellId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    General,
    Currency,
    Heal,
    Key,
    Weapon,
    Shield,
    Armor,
    Hat,
    Boots,
    Gloves,
    Accessory,
    Belt,
    Necklace,
    Ring,
    Armlet,
    Bracer,
}

impl ItemKind {
    /// Paperdoll slot an item of this kind is worn in, if any.
    pub fn slot(self) -> Option<SlotTarget> {
        let single = |location| Some(SlotTarget::Single(location));
        match self {
            ItemKind::Weapon => single(EquipLocation::Weapon),
            ItemKind::Shield => single(EquipLocation::Shield),
            ItemKind::Armor => single(EquipLocation::Armor),
            ItemKind::Hat => single(EquipLocation::Hat),
            ItemKind::Boots => single(EquipLocation::Boots),
            ItemKind::Gloves => single(EquipLocation::Gloves),
            ItemKind::Accessory => single(EquipLocation::Accessory),
            ItemKind::Belt => single(EquipLocation::Belt),
            ItemKind::Necklace => single(EquipLocation::Necklace),
            ItemKind::Ring => Some(SlotTarget::Paired(PairedSlot::Ring)),
            ItemKind::Armlet => Some(SlotTarget::Paired(PairedSlot::Armlet)),
            ItemKind::Bracer => Some(SlotTarget::Paired(PairedSlot::Bracer)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemSubtype {
    #[default]
    None,
    Ranged,
    Arrows,
    Wings,
    TwoHanded,
}

impl ItemSubtype {
    /// Off-hand items that can be worn next to a two-handed weapon.
    pub fn is_ammo_like(self) -> bool {
        matches!(self, ItemSubtype::Arrows | ItemSubtype::Wings)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemSpecial {
    #[default]
    Normal,
    Rare,
    Legendary,
    Unique,
    Lore,
    Cursed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ItemData {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub subtype: ItemSubtype,
    pub special: ItemSpecial,
    pub weight: i32,
    pub hp: i32,
    pub tp: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub accuracy: i32,
    pub evade: i32,
    pub armor: i32,
    pub bonus: Attributes,
    pub level_req: i32,
    pub class_req: ClassId,
    pub req: Attributes,
    pub gender: Gender,
    pub dual_wield_graphic: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ClassData {
    pub id: ClassId,
    pub name: String,
    /// Parent class an item requirement may also be satisfied by.
    pub base: ClassId,
    /// Archetype selecting the `class.<n>.*` formulas.
    pub archetype: u8,
    pub bonus: Attributes,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    #[default]
    Heal,
    Damage,
    Bard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpellTargetKind {
    #[default]
    Normal,
    #[serde(rename = "self")]
    SelfOnly,
    Group,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetRestrict {
    NpcOnly,
    #[default]
    Friendly,
    Opponent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SpellData {
    pub id: SpellId,
    pub name: String,
    pub kind: SpellKind,
    pub target: SpellTargetKind,
    pub restrict: TargetRestrict,
    /// Cast delay in spell ticks.
    pub cast_time: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct DefinitionSeed {
    items: Vec<ItemData>,
    classes: Vec<ClassData>,
    spells: Vec<SpellData>,
}

/// Item/class/spell tables indexed by id. Index 0 is always the empty record.
#[derive(Debug, Clone)]
pub struct DefinitionTables {
    items: Vec<ItemData>,
    classes: Vec<ClassData>,
    spells: Vec<SpellData>,
}

impl Default for DefinitionTables {
    fn default() -> Self {
        Self::from_records(Vec::new(), Vec::new(), Vec::new())
    }
}

fn index_records<T: Default + Clone>(records: Vec<T>, id_of: impl Fn(&T) -> usize) -> Vec<T> {
    let len = records.iter().map(|r| id_of(r) + 1).max().unwrap_or(1);
    let mut table = vec![T::default(); len];
    for record in records {
        let id = id_of(&record);
        if id == 0 {
            continue;
        }
        table[id] = record;
    }
    table
}

impl DefinitionTables {
    pub fn from_records(items: Vec<ItemData>, classes: Vec<ClassData>, spells: Vec<SpellData>) -> Self {
        let items = items.into_iter().filter(|i| i.id > 0).collect();
        let spells = spells.into_iter().filter(|s| s.id > 0).collect();
        Self {
            items: index_records(items, |i: &ItemData| i.id as usize),
            classes: index_records(classes, |c: &ClassData| c.id as usize),
            spells: index_records(spells, |s: &SpellData| s.id as usize),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CharacterError> {
        let seed: DefinitionSeed = serde_json::from_str(json)?;
        Ok(Self::from_records(seed.items, seed.classes, seed.spells))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CharacterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn item(&self, id: ItemId) -> &ItemData {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.items.get(index))
            .unwrap_or(&self.items[0])
    }

    /// True for ids inside the item table, excluding the empty record.
    pub fn item_exists(&self, id: ItemId) -> bool {
        id > 0 && (id as usize) < self.items.len()
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        self.classes.get(id as usize).unwrap_or(&self.classes[0])
    }

    pub fn spell(&self, id: SpellId) -> &SpellData {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.spells.get(index))
            .unwrap_or(&self.spells[0])
    }

    pub fn spell_exists(&self, id: SpellId) -> bool {
        id > 0 && (id as usize) < self.spells.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len().saturating_sub(1)
    }
}
