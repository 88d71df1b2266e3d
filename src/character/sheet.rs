/// Persisted progression data of one character plus the derived snapshot the
/// stat engine writes back.
///
/// The sheet only knows about its own lists; rule checks, stat recomputes
/// and quest notifications live on [`super::state::Character`].
use serde::{Deserialize, Serialize};

use super::paperdoll::Paperdoll;
use super::types::{
    AdminLevel, Attributes, ClassId, DerivedStats, Direction, Gender, ItemEntry, ItemId, SitState,
    SpellEntry, SpellId,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CharacterSheet {
    pub name: String,
    pub title: String,
    pub home: String,
    pub fiance: String,
    pub partner: String,
    pub admin: AdminLevel,
    pub class: ClassId,
    pub gender: Gender,
    pub race: u8,
    pub hairstyle: u8,
    pub haircolor: u8,

    pub map_id: i16,
    pub x: u8,
    pub y: u8,
    pub direction: Direction,
    pub sitting: SitState,
    pub hidden: bool,
    pub whispers: bool,

    pub level: u8,
    pub exp: i32,
    pub hp: i32,
    pub tp: i32,
    pub base: Attributes,
    pub statpoints: i32,
    pub skillpoints: i32,
    pub karma: i32,

    pub bankmax: i32,
    pub goldbank: i32,
    /// Minutes played before the current session.
    pub usage: i32,
    pub guild_tag: String,
    pub guild_rank: i32,

    pub inventory: Vec<ItemEntry>,
    pub bank: Vec<ItemEntry>,
    pub paperdoll: Paperdoll,
    pub spells: Vec<SpellEntry>,

    /// base + class modifier + equipment bonuses
    pub adjusted: Attributes,
    /// adjusted or base, per `use_adjusted_stats`
    pub display: Attributes,
    pub derived: DerivedStats,
}

impl CharacterSheet {
    /// Owned amount of `item` ignoring any trade escrow.
    pub fn owned(&self, item: ItemId) -> i32 {
        self.inventory
            .iter()
            .find(|entry| entry.id == item)
            .map(|entry| entry.amount)
            .unwrap_or(0)
    }

    /// Add `amount` onto the line for `item`, creating it at the end if
    /// needed. The line is capped at `max_item`. Returns false on overflow.
    pub fn push_item(&mut self, item: ItemId, amount: i32, max_item: i32) -> bool {
        if let Some(entry) = self.inventory.iter_mut().find(|entry| entry.id == item) {
            let Some(total) = entry.amount.checked_add(amount) else {
                return false;
            };
            if total < 0 {
                return false;
            }
            entry.amount = total.min(max_item);
            return true;
        }
        self.inventory.push(ItemEntry::new(item, amount.min(max_item)));
        true
    }

    /// Remove `amount` of `item`; the line is dropped when it reaches zero.
    pub fn take_item(&mut self, item: ItemId, amount: i32) -> bool {
        let Some(index) = self.inventory.iter().position(|entry| entry.id == item) else {
            return false;
        };
        let entry = &mut self.inventory[index];
        if entry.amount < 0 || entry.amount - amount <= 0 {
            self.inventory.remove(index);
        } else {
            entry.amount -= amount;
        }
        true
    }

    pub fn has_spell(&self, spell: SpellId) -> bool {
        self.spells.iter().any(|entry| entry.id == spell)
    }

    pub fn spell_level(&self, spell: SpellId) -> i16 {
        self.spells
            .iter()
            .find(|entry| entry.id == spell)
            .map(|entry| entry.level)
            .unwrap_or(0)
    }
}
