use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

pub type ItemId = i16;
pub type SpellId = i16;
pub type QuestId = i16;
pub type ClassId = u8;

/// Process-unique handle for a loaded character. Also the global lock order
/// used when two characters have to be mutated together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharacterId(pub u32);

/// One inventory or bank line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemEntry {
    pub id: ItemId,
    pub amount: i32,
}

impl ItemEntry {
    pub fn new(id: ItemId, amount: i32) -> Self {
        Self { id, amount }
    }
}

/// One spellbook line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpellEntry {
    pub id: SpellId,
    pub level: i16,
}

impl SpellEntry {
    pub fn new(id: SpellId, level: i16) -> Self {
        Self { id, level }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

impl Gender {
    pub fn from_i64(value: i64) -> Self {
        if value == 1 {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    #[default]
    Player,
    Guide,
    Guardian,
    GameMaster,
    HighGameMaster,
}

impl AdminLevel {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => AdminLevel::Guide,
            2 => AdminLevel::Guardian,
            3 => AdminLevel::GameMaster,
            v if v >= 4 => AdminLevel::HighGameMaster,
            _ => AdminLevel::Player,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Down,
    Left,
    Up,
    Right,
}

impl Direction {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Direction::Left,
            2 => Direction::Up,
            3 => Direction::Right,
            _ => Direction::Down,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SitState {
    #[default]
    Stand,
    Chair,
    Floor,
}

impl SitState {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => SitState::Chair,
            2 => SitState::Floor,
            _ => SitState::Stand,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// The six primary attributes. Used for base stats, class modifiers, item
/// bonuses and item requirements alike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Attributes {
    pub str: i32,
    pub intl: i32,
    pub wis: i32,
    pub agi: i32,
    pub con: i32,
    pub cha: i32,
}

impl Attributes {
    /// True when every attribute is at least the matching requirement.
    pub fn meets(&self, req: &Attributes) -> bool {
        self.str >= req.str
            && self.intl >= req.intl
            && self.wis >= req.wis
            && self.agi >= req.agi
            && self.con >= req.con
            && self.cha >= req.cha
    }
}

impl Add for Attributes {
    type Output = Attributes;

    fn add(self, rhs: Attributes) -> Attributes {
        Attributes {
            str: self.str + rhs.str,
            intl: self.intl + rhs.intl,
            wis: self.wis + rhs.wis,
            agi: self.agi + rhs.agi,
            con: self.con + rhs.con,
            cha: self.cha + rhs.cha,
        }
    }
}

impl AddAssign for Attributes {
    fn add_assign(&mut self, rhs: Attributes) {
        *self = *self + rhs;
    }
}

/// Derived combat fields and resource pools produced by a stat recompute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DerivedStats {
    pub weight: i32,
    pub max_weight: i32,
    pub max_hp: i32,
    pub max_tp: i32,
    pub max_sp: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub accuracy: i32,
    pub evade: i32,
    pub armor: i32,
}

/// Messages pushed to the owning session. The transport layer frames them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// hp/tp were clamped down after a stat recompute.
    Recover { hp: i32, tp: i32 },
    /// Plain status-line text.
    Status(String),
    /// The trade with `partner` was closed.
    TradeClosed { partner: CharacterId },
    /// Both parties agreed and items were exchanged.
    TradeCompleted { partner: CharacterId },
    /// The character was muted by `by`.
    Muted { by: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_meet_requirements() {
        let have = Attributes { str: 10, agi: 5, ..Default::default() };
        assert!(have.meets(&Attributes { str: 10, ..Default::default() }));
        assert!(!have.meets(&Attributes { agi: 6, ..Default::default() }));
    }

    #[test]
    fn test_scalar_enum_conversions_fall_back() {
        assert_eq!(Gender::from_i64(7), Gender::Female);
        assert_eq!(AdminLevel::from_i64(9), AdminLevel::HighGameMaster);
        assert_eq!(Direction::from_i64(3).as_i64(), 3);
        assert_eq!(SitState::from_i64(-1), SitState::Stand);
    }
}
