//! Per-player character runtime: persisted sheet, equipment rules, derived
//! stats, spell casting, trading and quest binding.
//!
//! A [`World`] holds the shared tables, formulas and row store. Characters are
//! owned by a [`CharacterRegistry`], which hands out [`CharacterHandle`]s and
//! performs every operation that touches two characters.

pub mod codec;
pub mod defs;
pub mod equipment;
pub mod errors;
pub mod formula;
pub mod interfaces;
pub mod paperdoll;
pub mod quest;
pub mod quest_catalog;
pub mod registry;
pub mod sheet;
pub mod spell;
pub mod state;
pub mod stats;
pub mod storage;
pub mod trade;
pub mod types;
pub mod world;

pub use codec::{
    decode_items, decode_paperdoll, decode_quests, decode_spells, encode_items, encode_paperdoll,
    encode_quest_records, encode_spells, QuestDecodeBatch, QuestRecord, QuestShape,
};
pub use defs::{ClassData, DefinitionTables, ItemData, ItemKind, ItemSpecial, ItemSubtype, SpellData};
pub use equipment::EquipRejection;
pub use errors::{CharacterError, QuestRuntimeError};
pub use formula::{Formula, FormulaError, FormulaSet, FormulaVars};
pub use interfaces::{LogSession, SessionSink, WorldMap};
pub use paperdoll::{EquipLocation, Paperdoll};
pub use quest::{
    ActiveQuest, HydrateReport, QuestBinding, QuestContext, QuestDefinition, QuestSubject,
    QuestTable, RuleCheck, RuleCheckReport, RESTART_BUDGET_PER_QUEST,
};
pub use quest_catalog::QuestCatalog;
pub use registry::{CharacterHandle, CharacterRegistry, TradeAgreement};
pub use sheet::CharacterSheet;
pub use spell::{CastPhase, SpellCast, SpellTarget};
pub use state::{valid_name, Character, DEFAULT_QUEST};
pub use storage::{CharacterStore, Column, Row, SledCharacterStore, SledCharacterStoreBuilder};
pub use trade::{OfferLimits, OfferMode, TradeState};
pub use types::*;
pub use world::World;
