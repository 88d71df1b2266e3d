//! Text encodings for the persisted inventory, bank, paperdoll, spellbook and
//! quest columns.
//!
//! Decoders never fail: fragments that do not carry the expected separator
//! are skipped and numeric fields parse leniently (leading integer, else 0).

use log::{debug, warn};

use super::paperdoll::{Paperdoll, PAPERDOLL_SLOTS};
use super::types::{ItemEntry, QuestId, SpellEntry};
use crate::logutil::preview_blob;

/// A quest's state name and progress blob as stored in the quest column.
/// Also the shape of an inactive quest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestRecord {
    pub quest_id: QuestId,
    pub state: String,
    pub progress: String,
}

impl QuestRecord {
    pub fn new(quest_id: QuestId, state: impl Into<String>, progress: impl Into<String>) -> Self {
        Self {
            quest_id,
            state: state.into(),
            progress: progress.into(),
        }
    }
}

/// Which of the historical quest-save shapes a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestShape {
    /// `id,state,{...}`
    Current,
    /// `id,state,`: empty progress field.
    EmptyProgress,
    /// `id,state,<counter>`: pre-structured progress, reset on load.
    CounterProgress,
    /// `id,state`: no progress field at all.
    Legacy,
}

impl QuestShape {
    pub fn needs_migration(self) -> bool {
        self != QuestShape::Current
    }
}

/// Result of decoding one quest column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestDecodeBatch {
    pub records: Vec<(QuestRecord, QuestShape)>,
    /// True if any record needed conversion; the warning was logged once.
    pub migrated: bool,
}

pub const EMPTY_PROGRESS: &str = "{}";

/// Parse the leading integer of `text` the way the stored columns were
/// written: optional sign then digits, anything else yields 0.
pub fn parse_lenient(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|value| sign * value)
        .unwrap_or(0)
}

fn lenient_i16(text: &str) -> i16 {
    parse_lenient(text).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

fn lenient_i32(text: &str) -> i32 {
    parse_lenient(text).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Split `id,value;` fragments, skipping any fragment without a comma.
fn pairs(serialized: &str) -> impl Iterator<Item = (&str, &str)> {
    serialized
        .split(';')
        .filter_map(|part| part.split_once(','))
}

// ============================================================================
// Inventory / bank
// ============================================================================

pub fn encode_items(items: &[ItemEntry]) -> String {
    let mut serialized = String::new();
    for item in items {
        serialized.push_str(&format!("{},{};", item.id, item.amount));
    }
    serialized
}

pub fn decode_items(serialized: &str) -> Vec<ItemEntry> {
    pairs(serialized)
        .map(|(id, amount)| ItemEntry::new(lenient_i16(id), lenient_i32(amount)))
        .collect()
}

// ============================================================================
// Spellbook
// ============================================================================

pub fn encode_spells(spells: &[SpellEntry]) -> String {
    let mut serialized = String::new();
    for spell in spells {
        serialized.push_str(&format!("{},{};", spell.id, spell.level));
    }
    serialized
}

pub fn decode_spells(serialized: &str) -> Vec<SpellEntry> {
    pairs(serialized)
        .map(|(id, level)| SpellEntry::new(lenient_i16(id), lenient_i16(level)))
        .collect()
}

// ============================================================================
// Paperdoll
// ============================================================================

/// Exactly fifteen comma-terminated integers.
pub fn encode_paperdoll(doll: &Paperdoll) -> String {
    let mut serialized = String::new();
    for item in doll.slots() {
        serialized.push_str(&item.to_string());
        serialized.push(',');
    }
    serialized
}

/// Fills at most fifteen slots; missing trailing slots stay empty and
/// excess tokens are ignored.
pub fn decode_paperdoll(serialized: &str) -> Paperdoll {
    let mut slots = [0; PAPERDOLL_SLOTS];
    if serialized.is_empty() {
        return Paperdoll::from_slots(slots);
    }
    for (slot, token) in slots.iter_mut().zip(serialized.split(',')) {
        *slot = lenient_i16(token);
    }
    Paperdoll::from_slots(slots)
}

// ============================================================================
// Quests
// ============================================================================

pub fn encode_quest_records<'a>(records: impl IntoIterator<Item = &'a QuestRecord>) -> String {
    let mut serialized = String::new();
    for record in records {
        serialized.push_str(&format!(
            "{},{},{};",
            record.quest_id, record.state, record.progress
        ));
    }
    serialized
}

fn decode_quest_part(part: &str) -> Option<(QuestRecord, QuestShape)> {
    let (id, rest) = part.split_once(',')?;
    let quest_id = lenient_i16(id);

    let Some((state, progress)) = rest.split_once(',') else {
        return Some((QuestRecord::new(quest_id, rest, EMPTY_PROGRESS), QuestShape::Legacy));
    };

    if progress.is_empty() {
        return Some((
            QuestRecord::new(quest_id, state, EMPTY_PROGRESS),
            QuestShape::EmptyProgress,
        ));
    }

    if !progress.starts_with('{') {
        warn!("State progress counter reset for quest: {}", quest_id);
        return Some((
            QuestRecord::new(quest_id, state, EMPTY_PROGRESS),
            QuestShape::CounterProgress,
        ));
    }

    Some((QuestRecord::new(quest_id, state, progress), QuestShape::Current))
}

/// Decode a quest column. Logs a single conversion warning for the whole
/// batch if any record used a historical shape.
pub fn decode_quests(serialized: &str) -> QuestDecodeBatch {
    let mut batch = QuestDecodeBatch::default();

    for part in serialized.split(';') {
        let Some((record, shape)) = decode_quest_part(part) else {
            if !part.is_empty() {
                debug!("skipping quest fragment without separator: {}", preview_blob(part));
            }
            continue;
        };

        if shape.needs_migration() && !batch.migrated {
            warn!("Converting quests from old format...");
            batch.migrated = true;
        }

        batch.records.push((record, shape));
    }

    batch
}
