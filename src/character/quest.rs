//! Quest engine seam and the per-character quest binding.
//!
//! Definitions live in a world-wide [`QuestTable`] that outlives every
//! character; a character refers to them through a [`QuestHandle`] index and
//! owns only its per-quest runtime context.

use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

use super::codec::{QuestDecodeBatch, QuestRecord};
use super::errors::QuestRuntimeError;
use super::formula::FormulaVars;
use super::types::{ItemId, QuestId, SpellId};

/// Restarts allowed per active quest in one rule-check pass.
pub const RESTART_BUDGET_PER_QUEST: usize = 8;

/// The character as seen by quest rules while they run.
pub trait QuestSubject {
    fn quest_vars(&self) -> FormulaVars;
    fn has_item(&self, item: ItemId) -> i32;
    fn add_item(&mut self, item: ItemId, amount: i32) -> bool;
    fn del_item(&mut self, item: ItemId, amount: i32) -> bool;
    fn has_spell(&self, spell: SpellId) -> bool;
    fn status(&mut self, message: &str);
}

/// Result of one context's rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCheck {
    Unchanged,
    /// State changed; the scan must start over.
    Restart,
    /// The quest reset itself; drop the context and start over.
    Finished,
}

/// One quest definition in the world table.
pub trait QuestDefinition: Send + Sync {
    fn id(&self) -> QuestId;
    fn name(&self) -> &str;
    fn disabled(&self) -> bool;
    fn new_context(&self) -> Box<dyn QuestContext>;
}

/// Per-character runtime state of one quest.
pub trait QuestContext: Send {
    fn state_name(&self) -> &str;
    fn set_state(&mut self, state: &str, notify: bool) -> Result<(), QuestRuntimeError>;
    fn serialize_progress(&self) -> String;
    fn unserialize_progress(&mut self, progress: &str) -> Result<(), QuestRuntimeError>;
    fn check_rules(&mut self, subject: &mut dyn QuestSubject) -> RuleCheck;
    fn used_spell(&mut self, spell: SpellId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestHandle(usize);

/// World-wide quest definitions, indexed by id.
#[derive(Default)]
pub struct QuestTable {
    quests: Vec<Box<dyn QuestDefinition>>,
    by_id: HashMap<QuestId, QuestHandle>,
}

impl QuestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A later definition with the same id replaces
    /// the lookup entry.
    pub fn register(&mut self, quest: Box<dyn QuestDefinition>) -> QuestHandle {
        let handle = QuestHandle(self.quests.len());
        if self.by_id.insert(quest.id(), handle).is_some() {
            warn!("Quest {} defined twice; keeping the later definition", quest.id());
        }
        self.quests.push(quest);
        handle
    }

    pub fn lookup(&self, id: QuestId) -> Option<QuestHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn get(&self, handle: QuestHandle) -> &dyn QuestDefinition {
        self.quests[handle.0].as_ref()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub struct ActiveQuest {
    pub handle: QuestHandle,
    pub context: Box<dyn QuestContext>,
}

/// Counters returned from [`QuestBinding::hydrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrateReport {
    pub resumed: usize,
    pub inactive: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleCheckReport {
    pub restarts: usize,
    pub exhausted: bool,
}

/// Active contexts plus inactive fallback records. Starting a quest leaves
/// any inactive record for the same id in place; the active context shadows
/// it when saving.
#[derive(Default)]
pub struct QuestBinding {
    active: BTreeMap<QuestId, ActiveQuest>,
    inactive: BTreeMap<QuestId, QuestRecord>,
}

impl QuestBinding {
    pub fn is_bound(&self, id: QuestId) -> bool {
        self.active.contains_key(&id) || self.inactive.contains_key(&id)
    }

    pub fn get(&self, id: QuestId) -> Option<&ActiveQuest> {
        self.active.get(&id)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = QuestId> + '_ {
        self.active.keys().copied()
    }

    pub fn inactive(&self) -> impl Iterator<Item = &QuestRecord> {
        self.inactive.values()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    fn keep_inactive(&mut self, record: QuestRecord) {
        let id = record.quest_id;
        if self.active.contains_key(&id) || self.inactive.contains_key(&id) {
            warn!("Duplicate inactive quest record dropped for quest: {}", id);
            return;
        }
        self.inactive.insert(id, record);
    }

    /// Resume every decoded record. Unknown quests and records the engine
    /// refuses become inactive; nothing aborts the batch.
    pub fn hydrate(&mut self, batch: QuestDecodeBatch, table: &QuestTable) -> HydrateReport {
        let mut report = HydrateReport::default();

        for (record, _) in batch.records {
            let id = record.quest_id;
            if self.is_bound(id) {
                warn!("Duplicate quest record dropped for quest: {}", id);
                report.dropped += 1;
                continue;
            }

            let Some(handle) = table.lookup(id) else {
                warn!("Quest not found: {}. Marking as inactive.", id);
                self.keep_inactive(record);
                report.inactive += 1;
                continue;
            };

            let mut context = table.get(handle).new_context();
            let resumed = context
                .set_state(&record.state, false)
                .and_then(|()| context.unserialize_progress(&record.progress));

            match resumed {
                Ok(()) => {
                    self.active.insert(id, ActiveQuest { handle, context });
                    report.resumed += 1;
                }
                Err(err) => {
                    warn!("{}", err);
                    warn!("Could not resume quest: {}. Marking as inactive.", id);
                    self.keep_inactive(record);
                    report.inactive += 1;
                }
            }
        }

        report
    }

    /// Start `id` fresh in `state`. An inactive record for the same id stays
    /// behind and is shadowed on save.
    pub fn start(&mut self, id: QuestId, state: &str, table: &QuestTable) -> Result<bool, QuestRuntimeError> {
        if self.active.contains_key(&id) {
            return Ok(false);
        }
        let Some(handle) = table.lookup(id) else {
            return Ok(false);
        };
        let definition = table.get(handle);
        if definition.disabled() {
            return Ok(false);
        }
        let mut context = definition.new_context();
        context.set_state(state, true)?;
        debug!("started quest {} ({}) in state {}", id, definition.name(), state);
        self.active.insert(id, ActiveQuest { handle, context });
        Ok(true)
    }

    pub fn reset(&mut self, id: QuestId) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Run every active context's rules, starting over whenever one asks
    /// for it. At most `RESTART_BUDGET_PER_QUEST` restarts per active quest
    /// are honoured before the pass gives up.
    pub fn check_rules(&mut self, subject: &mut dyn QuestSubject) -> RuleCheckReport {
        let budget = self.active.len().max(1) * RESTART_BUDGET_PER_QUEST;
        let mut report = RuleCheckReport::default();

        'scan: loop {
            let ids: Vec<QuestId> = self.active.keys().copied().collect();
            for id in ids {
                let Some(quest) = self.active.get_mut(&id) else {
                    continue;
                };
                match quest.context.check_rules(subject) {
                    RuleCheck::Unchanged => continue,
                    RuleCheck::Restart => {}
                    RuleCheck::Finished => {
                        self.active.remove(&id);
                    }
                }

                if report.restarts >= budget {
                    warn!("quest rule check gave up after {} restarts", report.restarts);
                    report.exhausted = true;
                    break 'scan;
                }
                report.restarts += 1;
                continue 'scan;
            }
            break;
        }

        report
    }

    pub fn notify_spell(&mut self, spell: SpellId) {
        for quest in self.active.values_mut() {
            quest.context.used_spell(spell);
        }
    }

    /// Active records first, then inactive records not shadowed by a
    /// restarted quest.
    pub fn to_records(&self) -> Vec<QuestRecord> {
        let mut records: Vec<QuestRecord> = self
            .active
            .iter()
            .map(|(id, quest)| {
                QuestRecord::new(*id, quest.context.state_name(), quest.context.serialize_progress())
            })
            .collect();
        for record in self.inactive.values() {
            if self.active.contains_key(&record.quest_id) {
                debug!("Discarding inactive quest save as the quest was restarted: {}", record.quest_id);
                continue;
            }
            records.push(record.clone());
        }
        records
    }
}
