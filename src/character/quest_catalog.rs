//! JSON-seeded quest definitions.
//!
//! Each quest is a list of named states. A state may hand out or take items
//! and print a message when entered, and carries rules of the form
//! `{"when": "<formula>", "goto": "<state>"}` evaluated against the
//! character's formula variables merged with the quest's own progress
//! counters. `used_spell` bumps a `spell_<id>` counter.
//!
//! ```json
//! {"quests": [{"id": 0, "name": "Tutorial", "states": [
//!     {"name": "begin", "rules": [{"when": "spell_1 >= 1", "goto": "reward"}]},
//!     {"name": "reward", "give": [{"id": 1, "amount": 50}], "rules": [{"goto": "end"}]},
//!     {"name": "end"}
//! ]}]}
//! ```

use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::errors::{CharacterError, QuestRuntimeError};
use super::formula::Formula;
use super::quest::{QuestContext, QuestDefinition, QuestSubject, QuestTable, RuleCheck};
use super::types::{ItemEntry, QuestId, SpellId};

#[derive(Debug, Clone, Deserialize)]
struct RuleSeed {
    #[serde(default)]
    when: Option<String>,
    goto: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StateSeed {
    name: String,
    #[serde(default)]
    give: Vec<ItemEntry>,
    #[serde(default)]
    take: Vec<ItemEntry>,
    #[serde(default)]
    message: Option<String>,
    /// Entering this state ends the quest and drops its context.
    #[serde(default)]
    reset: bool,
    #[serde(default)]
    rules: Vec<RuleSeed>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestSeed {
    id: QuestId,
    name: String,
    #[serde(default)]
    disabled: bool,
    states: Vec<StateSeed>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct CatalogSeed {
    #[serde(default)]
    quests: Vec<QuestSeed>,
}

#[derive(Debug)]
struct Rule {
    when: Option<Formula>,
    goto: usize,
}

#[derive(Debug)]
struct State {
    name: String,
    give: Vec<ItemEntry>,
    take: Vec<ItemEntry>,
    message: Option<String>,
    reset: bool,
    rules: Vec<Rule>,
}

/// A compiled quest from the catalog.
#[derive(Debug)]
pub struct CatalogQuest {
    id: QuestId,
    name: String,
    disabled: bool,
    states: Vec<State>,
}

impl CatalogQuest {
    fn compile(seed: QuestSeed) -> Result<Self, CharacterError> {
        let index_of = |name: &str| seed.states.iter().position(|state| state.name == name);
        let mut states = Vec::with_capacity(seed.states.len());

        for state in &seed.states {
            let mut rules = Vec::with_capacity(state.rules.len());
            for rule in &state.rules {
                let goto = index_of(&rule.goto).ok_or_else(|| {
                    CharacterError::from(QuestRuntimeError::UnknownState {
                        quest: seed.id,
                        state: rule.goto.clone(),
                    })
                })?;
                let when = match &rule.when {
                    Some(text) => Some(Formula::parse(text).map_err(|source| CharacterError::Formula {
                        key: format!("quest.{}.{}", seed.id, state.name),
                        source,
                    })?),
                    None => None,
                };
                rules.push(Rule { when, goto });
            }
            states.push(State {
                name: state.name.clone(),
                give: state.give.clone(),
                take: state.take.clone(),
                message: state.message.clone(),
                reset: state.reset,
                rules,
            });
        }

        Ok(Self {
            id: seed.id,
            name: seed.name,
            disabled: seed.disabled,
            states,
        })
    }

    fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.name == name)
    }
}

/// Definition wrapper registered in the [`QuestTable`]; contexts share the
/// compiled quest through the `Arc`.
struct CatalogEntry(Arc<CatalogQuest>);

impl QuestDefinition for CatalogEntry {
    fn id(&self) -> QuestId {
        self.0.id
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn disabled(&self) -> bool {
        self.0.disabled
    }

    fn new_context(&self) -> Box<dyn QuestContext> {
        Box::new(CatalogContext {
            quest: Arc::clone(&self.0),
            state: 0,
            progress: BTreeMap::new(),
            pending_entry: false,
        })
    }
}

pub struct CatalogContext {
    quest: Arc<CatalogQuest>,
    state: usize,
    progress: BTreeMap<String, i64>,
    /// Entry actions of the current state still have to run.
    pending_entry: bool,
}

impl CatalogContext {
    fn enter(&mut self, subject: &mut dyn QuestSubject) {
        self.pending_entry = false;
        let state = &self.quest.states[self.state];
        for item in &state.take {
            subject.del_item(item.id, item.amount);
        }
        for item in &state.give {
            subject.add_item(item.id, item.amount);
        }
        if let Some(message) = &state.message {
            subject.status(message);
        }
    }

    fn rule_matches(&self, rule: &Rule, subject: &dyn QuestSubject) -> bool {
        let Some(when) = &rule.when else {
            return true;
        };
        let mut vars = subject.quest_vars();
        for (key, value) in &self.progress {
            vars.insert(key.clone(), *value as f64);
        }
        match when.eval(&vars) {
            Ok(value) => value != 0.0,
            Err(err) => {
                debug!("quest {} rule in state {} not met: {}", self.quest.id, self.state_name(), err);
                false
            }
        }
    }
}

impl QuestContext for CatalogContext {
    fn state_name(&self) -> &str {
        &self.quest.states[self.state].name
    }

    fn set_state(&mut self, state: &str, notify: bool) -> Result<(), QuestRuntimeError> {
        let index = self.quest.state_index(state).ok_or_else(|| QuestRuntimeError::UnknownState {
            quest: self.quest.id,
            state: state.to_string(),
        })?;
        self.state = index;
        self.progress.clear();
        self.pending_entry = notify;
        Ok(())
    }

    fn serialize_progress(&self) -> String {
        let entries: Vec<String> = self
            .progress
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    fn unserialize_progress(&mut self, progress: &str) -> Result<(), QuestRuntimeError> {
        let malformed = || QuestRuntimeError::MalformedProgress {
            quest: self.quest.id,
            progress: progress.to_string(),
        };
        let inner = progress
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(malformed)?;

        let mut parsed = BTreeMap::new();
        for entry in inner.split(',').filter(|entry| !entry.trim().is_empty()) {
            let (key, value) = entry.split_once('=').ok_or_else(malformed)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed());
            }
            let value = value.trim().parse::<i64>().map_err(|_| malformed())?;
            parsed.insert(key.to_string(), value);
        }
        self.progress = parsed;
        Ok(())
    }

    fn check_rules(&mut self, subject: &mut dyn QuestSubject) -> RuleCheck {
        if self.pending_entry {
            self.enter(subject);
            if self.quest.states[self.state].reset {
                return RuleCheck::Finished;
            }
        }

        let quest = Arc::clone(&self.quest);
        let Some(rule) = quest.states[self.state]
            .rules
            .iter()
            .find(|rule| self.rule_matches(rule, &*subject))
        else {
            return RuleCheck::Unchanged;
        };

        debug!(
            "quest {} {} -> {}",
            quest.id,
            quest.states[self.state].name,
            quest.states[rule.goto].name
        );
        self.state = rule.goto;
        self.progress.clear();
        self.enter(subject);
        if quest.states[self.state].reset {
            RuleCheck::Finished
        } else {
            RuleCheck::Restart
        }
    }

    fn used_spell(&mut self, spell: SpellId) {
        *self.progress.entry(format!("spell_{}", spell)).or_insert(0) += 1;
    }
}

/// Parsed catalog ready to be registered into a [`QuestTable`].
pub struct QuestCatalog {
    quests: Vec<Arc<CatalogQuest>>,
}

impl QuestCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, CharacterError> {
        let seed: CatalogSeed = serde_json::from_str(json)?;
        let quests = seed
            .quests
            .into_iter()
            .map(|quest| CatalogQuest::compile(quest).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { quests })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CharacterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn into_table(self) -> QuestTable {
        let mut table = QuestTable::new();
        for quest in self.quests {
            table.register(Box::new(CatalogEntry(quest)));
        }
        table
    }
}
