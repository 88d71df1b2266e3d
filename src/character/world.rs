use log::info;
use std::sync::Arc;

use super::defs::DefinitionTables;
use super::errors::CharacterError;
use super::formula::FormulaSet;
use super::quest::QuestTable;
use super::quest_catalog::QuestCatalog;
use super::storage::{CharacterStore, SledCharacterStore};
use crate::config::{CharacterConfig, Config};

/// Shared, read-mostly context every character of one server points at.
pub struct World {
    pub config: CharacterConfig,
    pub formulas: FormulaSet,
    pub tables: DefinitionTables,
    pub quests: QuestTable,
    pub store: Arc<dyn CharacterStore>,
    bots: Vec<String>,
}

impl World {
    /// Compile the configured formulas and assemble the world. Any formula
    /// that fails to compile rejects the configuration.
    pub fn new(
        config: &Config,
        tables: DefinitionTables,
        quests: QuestTable,
        store: Arc<dyn CharacterStore>,
    ) -> Result<Self, CharacterError> {
        let formulas = FormulaSet::compile(config.formulas.iter())
            .map_err(|(key, source)| CharacterError::Formula { key, source })?;
        Ok(Self {
            config: config.character.clone(),
            formulas,
            tables,
            quests,
            bots: config.character.bot_names(),
            store,
        })
    }

    /// Load seeds and open the Sled store named by `config.storage`.
    pub fn from_config(config: &Config) -> Result<Self, CharacterError> {
        let tables = match &config.storage.definitions {
            Some(path) => DefinitionTables::load(path)?,
            None => DefinitionTables::default(),
        };
        let quests = match &config.storage.quests {
            Some(path) => QuestCatalog::load(path)?.into_table(),
            None => QuestTable::new(),
        };
        let store = SledCharacterStore::open(config.storage.db_path())?;
        info!(
            "world ready: {} items, {} quests, {} formulas",
            tables.item_count(),
            quests.len(),
            config.formulas.len()
        );
        Self::new(config, tables, quests, Arc::new(store))
    }

    pub fn is_bot(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.bots.iter().any(|bot| *bot == name)
    }
}
