//! Test utilities & fixtures.
//! Builds a throwaway world (temp Sled store, small definition tables) plus
//! recording doubles for the session sink and the map.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use charcore::character::{
    CharacterHandle, CharacterId, CharacterRegistry, ClassData, DefinitionTables, ItemData,
    ItemEntry, ItemKind, ItemSpecial, ItemSubtype, OutboundMessage, QuestCatalog, QuestTable,
    SessionSink, SledCharacterStore, SpellData, SpellId, World, WorldMap,
};
use charcore::character::defs::{SpellKind, SpellTargetKind, TargetRestrict};
use charcore::character::types::{Attributes, Gender};
use charcore::config::{default_formulas, Config};
use tempfile::TempDir;

pub const GOLD: i16 = 1;
pub const GREATSWORD: i16 = 2;
pub const BUCKLER: i16 = 3;
pub const QUIVER: i16 = 4;
pub const TWIN_BLADE: i16 = 5;
pub const STR_RING: i16 = 6;
pub const ROCK: i16 = 7;
pub const GOWN: i16 = 8;
pub const TUNIC: i16 = 9;
pub const LORE_TOKEN: i16 = 10;
pub const CURSED_RING: i16 = 11;
pub const KNIGHT_HELM: i16 = 12;

pub const HEAL: SpellId = 1;
pub const FIREBALL: SpellId = 2;
pub const SELF_WARD: SpellId = 3;
pub const RALLY: SpellId = 4;

pub const KNIGHT: u8 = 2;
pub const PALADIN: u8 = 3;

pub fn tables() -> DefinitionTables {
    let item = |id: i16, name: &str, kind: ItemKind| ItemData {
        id,
        name: name.into(),
        kind,
        ..Default::default()
    };
    DefinitionTables::from_records(
        vec![
            item(GOLD, "Gold", ItemKind::Currency),
            ItemData {
                subtype: ItemSubtype::TwoHanded,
                weight: 10,
                min_damage: 5,
                max_damage: 9,
                ..item(GREATSWORD, "Greatsword", ItemKind::Weapon)
            },
            ItemData { weight: 5, armor: 3, ..item(BUCKLER, "Buckler", ItemKind::Shield) },
            ItemData { subtype: ItemSubtype::Arrows, ..item(QUIVER, "Quiver", ItemKind::Shield) },
            ItemData {
                subtype: ItemSubtype::TwoHanded,
                dual_wield_graphic: 7,
                ..item(TWIN_BLADE, "Twin blade", ItemKind::Weapon)
            },
            ItemData {
                bonus: Attributes { str: 4, ..Default::default() },
                ..item(STR_RING, "Ring of might", ItemKind::Ring)
            },
            ItemData { weight: 40, ..item(ROCK, "Rock", ItemKind::General) },
            ItemData { gender: Gender::Female, ..item(GOWN, "Gown", ItemKind::Armor) },
            ItemData { gender: Gender::Male, ..item(TUNIC, "Tunic", ItemKind::Armor) },
            ItemData { special: ItemSpecial::Lore, ..item(LORE_TOKEN, "Token", ItemKind::General) },
            ItemData { special: ItemSpecial::Cursed, ..item(CURSED_RING, "Cursed ring", ItemKind::Ring) },
            ItemData {
                level_req: 5,
                class_req: KNIGHT,
                ..item(KNIGHT_HELM, "Knight helm", ItemKind::Hat)
            },
        ],
        vec![
            ClassData { id: 1, name: "Priest".into(), archetype: 1, ..Default::default() },
            ClassData { id: KNIGHT, name: "Knight".into(), archetype: 2, ..Default::default() },
            ClassData { id: PALADIN, name: "Paladin".into(), base: KNIGHT, archetype: 2, ..Default::default() },
        ],
        vec![
            SpellData {
                id: HEAL,
                name: "Heal".into(),
                kind: SpellKind::Heal,
                target: SpellTargetKind::Normal,
                restrict: TargetRestrict::Friendly,
                cast_time: 2,
                ..Default::default()
            },
            SpellData {
                id: FIREBALL,
                name: "Fireball".into(),
                kind: SpellKind::Damage,
                target: SpellTargetKind::Normal,
                restrict: TargetRestrict::Opponent,
                cast_time: 1,
                ..Default::default()
            },
            SpellData {
                id: SELF_WARD,
                name: "Ward".into(),
                kind: SpellKind::Heal,
                target: SpellTargetKind::SelfOnly,
                restrict: TargetRestrict::Friendly,
                cast_time: 1,
                ..Default::default()
            },
            SpellData {
                id: RALLY,
                name: "Rally".into(),
                kind: SpellKind::Heal,
                target: SpellTargetKind::Group,
                restrict: TargetRestrict::Friendly,
                cast_time: 1,
                ..Default::default()
            },
        ],
    )
}

/// Quest 0 hands out gold once the character used Heal; quest 7 loops
/// forever between two states.
pub const QUESTS_JSON: &str = r#"{"quests": [
    {"id": 0, "name": "Tutorial", "states": [
        {"name": "begin", "message": "Welcome!", "rules": [{"when": "spell_1 >= 1", "goto": "reward"}]},
        {"name": "reward", "give": [{"id": 1, "amount": 50}], "rules": [{"goto": "done"}]},
        {"name": "done"}
    ]},
    {"id": 3, "name": "Collector", "states": [
        {"name": "begin", "rules": [{"when": "items >= 2", "goto": "finish"}]},
        {"name": "finish", "reset": true}
    ]},
    {"id": 7, "name": "Loop", "states": [
        {"name": "ping", "rules": [{"goto": "pong"}]},
        {"name": "pong", "rules": [{"goto": "ping"}]}
    ]},
    {"id": 9, "name": "Retired", "disabled": true, "states": [{"name": "begin"}]}
]}"#;

#[allow(dead_code)]
pub fn quests() -> QuestTable {
    QuestCatalog::from_json_str(QUESTS_JSON).expect("catalog").into_table()
}

pub struct TestWorld {
    pub world: Arc<World>,
    pub dir: TempDir,
}

/// World over a fresh temp store. `tweak` adjusts the config first.
#[allow(dead_code)]
pub fn world_with(quests: QuestTable, tweak: impl FnOnce(&mut Config)) -> TestWorld {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config {
        formulas: default_formulas(),
        ..Config::default()
    };
    config.character.spell_tick_ms = 5;
    tweak(&mut config);
    let store = Arc::new(SledCharacterStore::open(dir.path()).expect("store"));
    let world = World::new(&config, tables(), quests, store).expect("world");
    TestWorld { world: Arc::new(world), dir }
}

#[allow(dead_code)]
pub fn world() -> TestWorld {
    world_with(QuestTable::new(), |_| {})
}

/// Session sink that keeps every message for later inspection.
#[derive(Default)]
pub struct RecordingSession {
    messages: Mutex<Vec<OutboundMessage>>,
}

#[allow(dead_code)]
impl RecordingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().expect("messages").clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                OutboundMessage::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl SessionSink for RecordingSession {
    fn send(&self, message: OutboundMessage) {
        self.messages.lock().expect("messages").push(message);
    }
}

/// Map double: records every spell resolution and drop.
#[derive(Default)]
pub struct MockMap {
    pub npcs: Mutex<HashSet<u16>>,
    pub players: Mutex<HashMap<u16, CharacterId>>,
    pub events: Mutex<Vec<String>>,
    pub dropped: Mutex<Vec<ItemEntry>>,
}

#[allow(dead_code)]
impl MockMap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_npc(self: Arc<Self>, index: u16) -> Arc<Self> {
        self.npcs.lock().expect("npcs").insert(index);
        self
    }

    pub fn with_player(self: Arc<Self>, pid: u16, id: CharacterId) -> Arc<Self> {
        self.players.lock().expect("players").insert(pid, id);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events").push(event);
    }
}

impl WorldMap for MockMap {
    fn id(&self) -> i16 {
        5
    }

    fn spell_self(&self, caster: CharacterId, spell: SpellId) {
        self.record(format!("self {} {}", caster.0, spell));
    }

    fn spell_attack_npc(&self, caster: CharacterId, npc_index: u16, spell: SpellId) -> bool {
        self.record(format!("npc {} {} {}", caster.0, npc_index, spell));
        self.npcs.lock().expect("npcs").contains(&npc_index)
    }

    fn player_by_pid(&self, pid: u16) -> Option<CharacterId> {
        self.players.lock().expect("players").get(&pid).copied()
    }

    fn spell_attack_player(&self, caster: CharacterId, victim: CharacterId, spell: SpellId) {
        self.record(format!("player {} {} {}", caster.0, victim.0, spell));
    }

    fn spell_group(&self, caster: CharacterId, spell: SpellId) {
        self.record(format!("group {} {}", caster.0, spell));
    }

    fn drop_items(&self, _owner: CharacterId, items: &[ItemEntry]) {
        self.dropped.lock().expect("dropped").extend_from_slice(items);
    }
}

/// Create, load and log in a character.
#[allow(dead_code)]
pub fn online(registry: &CharacterRegistry, name: &str, session: Arc<RecordingSession>) -> CharacterHandle {
    let handle = registry.create(name, session).expect("create");
    handle.lock().expect("lock").login();
    handle
}
