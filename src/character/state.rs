//! The character aggregate: one player's persisted sheet plus the runtime
//! pieces (quest binding, trade half, spell cast) and the collaborators it
//! reports to.
//!
//! Two-party operations (trades, teardown on warp/logout) live on
//! [`super::registry::CharacterRegistry`], which locks both sides in id order.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use super::codec::{
    decode_items, decode_paperdoll, decode_quests, decode_spells, encode_items, encode_paperdoll,
    encode_quest_records, encode_spells,
};
use super::defs::ItemSpecial;
use super::equipment;
use super::errors::CharacterError;
use super::formula::FormulaVars;
use super::interfaces::{SessionSink, WorldMap};
use super::paperdoll::EquipLocation;
use super::quest::{ActiveQuest, HydrateReport, QuestBinding, QuestSubject, RuleCheckReport};
use super::sheet::CharacterSheet;
use super::spell::{target_allowed, SpellCast, SpellTarget, TimerOutcome};
use super::stats::{self, StatInputs};
use super::storage::{Column, Row, RowReader};
use super::trade::{OfferLimits, TradeState};
use super::types::{
    AdminLevel, Attributes, CharacterId, Direction, Gender, ItemEntry, ItemId, OutboundMessage,
    QuestId, SitState, SpellEntry, SpellId,
};
use super::world::World;
use crate::logutil::preview_blob;

/// Quest started on every login when defined.
pub const DEFAULT_QUEST: QuestId = 0;

/// Extra recompute passes allowed after quest side effects dirty the stats.
const MAX_RECOMPUTE_FOLLOWUPS: usize = 2;

/// Lowercase ASCII letters, 4 to 12 characters, not reserved.
pub fn valid_name(name: &str) -> bool {
    (4..=12).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_lowercase())
        && name != "server"
}

pub struct Character {
    world: Arc<World>,
    id: CharacterId,
    pid: u16,
    sheet: CharacterSheet,
    quests: QuestBinding,
    /// Stored quest column until login hydrates it.
    quest_blob: String,
    pub(crate) trade: TradeState,
    cast: SpellCast,
    session: Arc<dyn SessionSink>,
    map: Option<Arc<dyn WorldMap>>,
    online: bool,
    bot: bool,
    login_time: Option<DateTime<Utc>>,
    muted_until: Option<DateTime<Utc>>,
    recomputing: bool,
    stats_dirty: bool,
    checking_quests: bool,
}

impl Character {
    /// Column set of a freshly created character.
    pub fn blank_row(name: &str) -> Row {
        let mut row = Row::new();
        for text in ["title", "home", "fiance", "partner", "guild", "inventory", "bank", "spells", "quest"] {
            row.insert(text.to_string(), Column::Text(String::new()));
        }
        row.insert("name".into(), Column::Text(name.to_string()));
        row.insert("paperdoll".into(), Column::Text(encode_paperdoll(&Default::default())));
        for int in [
            "admin", "class", "gender", "race", "hairstyle", "haircolor", "map", "x", "y", "direction",
            "sitting", "hidden", "level", "exp", "hp", "tp", "str", "int", "wis", "agi", "con", "cha",
            "statpoints", "skillpoints", "karma", "bankmax", "goldbank", "usage", "guild_rank",
        ] {
            row.insert(int.to_string(), Column::Int(0));
        }
        row.insert("whispers".into(), Column::Int(1));
        row
    }

    /// Build a character from its stored row. Blobs decode leniently; a
    /// missing or mistyped scalar column is an error.
    pub fn from_row(
        world: Arc<World>,
        id: CharacterId,
        row: &Row,
        session: Arc<dyn SessionSink>,
    ) -> Result<Self, CharacterError> {
        let name = match row.get("name") {
            Some(Column::Text(name)) => name.clone(),
            _ => {
                return Err(CharacterError::Column {
                    name: format!("#{}", id.0),
                    column: "name",
                    reason: "missing".into(),
                })
            }
        };
        let r = RowReader::new(&name, row);

        let sheet = CharacterSheet {
            name: name.clone(),
            title: r.text_or_empty("title")?.to_string(),
            home: r.text_or_empty("home")?.to_string(),
            fiance: r.text_or_empty("fiance")?.to_string(),
            partner: r.text_or_empty("partner")?.to_string(),
            admin: AdminLevel::from_i64(r.int("admin")?),
            class: r.int_as("class")?,
            gender: Gender::from_i64(r.int("gender")?),
            race: r.int_as("race")?,
            hairstyle: r.int_as("hairstyle")?,
            haircolor: r.int_as("haircolor")?,
            map_id: r.int_as("map")?,
            x: r.int_as("x")?,
            y: r.int_as("y")?,
            direction: Direction::from_i64(r.int("direction")?),
            sitting: SitState::from_i64(r.int("sitting")?),
            hidden: r.int("hidden")? != 0,
            whispers: r.int("whispers")? != 0,
            level: r.int_as("level")?,
            exp: r.int_as("exp")?,
            hp: r.int_as("hp")?,
            tp: r.int_as("tp")?,
            base: Attributes {
                str: r.int_as("str")?,
                intl: r.int_as("int")?,
                wis: r.int_as("wis")?,
                agi: r.int_as("agi")?,
                con: r.int_as("con")?,
                cha: r.int_as("cha")?,
            },
            statpoints: r.int_as("statpoints")?,
            skillpoints: r.int_as("skillpoints")?,
            karma: r.int_as("karma")?,
            bankmax: r.int_as("bankmax")?,
            goldbank: r.int_as("goldbank")?,
            usage: r.int_as("usage")?,
            guild_tag: r.text_or_empty("guild")?.to_string(),
            guild_rank: r.int_as("guild_rank")?,
            inventory: decode_items(r.text("inventory")?),
            bank: decode_items(r.text("bank")?),
            paperdoll: decode_paperdoll(r.text("paperdoll")?),
            spells: decode_spells(r.text("spells")?),
            ..Default::default()
        };

        let quest_blob = r.text_or_empty("quest")?.to_string();
        debug!("loaded {} (quest column {})", name, preview_blob(&quest_blob));

        Ok(Self {
            bot: world.is_bot(&name),
            world,
            id,
            pid: (id.0 & 0xFFFF) as u16,
            sheet,
            quests: QuestBinding::default(),
            quest_blob,
            trade: TradeState::default(),
            cast: SpellCast::default(),
            session,
            map: None,
            online: false,
            login_time: None,
            muted_until: None,
            recomputing: false,
            stats_dirty: false,
            checking_quests: false,
        })
    }

    /// Every persisted column. The quest column is the untouched stored
    /// blob until login hydrated it.
    pub fn to_row(&self) -> Row {
        let s = &self.sheet;
        let quest = if !self.quest_blob.is_empty() {
            self.quest_blob.clone()
        } else {
            encode_quest_records(&self.quests.to_records())
        };

        let mut row = Row::new();
        let mut text = |key: &str, value: String| {
            row.insert(key.to_string(), Column::Text(value));
        };
        text("name", s.name.clone());
        text("title", s.title.clone());
        text("home", s.home.clone());
        text("fiance", s.fiance.clone());
        text("partner", s.partner.clone());
        text("guild", s.guild_tag.clone());
        text("inventory", encode_items(&s.inventory));
        text("bank", encode_items(&s.bank));
        text("paperdoll", encode_paperdoll(&s.paperdoll));
        text("spells", encode_spells(&s.spells));
        text("quest", quest);

        let ints = [
            ("admin", s.admin.as_i64()),
            ("class", i64::from(s.class)),
            ("gender", s.gender.as_i64()),
            ("race", i64::from(s.race)),
            ("hairstyle", i64::from(s.hairstyle)),
            ("haircolor", i64::from(s.haircolor)),
            ("map", i64::from(s.map_id)),
            ("x", i64::from(s.x)),
            ("y", i64::from(s.y)),
            ("direction", s.direction.as_i64()),
            ("sitting", s.sitting.as_i64()),
            ("hidden", i64::from(s.hidden)),
            ("whispers", i64::from(s.whispers)),
            ("level", i64::from(s.level)),
            ("exp", i64::from(s.exp)),
            ("hp", i64::from(s.hp)),
            ("tp", i64::from(s.tp)),
            ("str", i64::from(s.base.str)),
            ("int", i64::from(s.base.intl)),
            ("wis", i64::from(s.base.wis)),
            ("agi", i64::from(s.base.agi)),
            ("con", i64::from(s.base.con)),
            ("cha", i64::from(s.base.cha)),
            ("statpoints", i64::from(s.statpoints)),
            ("skillpoints", i64::from(s.skillpoints)),
            ("karma", i64::from(s.karma)),
            ("bankmax", i64::from(s.bankmax)),
            ("goldbank", i64::from(s.goldbank)),
            ("usage", i64::from(self.usage())),
            ("guild_rank", i64::from(s.guild_rank)),
        ];
        for (key, value) in ints {
            row.insert(key.to_string(), Column::Int(value));
        }
        row
    }

    // ------------------------------------------------------------------
    // Identity and session
    // ------------------------------------------------------------------

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    /// Map-local player id.
    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn set_pid(&mut self, pid: u16) {
        self.pid = pid;
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn sheet(&self) -> &CharacterSheet {
        &self.sheet
    }

    /// Direct sheet access for tooling. Call `calculate_stats` afterwards.
    pub fn sheet_mut(&mut self) -> &mut CharacterSheet {
        &mut self.sheet
    }

    pub fn trade(&self) -> &TradeState {
        &self.trade
    }

    pub fn cast(&self) -> &SpellCast {
        &self.cast
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_bot(&self) -> bool {
        self.bot
    }

    pub fn send(&self, message: OutboundMessage) {
        self.session.send(message);
    }

    pub fn status(&self, message: impl Into<String>) {
        self.session.send(OutboundMessage::Status(message.into()));
    }

    /// Minutes played including the running session.
    pub fn usage(&self) -> i32 {
        let session = self
            .login_time
            .map(|login| (Utc::now() - login).num_minutes())
            .unwrap_or(0);
        self.sheet
            .usage
            .saturating_add(i32::try_from(session).unwrap_or(i32::MAX))
    }

    pub fn mute(&mut self, by: &str) {
        self.muted_until = Some(Utc::now() + Duration::seconds(self.world.config.mute_length_secs));
        info!("{} muted by {}", self.sheet.name, by);
        self.send(OutboundMessage::Muted { by: by.to_string() });
    }

    pub fn is_muted(&self) -> bool {
        self.muted_until.is_some_and(|until| until > Utc::now())
    }

    pub fn map(&self) -> Option<&Arc<dyn WorldMap>> {
        self.map.as_ref()
    }

    /// Rebind to `map` at (`x`, `y`). An open trade must already be torn
    /// down; the registry's `warp` does both.
    pub(crate) fn warp(&mut self, map: Arc<dyn WorldMap>, x: u8, y: u8) {
        self.sheet.map_id = map.id();
        self.sheet.x = x;
        self.sheet.y = y;
        self.sheet.sitting = SitState::Stand;
        self.map = Some(map);
    }

    /// Attach to the map without the warp semantics; used on login.
    pub fn place(&mut self, map: Arc<dyn WorldMap>) {
        self.sheet.map_id = map.id();
        self.map = Some(map);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bind the stored quest column to the quest engine. Runs once; later
    /// calls find nothing left to hydrate. Login does this itself.
    pub fn hydrate_quests(&mut self) -> HydrateReport {
        let blob = std::mem::take(&mut self.quest_blob);
        if blob.is_empty() {
            return HydrateReport::default();
        }
        let world = Arc::clone(&self.world);
        self.quests.hydrate(decode_quests(&blob), &world.quests)
    }

    /// Hydrate quests, start the default quest and mark the character online.
    pub fn login(&mut self) -> HydrateReport {
        self.calculate_stats(false);

        let report = self.hydrate_quests();
        let world = Arc::clone(&self.world);

        if let Err(err) = self.quests.start(DEFAULT_QUEST, "begin", &world.quests) {
            warn!("{}: default quest not started: {}", self.sheet.name, err);
        }

        self.online = true;
        self.login_time = Some(Utc::now());
        info!(
            "{} logged in ({} quests resumed, {} inactive)",
            self.sheet.name, report.resumed, report.inactive
        );
        self.calculate_stats(true);
        report
    }

    /// Fold the session into the stored usage and go offline. Returns the
    /// row to persist. Trade teardown is the registry's job.
    pub(crate) fn prepare_logout(&mut self) -> Row {
        self.cast.cancel();
        self.sheet.usage = self.usage();
        self.login_time = None;
        self.online = false;
        self.to_row()
    }

    /// Synchronous logout: go offline and write the row.
    pub fn logout(&mut self) -> Result<(), CharacterError> {
        if !self.online {
            return Ok(());
        }
        let row = self.prepare_logout();
        self.world.store.update_row(&self.sheet.name, &row)?;
        info!("{} logged out", self.sheet.name);
        Ok(())
    }

    /// Blocking save of the current row.
    pub fn save(&self) -> Result<(), CharacterError> {
        debug!("Saving character '{}'", self.sheet.name);
        self.world.store.update_row(&self.sheet.name, &self.to_row())
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Recompute derived stats. A recompute requested while one is running
    /// (from a quest side effect) is folded into a follow-up pass. Quest
    /// rules only run on the first pass.
    pub fn calculate_stats(&mut self, trigger_quests: bool) {
        if self.recomputing {
            self.stats_dirty = true;
            return;
        }
        self.recomputing = true;

        let mut pass = 0;
        loop {
            self.stats_dirty = false;
            let world = Arc::clone(&self.world);
            let inputs = StatInputs {
                tables: &world.tables,
                formulas: &world.formulas,
                config: &world.config,
                bot: self.bot,
                usage: self.usage(),
            };
            let outcome = stats::recompute(&mut self.sheet, &inputs);
            if let Some((hp, tp)) = outcome.recovered {
                self.send(OutboundMessage::Recover { hp, tp });
            }
            if trigger_quests && pass == 0 {
                self.check_quest_rules();
            }
            if !self.stats_dirty {
                break;
            }
            pass += 1;
            if pass > MAX_RECOMPUTE_FOLLOWUPS {
                warn!("{}: stats still dirty after {} follow-up passes", self.sheet.name, pass);
                self.stats_dirty = false;
                break;
            }
        }

        self.recomputing = false;
    }

    pub fn formula_vars(&self) -> FormulaVars {
        stats::formula_vars(&self.sheet, self.bot, self.usage())
    }

    /// Zero attributes and spells, refund stat and skill points.
    pub fn reset(&mut self) {
        self.sheet.base = Attributes::default();
        self.sheet.spells.clear();
        self.cast.cancel();
        let level = i32::from(self.sheet.level);
        self.sheet.statpoints = level * self.world.config.stat_per_level;
        self.sheet.skillpoints = level * self.world.config.skill_per_level;
        self.calculate_stats(true);
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    /// Owned amount. While trading, unless `include_trade`, the offered
    /// escrow is subtracted.
    pub fn has_item(&self, item: ItemId, include_trade: bool) -> i32 {
        let owned = self.sheet.owned(item);
        if self.trade.is_trading() && !include_trade {
            (owned - self.trade.offered(item)).max(0)
        } else {
            owned
        }
    }

    pub fn add_item(&mut self, item: ItemId, amount: i32) -> bool {
        if amount <= 0 || !self.world.tables.item_exists(item) {
            return false;
        }
        if !self.sheet.push_item(item, amount, self.world.config.max_item) {
            return false;
        }
        self.calculate_stats(true);
        true
    }

    pub fn del_item(&mut self, item: ItemId, amount: i32) -> bool {
        if amount <= 0 || !self.sheet.take_item(item, amount) {
            return false;
        }
        self.calculate_stats(true);
        true
    }

    /// How many of `item` (up to `max_amount`) can be picked up.
    pub fn can_hold_item(&self, item: ItemId, max_amount: i32) -> i32 {
        let mut amount = max_amount;
        if self.world.config.enforce_weight >= 2 {
            let data = self.world.tables.item(item);
            let derived = &self.sheet.derived;
            if derived.weight > derived.max_weight {
                amount = 0;
            } else if data.weight > 0 {
                amount = ((derived.max_weight - derived.weight) / data.weight).min(max_amount);
            }
        }
        amount.min(self.world.config.max_item)
    }

    /// Strip every droppable item. Lore items stay in the inventory; Lore
    /// and Cursed items stay equipped. Returns what was dropped.
    pub fn drop_all(&mut self) -> Vec<ItemEntry> {
        let tables = &self.world.tables;
        let mut dropped = Vec::new();

        self.sheet.inventory.retain(|entry| {
            if tables.item(entry.id).special == ItemSpecial::Lore {
                return true;
            }
            dropped.push(*entry);
            false
        });

        let equipped: Vec<(EquipLocation, ItemId)> = self.sheet.paperdoll.equipped().collect();
        for (location, item) in equipped {
            let special = tables.item(item).special;
            if matches!(special, ItemSpecial::Lore | ItemSpecial::Cursed) {
                continue;
            }
            self.sheet.paperdoll.set(location, 0);
            dropped.push(ItemEntry::new(item, 1));
        }

        if let Some(map) = &self.map {
            map.drop_items(self.id, &dropped);
        }
        debug!("{} dropped {} stacks", self.sheet.name, dropped.len());
        self.calculate_stats(true);
        dropped
    }

    // ------------------------------------------------------------------
    // Equipment
    // ------------------------------------------------------------------

    pub fn equip(&mut self, item: ItemId, subloc: u8) -> bool {
        let available = self.has_item(item, false);
        let world = Arc::clone(&self.world);
        match equipment::equip(&mut self.sheet, &world.tables, item, subloc, available) {
            Ok(location) => {
                debug!("{} equipped {} in {:?}", self.sheet.name, item, location);
                self.calculate_stats(true);
                true
            }
            Err(rejection) => {
                if let Some(message) = rejection.status_message() {
                    self.status(message);
                }
                debug!("{} equip {} refused: {:?}", self.sheet.name, item, rejection);
                false
            }
        }
    }

    pub fn unequip(&mut self, item: ItemId, subloc: u8) -> bool {
        if item == 0 {
            return false;
        }
        let max_item = self.world.config.max_item;
        if equipment::unequip(&mut self.sheet, item, subloc, max_item).is_none() {
            return false;
        }
        self.calculate_stats(true);
        true
    }

    // ------------------------------------------------------------------
    // Spellbook and casting
    // ------------------------------------------------------------------

    pub fn has_spell(&self, spell: SpellId) -> bool {
        self.sheet.has_spell(spell)
    }

    pub fn spell_level(&self, spell: SpellId) -> i16 {
        self.sheet.spell_level(spell)
    }

    pub fn add_spell(&mut self, spell: SpellId) -> bool {
        if !self.world.tables.spell_exists(spell) || self.has_spell(spell) {
            return false;
        }
        self.sheet.spells.push(SpellEntry::new(spell, 0));
        self.check_quest_rules();
        true
    }

    pub fn del_spell(&mut self, spell: SpellId) -> bool {
        let before = self.sheet.spells.len();
        self.sheet.spells.retain(|entry| entry.id != spell);
        let removed = self.sheet.spells.len() != before;
        self.check_quest_rules();
        removed
    }

    /// Start casting a known spell. Returns the timer generation and the
    /// cast delay in spell ticks, or `None` when the spell is not known.
    pub(crate) fn begin_cast(&mut self, spell: SpellId) -> Option<(u64, u8)> {
        if !self.has_spell(spell) {
            return None;
        }
        let cast_time = self.world.tables.spell(spell).cast_time;
        Some((self.cast.begin(spell), cast_time))
    }

    pub(crate) fn cast_mut(&mut self) -> &mut SpellCast {
        &mut self.cast
    }

    /// Timer callback for the cast of `generation`.
    pub fn on_spell_timer(&mut self, generation: u64) -> bool {
        match self.cast.timer_fired(generation) {
            TimerOutcome::Act => self.spell_act(),
            TimerOutcome::AwaitTarget | TimerOutcome::Stale => false,
        }
    }

    /// Choose the cast target; resolves at once if the cast is ready.
    pub fn select_spell_target(&mut self, target: SpellTarget) -> bool {
        if self.cast.select_target(target) {
            return self.spell_act();
        }
        false
    }

    pub fn cancel_spell(&mut self) {
        self.cast.cancel();
    }

    /// Resolve the pending action. Target mismatches abort silently.
    fn spell_act(&mut self) -> bool {
        let Some((spell_id, target)) = self.cast.take_action() else {
            return false;
        };
        let spell = self.world.tables.spell(spell_id);
        if !target_allowed(spell, target, self.pid) {
            debug!("{} cast {} at {:?} rejected", self.sheet.name, spell_id, target);
            return false;
        }
        let Some(map) = self.map.clone() else {
            debug!("{} cast {} without a map", self.sheet.name, spell_id);
            return false;
        };

        match target {
            SpellTarget::SelfCast => map.spell_self(self.id, spell_id),
            SpellTarget::Npc(index) => {
                if !map.spell_attack_npc(self.id, index, spell_id) {
                    debug!("npc {} gone before {} resolved", index, spell_id);
                }
            }
            SpellTarget::Player(pid) => {
                if let Some(victim) = map.player_by_pid(pid) {
                    map.spell_attack_player(self.id, victim, spell_id);
                }
            }
            SpellTarget::Group => map.spell_group(self.id, spell_id),
        }

        self.quests.notify_spell(spell_id);
        true
    }

    // ------------------------------------------------------------------
    // Trade (this side only)
    // ------------------------------------------------------------------

    /// Offer `amount` of `item` to the current partner.
    pub(crate) fn add_trade_item(&mut self, item: ItemId, amount: i32) -> bool {
        if !self.world.tables.item_exists(item) {
            return false;
        }
        let limits = OfferLimits::from_config(&self.world.config);
        let owned = self.has_item(item, true);
        if !self.trade.add_offer(item, amount, owned, limits) {
            return false;
        }
        self.check_quest_rules();
        true
    }

    pub(crate) fn remove_trade_item(&mut self, item: ItemId) -> bool {
        if !self.trade.remove_offer(item) {
            return false;
        }
        self.check_quest_rules();
        true
    }

    /// Reset this side of the trade and tell the session.
    pub(crate) fn end_trade(&mut self, completed: bool) -> Option<CharacterId> {
        let partner = self.trade.close()?;
        let message = if completed {
            OutboundMessage::TradeCompleted { partner }
        } else {
            OutboundMessage::TradeClosed { partner }
        };
        self.send(message);
        self.check_quest_rules();
        Some(partner)
    }

    // ------------------------------------------------------------------
    // Quests
    // ------------------------------------------------------------------

    pub fn get_quest(&self, id: QuestId) -> Option<&ActiveQuest> {
        self.quests.get(id)
    }

    pub fn quests(&self) -> &QuestBinding {
        &self.quests
    }

    pub fn reset_quest(&mut self, id: QuestId) -> bool {
        self.quests.reset(id)
    }

    /// Start quest `id` in `state` unless it is already active.
    pub fn start_quest(&mut self, id: QuestId, state: &str) -> Result<bool, CharacterError> {
        let world = Arc::clone(&self.world);
        let started = self.quests.start(id, state, &world.quests)?;
        if started {
            self.check_quest_rules();
        }
        Ok(started)
    }

    /// Run every active quest's rules. Re-entrant calls from quest side
    /// effects return immediately.
    pub fn check_quest_rules(&mut self) -> RuleCheckReport {
        if self.checking_quests {
            return RuleCheckReport::default();
        }
        self.checking_quests = true;
        let mut binding = std::mem::take(&mut self.quests);
        let report = binding.check_rules(self);
        self.quests = binding;
        self.checking_quests = false;
        report
    }
}

impl QuestSubject for Character {
    fn quest_vars(&self) -> FormulaVars {
        self.formula_vars()
    }

    fn has_item(&self, item: ItemId) -> i32 {
        Character::has_item(self, item, false)
    }

    fn add_item(&mut self, item: ItemId, amount: i32) -> bool {
        Character::add_item(self, item, amount)
    }

    fn del_item(&mut self, item: ItemId, amount: i32) -> bool {
        Character::del_item(self, item, amount)
    }

    fn has_spell(&self, spell: SpellId) -> bool {
        Character::has_spell(self, spell)
    }

    fn status(&mut self, message: &str) {
        Character::status(self, message);
    }
}

impl Drop for Character {
    fn drop(&mut self) {
        if !self.online {
            return;
        }
        if let Err(err) = self.logout() {
            warn!("Failed to save {} on drop: {}", self.sheet.name, err);
        }
    }
}
