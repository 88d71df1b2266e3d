//! Loaded characters, their handles and every operation that has to touch
//! two characters at once.
//!
//! Pair operations always lock the lower [`CharacterId`] first so two trades
//! resolving concurrently cannot deadlock.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;

use super::errors::CharacterError;
use super::interfaces::{SessionSink, WorldMap};
use super::spell::SpellTarget;
use super::state::Character;
use super::trade::exchange;
use super::types::{CharacterId, ItemId, SpellId};
use super::world::World;

fn lock_character(cell: &Mutex<Character>) -> Result<MutexGuard<'_, Character>, CharacterError> {
    cell.lock()
        .map_err(|_| CharacterError::Internal("character lock poisoned".into()))
}

/// Shared handle to one loaded character.
#[derive(Clone)]
pub struct CharacterHandle {
    id: CharacterId,
    cell: Arc<Mutex<Character>>,
    /// Serialises saves of this character.
    save_gate: Arc<tokio::sync::Mutex<()>>,
}

impl CharacterHandle {
    fn new(character: Character) -> Self {
        Self {
            id: character.id(),
            cell: Arc::new(Mutex::new(character)),
            save_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Character>, CharacterError> {
        lock_character(&self.cell)
    }

    /// Persist the current row. Saves of the same character never overlap:
    /// a second request waits for the one in flight, then writes the newer
    /// row.
    pub async fn save(&self) -> Result<(), CharacterError> {
        let _gate = self.save_gate.lock().await;
        let (name, row, store) = {
            let character = self.lock()?;
            (
                character.name().to_string(),
                character.to_row(),
                Arc::clone(&character.world().store),
            )
        };
        tokio::task::spawn_blocking(move || store.update_row(&name, &row))
            .await
            .map_err(|e| CharacterError::Internal(format!("save task failed: {}", e)))?
    }

    /// Start casting `spell` and arm its timer. Must run inside a Tokio
    /// runtime. Returns false when the spell is not known.
    pub fn begin_cast(&self, spell: SpellId) -> Result<bool, CharacterError> {
        let mut character = self.lock()?;
        let Some((generation, cast_time)) = character.begin_cast(spell) else {
            return Ok(false);
        };
        let delay = Duration::from_millis(
            u64::from(cast_time).saturating_mul(character.world().config.spell_tick_ms),
        );

        let weak: Weak<Mutex<Character>> = Arc::downgrade(&self.cell);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(cell) = weak.upgrade() else {
                return;
            };
            match lock_character(&cell) {
                Ok(mut character) => {
                    character.on_spell_timer(generation);
                }
                Err(err) => warn!("spell timer: {}", err),
            };
        });
        character.cast_mut().attach_timer(generation, task.abort_handle());
        debug!("{} casting {} ({:?})", character.name(), spell, delay);
        Ok(true)
    }

    pub fn select_spell_target(&self, target: SpellTarget) -> Result<bool, CharacterError> {
        Ok(self.lock()?.select_spell_target(target))
    }

    pub fn cancel_spell(&self) -> Result<(), CharacterError> {
        self.lock()?.cancel_spell();
        Ok(())
    }
}

/// Outcome of an agreement change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAgreement {
    /// Not trading, or the partner is gone.
    Rejected,
    /// Flag stored; waiting for the other side.
    Pending,
    /// Both agreed and the items moved.
    Completed,
    /// Both agreed but an offer was no longer covered; the trade closed.
    Failed,
}

pub struct CharacterRegistry {
    world: Arc<World>,
    next_id: AtomicU32,
    characters: RwLock<HashMap<CharacterId, CharacterHandle>>,
}

impl CharacterRegistry {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            next_id: AtomicU32::new(1),
            characters: RwLock::new(HashMap::new()),
        }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    fn issue_id(&self) -> CharacterId {
        CharacterId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, character: Character) -> Result<CharacterHandle, CharacterError> {
        let handle = CharacterHandle::new(character);
        self.characters
            .write()
            .map_err(|_| CharacterError::Internal("registry lock poisoned".into()))?
            .insert(handle.id(), handle.clone());
        Ok(handle)
    }

    /// Load `name` from the store and register it (offline until login).
    pub fn load(&self, name: &str, session: Arc<dyn SessionSink>) -> Result<CharacterHandle, CharacterError> {
        let row = self.world.store.load_row(name)?;
        let character = Character::from_row(Arc::clone(&self.world), self.issue_id(), &row, session)?;
        debug!("registered {} as {:?}", name, character.id());
        self.insert(character)
    }

    /// Write a blank row for `name` and load it.
    pub fn create(&self, name: &str, session: Arc<dyn SessionSink>) -> Result<CharacterHandle, CharacterError> {
        self.world.store.update_row(name, &Character::blank_row(name))?;
        info!("created character {}", name);
        self.load(name, session)
    }

    pub fn get(&self, id: CharacterId) -> Option<CharacterHandle> {
        self.characters.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.characters.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, id: CharacterId) -> Result<CharacterHandle, CharacterError> {
        self.get(id)
            .ok_or_else(|| CharacterError::NotFound(format!("character id {}", id.0)))
    }

    /// Lock two distinct characters, lower id first. Guards come back in
    /// argument order.
    pub fn lock_pair<'a>(
        first: &'a CharacterHandle,
        second: &'a CharacterHandle,
    ) -> Result<(MutexGuard<'a, Character>, MutexGuard<'a, Character>), CharacterError> {
        if first.id() == second.id() {
            return Err(CharacterError::Internal("cannot pair a character with itself".into()));
        }
        if first.id() < second.id() {
            let a = first.lock()?;
            let b = second.lock()?;
            Ok((a, b))
        } else {
            let b = second.lock()?;
            let a = first.lock()?;
            Ok((a, b))
        }
    }

    fn partner_of(&self, id: CharacterId) -> Result<Option<(CharacterHandle, CharacterHandle)>, CharacterError> {
        let handle = self.handle(id)?;
        let partner = handle.lock()?.trade().partner();
        let Some(partner) = partner.and_then(|partner| self.get(partner)) else {
            return Ok(None);
        };
        Ok(Some((handle, partner)))
    }

    /// Bind two idle, online characters as trade partners.
    pub fn open_trade(&self, a: CharacterId, b: CharacterId) -> Result<bool, CharacterError> {
        let (first, second) = (self.handle(a)?, self.handle(b)?);
        let (mut x, mut y) = Self::lock_pair(&first, &second)?;
        if !x.is_online() || !y.is_online() || x.trade().is_trading() || y.trade().is_trading() {
            return Ok(false);
        }
        x.trade.open(b);
        y.trade.open(a);
        debug!("trade opened between {} and {}", x.name(), y.name());
        Ok(true)
    }

    /// Offer items to the current partner. Clears both agreement flags on
    /// success.
    pub fn add_trade_item(&self, id: CharacterId, item: ItemId, amount: i32) -> Result<bool, CharacterError> {
        let Some((own, partner)) = self.partner_of(id)? else {
            return Ok(false);
        };
        let (mut x, mut y) = Self::lock_pair(&own, &partner)?;
        if x.trade().partner() != Some(partner.id()) {
            return Ok(false);
        }
        if !x.add_trade_item(item, amount) {
            return Ok(false);
        }
        y.trade.clear_agree();
        Ok(true)
    }

    pub fn remove_trade_item(&self, id: CharacterId, item: ItemId) -> Result<bool, CharacterError> {
        let Some((own, partner)) = self.partner_of(id)? else {
            return Ok(false);
        };
        let (mut x, mut y) = Self::lock_pair(&own, &partner)?;
        if x.trade().partner() != Some(partner.id()) {
            return Ok(false);
        }
        if !x.remove_trade_item(item) {
            return Ok(false);
        }
        y.trade.clear_agree();
        Ok(true)
    }

    /// Set this side's agreement. When both sides agree the offers are
    /// exchanged atomically and the trade closes.
    pub fn set_trade_agree(&self, id: CharacterId, agree: bool) -> Result<TradeAgreement, CharacterError> {
        let Some((own, partner)) = self.partner_of(id)? else {
            return Ok(TradeAgreement::Rejected);
        };
        let (mut x, mut y) = Self::lock_pair(&own, &partner)?;
        if x.trade().partner() != Some(partner.id()) || y.trade().partner() != Some(id) {
            return Ok(TradeAgreement::Rejected);
        }
        x.trade.set_agree(agree);
        if !(agree && y.trade().agreed()) {
            return Ok(TradeAgreement::Pending);
        }

        let offer_x = x.trade().offer().to_vec();
        let offer_y = y.trade().offer().to_vec();
        let max_item = self.world.config.max_item;
        let completed = exchange(
            (x.sheet_mut(), &offer_x),
            (y.sheet_mut(), &offer_y),
            max_item,
        );

        x.end_trade(completed);
        y.end_trade(completed);
        x.calculate_stats(true);
        y.calculate_stats(true);

        if completed {
            info!("trade completed between {} and {}", x.name(), y.name());
            Ok(TradeAgreement::Completed)
        } else {
            warn!("trade between {} and {} failed: offers no longer fit", x.name(), y.name());
            Ok(TradeAgreement::Failed)
        }
    }

    /// Tear down `id`'s trade on both sides. A no-op without a session.
    pub fn close_trade(&self, id: CharacterId) -> Result<bool, CharacterError> {
        let handle = self.handle(id)?;
        let partner = handle.lock()?.trade().partner();
        let Some(partner) = partner else {
            return Ok(false);
        };

        match self.get(partner) {
            Some(partner_handle) => {
                let (mut x, mut y) = Self::lock_pair(&handle, &partner_handle)?;
                x.end_trade(false);
                if y.trade().partner() == Some(id) {
                    y.end_trade(false);
                }
            }
            None => {
                handle.lock()?.end_trade(false);
            }
        }
        debug!("trade of {:?} closed", id);
        Ok(true)
    }

    /// Move `id` to `map`, closing any trade first.
    pub fn warp(&self, id: CharacterId, map: Arc<dyn WorldMap>, x: u8, y: u8) -> Result<(), CharacterError> {
        self.close_trade(id)?;
        let handle = self.handle(id)?;
        handle.lock()?.warp(map, x, y);
        Ok(())
    }

    /// Close any trade, go offline, persist and unregister.
    pub async fn logout(&self, id: CharacterId) -> Result<(), CharacterError> {
        self.close_trade(id)?;
        let handle = self.handle(id)?;

        let result = self.logout_save(&handle).await;
        self.characters
            .write()
            .map_err(|_| CharacterError::Internal("registry lock poisoned".into()))?
            .remove(&id);
        result
    }

    /// Save an online character on its way out. Offline handles have
    /// nothing to persist.
    async fn logout_save(&self, handle: &CharacterHandle) -> Result<(), CharacterError> {
        let _gate = handle.save_gate.lock().await;
        let (name, row, store) = {
            let mut character = handle.lock()?;
            if !character.is_online() {
                debug!("{} unregistered without a save", character.name());
                return Ok(());
            }
            let row = character.prepare_logout();
            (character.name().to_string(), row, Arc::clone(&character.world().store))
        };
        let key = name.clone();
        tokio::task::spawn_blocking(move || store.update_row(&key, &row))
            .await
            .map_err(|e| CharacterError::Internal(format!("save task failed: {}", e)))??;
        info!("{} logged out", name);
        Ok(())
    }
}
