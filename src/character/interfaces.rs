//! Collaborators the character talks to but does not own: the session's
//! outbound sink and the map it stands on.

use log::debug;

use super::types::{CharacterId, ItemEntry, OutboundMessage, SpellId};

/// Outbound half of a player session. Framing is the transport's business.
pub trait SessionSink: Send + Sync {
    fn send(&self, message: OutboundMessage);
}

/// Sink that only logs; used by offline tooling and detached characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSession;

impl SessionSink for LogSession {
    fn send(&self, message: OutboundMessage) {
        debug!("session <- {:?}", message);
    }
}

/// Spatial world operations a character delegates to its current map.
pub trait WorldMap: Send + Sync {
    fn id(&self) -> i16;

    fn spell_self(&self, caster: CharacterId, spell: SpellId);

    /// Returns false when the npc index no longer resolves.
    fn spell_attack_npc(&self, caster: CharacterId, npc_index: u16, spell: SpellId) -> bool;

    /// Player id on this map, if present.
    fn player_by_pid(&self, pid: u16) -> Option<CharacterId>;

    fn spell_attack_player(&self, caster: CharacterId, victim: CharacterId, spell: SpellId);

    fn spell_group(&self, caster: CharacterId, spell: SpellId);

    /// Place items at the character's position.
    fn drop_items(&self, owner: CharacterId, items: &[ItemEntry]);
}
