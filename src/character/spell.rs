//! Spell casting state machine.
//!
//! `Idle -> Readying -> Ready -> Acting -> Idle`, with `Cancelled` reachable
//! from every non-idle phase. The wall-clock timer lives outside this type;
//! it is identified by a generation number so a timer that fires after a
//! cancel or a newer cast is recognised as stale and ignored.

use tokio::task::AbortHandle;

use super::defs::{SpellData, SpellKind, SpellTargetKind, TargetRestrict};
use super::types::SpellId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastPhase {
    #[default]
    Idle,
    /// Timer pending.
    Readying,
    /// Timer fired, waiting for a target.
    Ready,
    /// Target known and timer fired; the action is about to resolve.
    Acting,
    Cancelled,
}

/// Target kinds a cast can resolve against. Ids are map-local indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellTarget {
    SelfCast,
    Npc(u16),
    Player(u16),
    Group,
}

/// What the owner must do after the timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// No pending cast for this generation.
    Stale,
    /// Wait for `select_target`.
    AwaitTarget,
    /// Resolve the action now.
    Act,
}

#[derive(Debug, Default)]
pub struct SpellCast {
    phase: CastPhase,
    spell: SpellId,
    target: Option<SpellTarget>,
    generation: u64,
    timer: Option<AbortHandle>,
}

impl SpellCast {
    pub fn phase(&self) -> CastPhase {
        self.phase
    }

    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn target(&self) -> Option<SpellTarget> {
        self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_casting(&self) -> bool {
        matches!(self.phase, CastPhase::Readying | CastPhase::Ready | CastPhase::Acting)
    }

    /// Start a cast, dropping any pending one. Returns the generation the
    /// timer must report back with.
    pub fn begin(&mut self, spell: SpellId) -> u64 {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.spell = spell;
        self.phase = CastPhase::Readying;
        self.generation
    }

    /// Attach the abort handle of the timer started for `generation`.
    /// A handle for an outdated generation is aborted immediately.
    pub fn attach_timer(&mut self, generation: u64, handle: AbortHandle) {
        if generation != self.generation || self.phase != CastPhase::Readying {
            handle.abort();
            return;
        }
        if let Some(previous) = self.timer.replace(handle) {
            previous.abort();
        }
    }

    /// Timer callback. No-op unless the cast of `generation` is still pending.
    pub fn timer_fired(&mut self, generation: u64) -> TimerOutcome {
        if generation != self.generation || self.phase != CastPhase::Readying {
            return TimerOutcome::Stale;
        }
        self.timer = None;
        if self.target.is_some() {
            self.phase = CastPhase::Acting;
            TimerOutcome::Act
        } else {
            self.phase = CastPhase::Ready;
            TimerOutcome::AwaitTarget
        }
    }

    /// Record the target. Returns true when the cast is ready and the owner
    /// should resolve it now.
    pub fn select_target(&mut self, target: SpellTarget) -> bool {
        match self.phase {
            CastPhase::Readying => {
                self.target = Some(target);
                false
            }
            CastPhase::Ready => {
                self.target = Some(target);
                self.phase = CastPhase::Acting;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending action and return to idle. Yields nothing unless
    /// the cast is in the acting phase.
    pub fn take_action(&mut self) -> Option<(SpellId, SpellTarget)> {
        if self.phase != CastPhase::Acting {
            return None;
        }
        let action = self.target.map(|target| (self.spell, target));
        self.reset(CastPhase::Idle);
        action
    }

    /// Idempotent from any phase: aborts the timer and clears target and
    /// readiness.
    pub fn cancel(&mut self) {
        if self.phase == CastPhase::Idle && self.timer.is_none() {
            return;
        }
        self.reset(CastPhase::Cancelled);
    }

    fn reset(&mut self, phase: CastPhase) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.target = None;
        self.phase = phase;
    }
}

impl Drop for SpellCast {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Whether `spell` may resolve against `target`. `self_pid` is the caster's
/// own player id, used to reject self-targeted hostile player casts.
pub fn target_allowed(spell: &SpellData, target: SpellTarget, self_pid: u16) -> bool {
    if spell.id == 0 || spell.kind == SpellKind::Bard {
        return false;
    }
    match target {
        SpellTarget::SelfCast => {
            spell.restrict == TargetRestrict::Friendly && spell.target == SpellTargetKind::SelfOnly
        }
        SpellTarget::Npc(_) => {
            spell.restrict != TargetRestrict::Friendly && spell.target == SpellTargetKind::Normal
        }
        SpellTarget::Player(pid) => {
            spell.restrict != TargetRestrict::NpcOnly
                && spell.target == SpellTargetKind::Normal
                && (spell.restrict == TargetRestrict::Friendly || pid != self_pid)
        }
        SpellTarget::Group => {
            spell.restrict == TargetRestrict::Friendly && spell.target == SpellTargetKind::Group
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(target: SpellTargetKind, restrict: TargetRestrict) -> SpellData {
        SpellData { id: 1, name: "Test".into(), target, restrict, ..Default::default() }
    }

    #[test]
    fn test_timer_then_target_acts() {
        let mut cast = SpellCast::default();
        let generation = cast.begin(4);
        assert_eq!(cast.phase(), CastPhase::Readying);
        assert_eq!(cast.timer_fired(generation), TimerOutcome::AwaitTarget);
        assert_eq!(cast.phase(), CastPhase::Ready);
        assert!(cast.select_target(SpellTarget::Npc(3)));
        assert_eq!(cast.take_action(), Some((4, SpellTarget::Npc(3))));
        assert_eq!(cast.phase(), CastPhase::Idle);
    }

    #[test]
    fn test_target_before_timer_acts_on_fire() {
        let mut cast = SpellCast::default();
        let generation = cast.begin(2);
        assert!(!cast.select_target(SpellTarget::SelfCast));
        assert_eq!(cast.timer_fired(generation), TimerOutcome::Act);
        assert_eq!(cast.take_action(), Some((2, SpellTarget::SelfCast)));
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut cast = SpellCast::default();
        let first = cast.begin(1);
        cast.cancel();
        assert_eq!(cast.phase(), CastPhase::Cancelled);
        assert_eq!(cast.timer_fired(first), TimerOutcome::Stale);

        let second = cast.begin(1);
        assert_eq!(cast.timer_fired(first), TimerOutcome::Stale);
        assert_eq!(cast.timer_fired(second), TimerOutcome::AwaitTarget);
        assert_eq!(cast.timer_fired(second), TimerOutcome::Stale);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut cast = SpellCast::default();
        cast.cancel();
        assert_eq!(cast.phase(), CastPhase::Idle);
        cast.begin(3);
        cast.select_target(SpellTarget::Group);
        cast.cancel();
        cast.cancel();
        assert_eq!(cast.phase(), CastPhase::Cancelled);
        assert_eq!(cast.target(), None);
        assert_eq!(cast.take_action(), None);
    }

    #[test]
    fn test_target_rules() {
        let heal_self = spell(SpellTargetKind::SelfOnly, TargetRestrict::Friendly);
        assert!(target_allowed(&heal_self, SpellTarget::SelfCast, 1));
        assert!(!target_allowed(&heal_self, SpellTarget::Group, 1));

        let bolt = spell(SpellTargetKind::Normal, TargetRestrict::Opponent);
        assert!(target_allowed(&bolt, SpellTarget::Npc(9), 1));
        assert!(target_allowed(&bolt, SpellTarget::Player(2), 1));
        assert!(!target_allowed(&bolt, SpellTarget::Player(1), 1));
        assert!(!target_allowed(&bolt, SpellTarget::SelfCast, 1));

        let npc_only = spell(SpellTargetKind::Normal, TargetRestrict::NpcOnly);
        assert!(!target_allowed(&npc_only, SpellTarget::Player(2), 1));

        let heal_other = spell(SpellTargetKind::Normal, TargetRestrict::Friendly);
        assert!(target_allowed(&heal_other, SpellTarget::Player(1), 1));
        assert!(!target_allowed(&heal_other, SpellTarget::Npc(4), 1));

        let group = spell(SpellTargetKind::Group, TargetRestrict::Friendly);
        assert!(target_allowed(&group, SpellTarget::Group, 1));

        let mut bard = heal_self.clone();
        bard.kind = SpellKind::Bard;
        assert!(!target_allowed(&bard, SpellTarget::SelfCast, 1));
    }
}
