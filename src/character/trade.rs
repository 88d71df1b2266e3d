//! Per-character half of a two-party trade.
//!
//! Each side keeps its own offer list; the aggregate pairs two sides under
//! the registry's ordered pair lock and drives teardown and completion.

use log::debug;

use super::sheet::CharacterSheet;
use super::types::{CharacterId, ItemEntry, ItemId};
use crate::config::CharacterConfig;

/// How repeated offers of the same item combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferMode {
    /// Accumulate onto the existing line. Availability excludes the escrow
    /// already offered and the combined line must stay within the cap.
    Extend,
    /// Overwrite the existing line. Availability is the full owned amount.
    Replace,
}

impl OfferMode {
    pub fn from_config(trade_add_quantity: bool) -> Self {
        if trade_add_quantity {
            OfferMode::Extend
        } else {
            OfferMode::Replace
        }
    }
}

/// Bounds applied to every offer change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferLimits {
    /// Largest amount a single line may hold.
    pub max_amount: i32,
    /// Most distinct item lines one side may offer.
    pub max_lines: usize,
    pub mode: OfferMode,
}

impl OfferLimits {
    pub fn from_config(config: &CharacterConfig) -> Self {
        Self {
            max_amount: config.max_trade,
            max_lines: config.max_trade_lines,
            mode: OfferMode::from_config(config.trade_add_quantity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeState {
    partner: Option<CharacterId>,
    offer: Vec<ItemEntry>,
    agreed: bool,
}

impl TradeState {
    pub fn is_trading(&self) -> bool {
        self.partner.is_some()
    }

    pub fn partner(&self) -> Option<CharacterId> {
        self.partner
    }

    pub fn offer(&self) -> &[ItemEntry] {
        &self.offer
    }

    pub fn agreed(&self) -> bool {
        self.agreed
    }

    /// Amount of `item` currently in escrow.
    pub fn offered(&self, item: ItemId) -> i32 {
        self.offer
            .iter()
            .find(|entry| entry.id == item)
            .map(|entry| entry.amount)
            .unwrap_or(0)
    }

    /// Bind to `partner`, starting from an empty offer.
    pub fn open(&mut self, partner: CharacterId) {
        self.partner = Some(partner);
        self.offer.clear();
        self.agreed = false;
    }

    /// Offer `amount` of `item` out of `owned`. Returns false, leaving the
    /// offer untouched, when the amount is out of range, the offer already
    /// holds `max_lines` other items, or nothing would be added.
    pub fn add_offer(&mut self, item: ItemId, amount: i32, owned: i32, limits: OfferLimits) -> bool {
        let OfferLimits { max_amount: max_trade, max_lines, mode } = limits;
        if !self.is_trading() || amount <= 0 || amount > max_trade {
            return false;
        }

        let existing = self.offered(item);
        let new_line = !self.offer.iter().any(|entry| entry.id == item);
        if new_line && self.offer.len() >= max_lines {
            return false;
        }
        let available = match mode {
            OfferMode::Extend => (owned - existing).max(0),
            OfferMode::Replace => owned,
        };
        let amount = amount.min(available);
        if amount <= 0 {
            return false;
        }

        let new_amount = match mode {
            OfferMode::Extend => {
                let Some(total) = existing.checked_add(amount) else {
                    return false;
                };
                if total > max_trade {
                    return false;
                }
                total
            }
            OfferMode::Replace => amount,
        };

        match self.offer.iter_mut().find(|entry| entry.id == item) {
            Some(entry) => entry.amount = new_amount,
            None => self.offer.push(ItemEntry::new(item, new_amount)),
        }
        self.agreed = false;
        debug!("trade offer {} x{} ({:?})", item, new_amount, mode);
        true
    }

    /// Drop the whole line for `item`.
    pub fn remove_offer(&mut self, item: ItemId) -> bool {
        let before = self.offer.len();
        self.offer.retain(|entry| entry.id != item);
        let removed = self.offer.len() != before;
        if removed {
            self.agreed = false;
        }
        removed
    }

    pub fn set_agree(&mut self, agree: bool) -> bool {
        if !self.is_trading() {
            return false;
        }
        self.agreed = agree;
        true
    }

    pub fn clear_agree(&mut self) {
        self.agreed = false;
    }

    /// Reset to idle. Returns the former partner; `None` when no session
    /// was active.
    pub fn close(&mut self) -> Option<CharacterId> {
        self.offer.clear();
        self.agreed = false;
        self.partner.take()
    }
}

/// Every offered line is still fully owned.
fn offer_covered(sheet: &CharacterSheet, offer: &[ItemEntry]) -> bool {
    offer.iter().all(|entry| entry.amount > 0 && sheet.owned(entry.id) >= entry.amount)
}

fn offered_in(offer: &[ItemEntry], item: ItemId) -> i32 {
    offer.iter().filter(|entry| entry.id == item).map(|entry| entry.amount).sum()
}

/// Every incoming line still fits under `max_item` after the receiver's own
/// outgoing lines leave.
fn receiver_fits(receiver: &CharacterSheet, outgoing: &[ItemEntry], incoming: &[ItemEntry], max_item: i32) -> bool {
    incoming.iter().all(|entry| {
        (receiver.owned(entry.id) - offered_in(outgoing, entry.id))
            .checked_add(entry.amount)
            .map_or(false, |total| total <= max_item)
    })
}

/// Move both offers across. Either every line moves or nothing does.
pub fn exchange(
    (sheet_a, offer_a): (&mut CharacterSheet, &[ItemEntry]),
    (sheet_b, offer_b): (&mut CharacterSheet, &[ItemEntry]),
    max_item: i32,
) -> bool {
    if !offer_covered(sheet_a, offer_a) || !offer_covered(sheet_b, offer_b) {
        return false;
    }
    if !receiver_fits(sheet_b, offer_b, offer_a, max_item) || !receiver_fits(sheet_a, offer_a, offer_b, max_item) {
        debug!("trade exchange would overflow a receiver's item cap");
        return false;
    }

    for entry in offer_a {
        sheet_a.take_item(entry.id, entry.amount);
    }
    for entry in offer_b {
        sheet_b.take_item(entry.id, entry.amount);
    }
    for entry in offer_a {
        sheet_b.push_item(entry.id, entry.amount, max_item);
    }
    for entry in offer_b {
        sheet_a.push_item(entry.id, entry.amount, max_item);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_amount: i32, mode: OfferMode) -> OfferLimits {
        OfferLimits { max_amount, max_lines: 3, mode }
    }

    fn trading() -> TradeState {
        let mut trade = TradeState::default();
        trade.open(CharacterId(2));
        trade
    }

    #[test]
    fn test_replace_mode_overwrites() {
        let mut trade = trading();
        assert!(trade.add_offer(10, 3, 5, limits(100, OfferMode::Replace)));
        assert!(trade.add_offer(10, 2, 5, limits(100, OfferMode::Replace)));
        assert_eq!(trade.offered(10), 2);
        assert!(trade.add_offer(10, 9, 5, limits(100, OfferMode::Replace)));
        assert_eq!(trade.offered(10), 5);
    }

    #[test]
    fn test_extend_mode_accumulates_to_cap() {
        let mut trade = trading();
        assert!(trade.add_offer(10, 3, 5, limits(5, OfferMode::Extend)));
        assert!(trade.add_offer(10, 2, 5, limits(5, OfferMode::Extend)));
        assert_eq!(trade.offered(10), 5);
        assert!(!trade.add_offer(10, 1, 5, limits(5, OfferMode::Extend)));
        assert_eq!(trade.offered(10), 5);
    }

    #[test]
    fn test_extend_mode_rejects_over_cap_total() {
        let mut trade = trading();
        assert!(trade.add_offer(10, 4, 50, limits(5, OfferMode::Extend)));
        assert!(!trade.add_offer(10, 2, 50, limits(5, OfferMode::Extend)));
        assert_eq!(trade.offered(10), 4);
    }

    #[test]
    fn test_bounds_and_idle_rejections() {
        let mut idle = TradeState::default();
        assert!(!idle.add_offer(1, 1, 5, limits(5, OfferMode::Replace)));
        let mut trade = trading();
        assert!(!trade.add_offer(1, 0, 5, limits(5, OfferMode::Replace)));
        assert!(!trade.add_offer(1, 6, 9, limits(5, OfferMode::Replace)));
        assert!(!trade.add_offer(1, 1, 0, limits(5, OfferMode::Replace)));
        assert!(trade.offer().is_empty());
    }

    #[test]
    fn test_line_limit_applies_to_new_items_only() {
        let mut trade = trading();
        for item in 1..=3 {
            assert!(trade.add_offer(item, 1, 5, limits(5, OfferMode::Replace)));
        }
        assert!(!trade.add_offer(4, 1, 5, limits(5, OfferMode::Replace)));
        assert!(trade.add_offer(2, 4, 5, limits(5, OfferMode::Replace)));
        assert_eq!(trade.offer().len(), 3);
        assert_eq!(trade.offered(2), 4);
    }

    #[test]
    fn test_offer_change_clears_agreement_and_close_resets() {
        let mut trade = trading();
        trade.add_offer(1, 1, 5, limits(5, OfferMode::Replace));
        trade.set_agree(true);
        assert!(trade.remove_offer(1));
        assert!(!trade.agreed());
        assert!(!trade.remove_offer(1));
        assert_eq!(trade.close(), Some(CharacterId(2)));
        assert_eq!(trade.close(), None);
        assert!(!trade.set_agree(true));
    }

    #[test]
    fn test_exchange_is_all_or_nothing() {
        let mut a = CharacterSheet::default();
        let mut b = CharacterSheet::default();
        a.push_item(1, 10, 100);
        b.push_item(2, 1, 100);

        let offer_a = vec![ItemEntry::new(1, 4)];
        let too_much = vec![ItemEntry::new(2, 3)];
        assert!(!exchange((&mut a, &offer_a), (&mut b, &too_much), 100));
        assert_eq!(a.owned(1), 10);

        let offer_b = vec![ItemEntry::new(2, 1)];
        assert!(exchange((&mut a, &offer_a), (&mut b, &offer_b), 100));
        assert_eq!(a.owned(1), 6);
        assert_eq!(a.owned(2), 1);
        assert_eq!(b.owned(1), 4);
        assert_eq!(b.owned(2), 0);
    }

    #[test]
    fn test_exchange_refuses_to_overflow_receiver() {
        let mut a = CharacterSheet::default();
        let mut b = CharacterSheet::default();
        a.push_item(1, 5, 10);
        b.push_item(1, 8, 10);

        let offer_a = vec![ItemEntry::new(1, 5)];
        assert!(!exchange((&mut a, &offer_a), (&mut b, &[]), 10));
        assert_eq!(a.owned(1), 5);
        assert_eq!(b.owned(1), 8);

        // b handing its own stack back frees the room
        let offer_b = vec![ItemEntry::new(1, 8)];
        assert!(exchange((&mut a, &offer_a), (&mut b, &offer_b), 10));
        assert_eq!(a.owned(1), 8);
        assert_eq!(b.owned(1), 5);
    }
}
