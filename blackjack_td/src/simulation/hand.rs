use super::Card;

/// Value of a hand under the standard Ace-demotion rule.
///
/// Two different Ace notions are tracked: `demoted_ace` is true when at least
/// one Ace had to be counted as 1 to keep the total at or below 21 (this is the
/// "usable ace" feature the learner sees), while `soft` is true when an Ace is
/// still counted as 11 (this is what the dealer's hit-soft-17 rule looks at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandValue {
    pub total: u8,
    pub demoted_ace: bool,
    pub soft: bool,
}

impl HandValue {
    pub fn bust(&self) -> bool {
        self.total > 21
    }
}

/// Evaluates a sequence of cards. Aces start at 11 and are demoted to 1 one at
/// a time while the total exceeds 21.
pub fn evaluate(cards: &[Card]) -> HandValue {
    let mut total: u16 = 0;
    let mut aces = 0;
    for card in cards {
        total += card.value() as u16;
        if *card == Card::Ace {
            aces += 1;
        }
    }

    let mut high_aces = aces;
    while total > 21 && high_aces > 0 {
        total -= 10;
        high_aces -= 1;
    }

    HandValue {
        total: total.min(u8::MAX as u16) as u8,
        demoted_ace: high_aces < aces,
        soft: high_aces > 0,
    }
}

/// Cards dealt face-up to the player or the dealer.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(4),
        }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn get_cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn value(&self) -> HandValue {
        evaluate(&self.cards)
    }

    /// 21 with exactly two cards.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.value().total == 21
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Card::*;

    #[test]
    fn ace_king_is_a_natural_without_demotion() {
        let value = evaluate(&[Ace, King]);
        assert_eq!(value.total, 21);
        assert!(!value.demoted_ace);
        assert!(value.soft);
    }

    #[test]
    fn one_ace_demoted_in_ace_ace_nine() {
        let value = evaluate(&[Ace, Ace, Nine]);
        assert_eq!(value.total, 21);
        assert!(value.demoted_ace);
        assert!(value.soft);
    }

    #[test]
    fn every_ace_demoted_when_needed() {
        let value = evaluate(&[Ace, Ace, Ace, King, Nine]);
        assert_eq!(value.total, 22);
        assert!(value.demoted_ace);
        assert!(!value.soft);
        assert!(value.bust());
    }

    #[test]
    fn hard_totals() {
        assert_eq!(evaluate(&[Ten, Queen]).total, 20);
        assert_eq!(evaluate(&[Two, Two]).total, 4);
        assert_eq!(evaluate(&[Ten, Three, King]).total, 23);
        assert_eq!(evaluate(&[]), HandValue::default());
    }

    #[test]
    fn soft_seventeen() {
        let value = evaluate(&[Ace, Six]);
        assert_eq!(value.total, 17);
        assert!(value.soft);
        assert!(!value.demoted_ace);

        let value = evaluate(&[Ace, Six, Ten]);
        assert_eq!(value.total, 17);
        assert!(!value.soft);
        assert!(value.demoted_ace);
    }

    #[test]
    fn demotions_never_exceed_aces_present() {
        let hands: [&[Card]; 4] = [
            &[Ace, Ace, Ace, Ace],
            &[King, Queen, Ace],
            &[Five, Ace, Ace, Ten],
            &[Ace; 12],
        ];
        for hand in hands {
            let value = evaluate(hand);
            let aces = hand.iter().filter(|card| **card == Ace).count() as u16;
            let raw: u16 = hand.iter().map(|card| card.value() as u16).sum();
            let demotions = (raw - value.total as u16) / 10;
            assert!(demotions <= aces);
            assert_eq!((raw - value.total as u16) % 10, 0);
        }
    }

    #[test]
    fn natural_needs_two_cards() {
        let mut hand = Hand::new();
        hand.receive_card(Seven);
        hand.receive_card(Four);
        hand.receive_card(Queen);
        assert_eq!(hand.value().total, 21);
        assert!(!hand.is_natural());

        hand.clear();
        assert!(hand.is_empty());
        hand.receive_card(Jack);
        hand.receive_card(Ace);
        assert!(hand.is_natural());
        assert_eq!(hand.len(), 2);
    }
}
