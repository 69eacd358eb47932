use super::Card;
use crate::{Error, MIN_NUMBER_OF_DECKS};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use strum::IntoEnumIterator;

const CARDS_PER_DECK: usize = 52;
const COPIES_PER_DECK: usize = 4;

/// Bounds of the depth, in decks, that a targeted re-seed leaves in the shoe.
const MIN_DECKS_REMAINING: usize = 2;
const MAX_DECKS_REMAINING: usize = 5;

/// Represents a shoe tracking the Hi-Lo count. Cards are drawn from the end of
/// `cards_remain`.
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    cards_remain: Vec<Card>,
    cards_dealt: Vec<Card>,
    running_count: i32,
    true_count: i32,
}

impl Shoe {
    /// Creates a new shoe with ordered cards. Call `reset` before dealing.
    pub fn new(number_of_decks: u8) -> Shoe {
        let cards_remain = full_shoe(number_of_decks);
        Shoe {
            number_of_decks,
            cards_dealt: Vec::with_capacity(cards_remain.len()),
            cards_remain,
            running_count: 0,
            true_count: 0,
        }
    }

    /// Returns all cards into the shoe. A `target_true_count` of 0 means a
    /// fresh shuffled shoe; any other value rebuilds a mid-shoe state whose
    /// true count is exactly the target.
    pub fn reset<R: Rng>(&mut self, target_true_count: i32, rng: &mut R) -> Result<(), Error> {
        if target_true_count == 0 {
            self.cards_remain = full_shoe(self.number_of_decks);
            self.cards_remain.shuffle(rng);
            self.cards_dealt.clear();
            self.running_count = 0;
            self.true_count = 0;
            return Ok(());
        }

        self.simulate_true_count(target_true_count, rng)?;
        self.true_count = self.compute_true_count()?;
        if self.true_count != target_true_count {
            return Err(Error::StateMismatch {
                expected: target_true_count,
                actual: self.true_count,
            });
        }
        Ok(())
    }

    /// Deals the top card and updates both counts.
    pub fn draw(&mut self) -> Result<Card, Error> {
        let card = self.cards_remain.pop().ok_or(Error::EmptyShoe)?;
        self.cards_dealt.push(card);
        self.running_count += card.hilo();
        self.true_count = self.compute_true_count()?;
        Ok(card)
    }

    /// Moves the given cards to the top of the shoe so that they are drawn
    /// next, in the given order. Counts are not affected.
    pub fn stack_next(&mut self, cards: &[Card]) -> Result<(), Error> {
        let mut placed = 0;
        for card in cards.iter().rev() {
            let searchable = self.cards_remain.len() - placed;
            let position = self.cards_remain[..searchable]
                .iter()
                .rposition(|c| c == card)
                .ok_or(Error::CardUnavailable { card: *card })?;
            let found = self.cards_remain.remove(position);
            self.cards_remain.push(found);
            placed += 1;
        }
        Ok(())
    }

    pub fn get_number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    pub fn get_cards_remain(&self) -> &[Card] {
        &self.cards_remain
    }

    pub fn get_cards_dealt(&self) -> &[Card] {
        &self.cards_dealt
    }

    pub fn get_running_count(&self) -> i32 {
        self.running_count
    }

    pub fn get_true_count(&self) -> i32 {
        self.true_count
    }

    pub fn number_of_cards_remaining(&self) -> usize {
        self.cards_remain.len()
    }

    /// Partitions a fresh shoe into dealt and remaining cards so that the
    /// running count over the remaining depth gives `true_count`.
    ///
    /// A random depth of 2 to 5 decks is kept. Low (or high, for a negative
    /// target) cards are dealt to realize the running count, and the rest of
    /// the dealt pile is filled count-neutrally: single 7-9s, or a low and a
    /// high card together.
    fn simulate_true_count<R: Rng>(&mut self, true_count: i32, rng: &mut R) -> Result<(), Error> {
        let decks = self.number_of_decks as usize;
        if self.number_of_decks < MIN_NUMBER_OF_DECKS {
            return Err(Error::InvalidRule(format!(
                "re-seeding to a true count needs at least {} decks, the shoe has {}",
                MIN_NUMBER_OF_DECKS, decks
            )));
        }

        let mut low_cards = card_pool(&Card::LOW, decks);
        let mut neutral_cards = card_pool(&Card::NEUTRAL, decks);
        let mut high_cards = card_pool(&Card::HIGH, decks);
        low_cards.shuffle(rng);
        neutral_cards.shuffle(rng);
        high_cards.shuffle(rng);

        let decks_remain = rng.gen_range(MIN_DECKS_REMAINING..=MAX_DECKS_REMAINING);
        let cards_to_deal = (decks - decks_remain) * CARDS_PER_DECK;
        let running_count = true_count * decks_remain as i32;
        let skewing_cards = running_count.unsigned_abs() as usize;

        let mut cards_dealt = Vec::with_capacity(cards_to_deal + 1);
        if true_count >= 0 {
            deal_from(&mut low_cards, skewing_cards, &mut cards_dealt);
        } else {
            deal_from(&mut high_cards, skewing_cards, &mut cards_dealt);
        }

        let mut remaining_to_deal = cards_to_deal as isize - skewing_cards as isize;
        while remaining_to_deal > 0 {
            let deal_neutral = if neutral_cards.is_empty() {
                false
            } else if low_cards.is_empty() || high_cards.is_empty() {
                true
            } else {
                rng.gen_bool(0.5)
            };

            if deal_neutral {
                deal_from(&mut neutral_cards, 1, &mut cards_dealt);
                remaining_to_deal -= 1;
            } else {
                deal_from(&mut low_cards, 1, &mut cards_dealt);
                deal_from(&mut high_cards, 1, &mut cards_dealt);
                remaining_to_deal -= 2;
            }
        }

        let mut cards_remain = low_cards;
        cards_remain.append(&mut neutral_cards);
        cards_remain.append(&mut high_cards);
        cards_remain.shuffle(rng);

        debug!(
            "re-seeded shoe to true count {}: {} decks remain, running count {}",
            true_count, decks_remain, running_count
        );

        self.cards_remain = cards_remain;
        self.cards_dealt = cards_dealt;
        self.running_count = running_count;
        Ok(())
    }

    fn compute_true_count(&self) -> Result<i32, Error> {
        let decks_remain = round_to_tenths(self.cards_remain.len() as f64 / CARDS_PER_DECK as f64);
        if decks_remain == 0.0 {
            return Err(Error::DivisionByZero {
                cards_remaining: self.cards_remain.len(),
            });
        }
        Ok((self.running_count as f64 / decks_remain).round_ties_even() as i32)
    }
}

fn full_shoe(number_of_decks: u8) -> Vec<Card> {
    let mut cards = Vec::with_capacity(number_of_decks as usize * CARDS_PER_DECK);
    for _ in 0..number_of_decks {
        for card in Card::iter() {
            for _ in 0..COPIES_PER_DECK {
                cards.push(card);
            }
        }
    }
    cards
}

fn card_pool(cards: &[Card], number_of_decks: usize) -> Vec<Card> {
    let mut pool = Vec::with_capacity(cards.len() * COPIES_PER_DECK * number_of_decks);
    for _ in 0..COPIES_PER_DECK * number_of_decks {
        pool.extend_from_slice(cards);
    }
    pool
}

/// Moves up to `number_of_cards` from the end of `pool` into `dealt`.
fn deal_from(pool: &mut Vec<Card>, number_of_cards: usize, dealt: &mut Vec<Card>) {
    for _ in 0..number_of_cards {
        match pool.pop() {
            Some(card) => dealt.push(card),
            None => break,
        }
    }
}

/// Rounds half to even at one decimal place.
fn round_to_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
