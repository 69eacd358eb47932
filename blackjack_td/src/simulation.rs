pub mod hand;
pub mod shoe;

use crate::{Action, Error, Outcome, Rule};
use blackjack_td_macros::allowed_phase;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum_macros::EnumIter;

use self::{
    hand::{Hand, HandValue},
    shoe::Shoe,
};

static CARD_TO_BLACKJACK_VALUE: [u8; 13] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, 11];

/// A card rank. Suits play no role in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Card {
    Two = 0,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Card {
    /// Cards adding one to the Hi-Lo running count.
    pub const LOW: [Card; 5] = [Card::Two, Card::Three, Card::Four, Card::Five, Card::Six];
    pub const NEUTRAL: [Card; 3] = [Card::Seven, Card::Eight, Card::Nine];
    /// Cards subtracting one from the Hi-Lo running count.
    pub const HIGH: [Card; 5] = [Card::Ten, Card::Jack, Card::Queen, Card::King, Card::Ace];

    /// Ace counts as 11 here; demotion is the hand's business.
    pub fn value(&self) -> u8 {
        CARD_TO_BLACKJACK_VALUE[*self as usize]
    }

    /// Hi-Lo increment applied when this card is drawn.
    pub fn hilo(&self) -> i32 {
        match self.value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Card::Two => "2",
            Card::Three => "3",
            Card::Four => "4",
            Card::Five => "5",
            Card::Six => "6",
            Card::Seven => "7",
            Card::Eight => "8",
            Card::Nine => "9",
            Card::Ten => "10",
            Card::Jack => "J",
            Card::Queen => "Q",
            Card::King => "K",
            Card::Ace => "A",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingDeal,
    InitialDealt,
    BlackjackResolved,
    PlayerActing,
    DealerActing,
    Settled,
}

/// The state a learner observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundState {
    /// Value of the dealer's hand: the up-card (2-11) until the dealer plays.
    pub dealer_value: u8,
    pub player_total: u8,
    /// True count reported by the shoe after the latest draw.
    pub true_count: i32,
    /// At least one of the player's Aces had to be counted as 1.
    pub usable_ace: bool,
}

/// What `new_round` and `step` return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub reward: f64,
    pub state: RoundState,
    pub outcome: Outcome,
}

/// Single-player blackjack against a dealer hitting soft 17, played from a
/// counted shoe that persists across rounds until the reshuffle threshold.
pub struct BlackjackGame<R: Rng = StdRng> {
    rule: Rule,
    rng: R,

    // Game state
    current_game_phase: GamePhase,
    shoe: Shoe,
    dealer_hand: Hand,
    player_hand: Hand,
    wager: u32,
    outcome: Outcome,
    state: RoundState,
    // Depth of a targeted re-seed that no round has drawn from yet.
    reseeded_depth: Option<usize>,
}

impl BlackjackGame<StdRng> {
    pub fn new(rule: &Rule) -> Result<Self, Error> {
        Self::with_rng(rule, StdRng::from_entropy())
    }

    pub fn with_seed(rule: &Rule, seed: u64) -> Result<Self, Error> {
        Self::with_rng(rule, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BlackjackGame<R> {
    pub fn with_rng(rule: &Rule, rng: R) -> Result<Self, Error> {
        rule.validate()?;
        let mut game = Self {
            rule: *rule,
            rng,
            current_game_phase: GamePhase::AwaitingDeal,
            shoe: Shoe::new(rule.number_of_decks),
            dealer_hand: Hand::new(),
            player_hand: Hand::new(),
            wager: 0,
            outcome: Outcome::InProgress,
            state: RoundState::default(),
            reseeded_depth: None,
        };
        game.reset(0)?;
        Ok(game)
    }

    /// Resets the shoe (shuffled when `true_count` is 0, re-seeded to the
    /// given true count otherwise) and clears the table.
    pub fn reset(&mut self, true_count: i32) -> Result<(), Error> {
        self.shoe.reset(true_count, &mut self.rng)?;
        self.reseeded_depth = (true_count != 0).then(|| self.shoe.number_of_cards_remaining());
        self.clear_table();
        self.state = RoundState {
            true_count: self.shoe.get_true_count(),
            ..Default::default()
        };
        Ok(())
    }

    /// Starts a round on the current shoe: reshuffles if the shoe is too
    /// shallow, places the bet, deals, and settles an immediate blackjack.
    /// A shoe freshly re-seeded by `reset` is never reshuffled here.
    pub fn new_round(&mut self) -> Result<Transition, Error> {
        let remaining = self.shoe.number_of_cards_remaining();
        let fresh_reseed = self.reseeded_depth.take() == Some(remaining);
        if !fresh_reseed && remaining <= self.reshuffle_threshold() {
            debug!(
                "reshuffling shoe with {} cards left",
                self.shoe.number_of_cards_remaining()
            );
            self.shoe.reset(0, &mut self.rng)?;
        }
        self.clear_table();

        self.place_bet()?;
        self.deal_initial()?;
        let outcome = self.check_blackjack()?;
        let reward = if outcome.is_resolved() {
            self.settle()?
        } else {
            0.0
        };

        Ok(Transition {
            reward,
            state: self.state,
            outcome,
        })
    }

    /// Can be called at PlayerActing phase.
    #[allowed_phase(PlayerActing)]
    pub fn step(&mut self, action: Action) -> Result<Transition, Error> {
        let reward = match action {
            Action::Hit => {
                let value = self.player_hit()?;
                if value.bust() {
                    self.outcome = Outcome::Dealer;
                    self.settle()?
                } else if value.total == 21 {
                    self.finish_with_dealer()?
                } else {
                    0.0
                }
            }
            Action::Stand => self.finish_with_dealer()?,
        };

        Ok(Transition {
            reward,
            state: self.state,
            outcome: self.outcome,
        })
    }

    /// Can be called at AwaitingDeal phase.
    /// Returns the wager: the large bet at or above the count threshold.
    #[allowed_phase(AwaitingDeal)]
    pub fn place_bet(&mut self) -> Result<u32, Error> {
        self.wager = if self.shoe.get_true_count() >= self.rule.bet_threshold {
            self.rule.large_bet
        } else {
            self.rule.small_bet
        };
        Ok(self.wager)
    }

    /// Can be called at AwaitingDeal phase.
    /// Deals player, dealer, player. The dealer's second card is only drawn
    /// when needed.
    #[allowed_phase(AwaitingDeal)]
    pub fn deal_initial(&mut self) -> Result<RoundState, Error> {
        let card = self.shoe.draw()?;
        self.player_hand.receive_card(card);
        let card = self.shoe.draw()?;
        self.dealer_hand.receive_card(card);
        let card = self.shoe.draw()?;
        self.player_hand.receive_card(card);

        self.current_game_phase = GamePhase::InitialDealt;
        self.refresh_state();
        Ok(self.state)
    }

    /// Can be called at InitialDealt phase.
    /// Resolves a player natural. The dealer only draws a second card when the
    /// up-card could make a natural too.
    #[allowed_phase(InitialDealt)]
    pub fn check_blackjack(&mut self) -> Result<Outcome, Error> {
        if !self.player_hand.is_natural() {
            self.current_game_phase = GamePhase::PlayerActing;
            return Ok(Outcome::InProgress);
        }

        if self.dealer_hand.value().total >= 10 {
            let card = self.shoe.draw()?;
            self.dealer_hand.receive_card(card);
        }
        self.outcome = if self.dealer_hand.is_natural() {
            Outcome::Tie
        } else {
            Outcome::Blackjack
        };
        self.current_game_phase = GamePhase::BlackjackResolved;
        self.refresh_state();
        Ok(self.outcome)
    }

    /// Can be called at PlayerActing phase.
    #[allowed_phase(PlayerActing)]
    pub fn player_hit(&mut self) -> Result<HandValue, Error> {
        let card = self.shoe.draw()?;
        self.player_hand.receive_card(card);
        self.refresh_state();
        Ok(self.player_hand.value())
    }

    /// Can be called at DealerActing phase.
    /// Dealer draws below 17 and on soft 17. Returns the dealer's total.
    #[allowed_phase(DealerActing)]
    pub fn dealer_play(&mut self) -> Result<u8, Error> {
        loop {
            let value = self.dealer_hand.value();
            let must_stand = value.total > 17 || (value.total == 17 && !value.soft);
            if must_stand {
                self.refresh_state();
                return Ok(value.total);
            }
            let card = self.shoe.draw()?;
            self.dealer_hand.receive_card(card);
        }
    }

    /// Decides the winner from the current hands.
    pub fn check_winner(&self) -> Outcome {
        if self.player_hand.is_natural() {
            return if self.dealer_hand.is_natural() {
                Outcome::Tie
            } else {
                Outcome::Blackjack
            };
        }

        let player_total = self.player_hand.value().total;
        let dealer_total = self.dealer_hand.value().total;
        if player_total > 21 {
            Outcome::Dealer
        } else if dealer_total > 21 {
            Outcome::Player
        } else if player_total > dealer_total {
            Outcome::Player
        } else if player_total < dealer_total {
            Outcome::Dealer
        } else if self.dealer_hand.is_natural() {
            Outcome::Dealer
        } else {
            Outcome::Tie
        }
    }

    /// Can be called once the outcome is known.
    /// Returns the reward of the round in betting units.
    #[allowed_phase(BlackjackResolved, PlayerActing, DealerActing)]
    pub fn settle(&mut self) -> Result<f64, Error> {
        let wager = self.wager as f64;
        let reward = match self.outcome {
            Outcome::Dealer => -wager,
            Outcome::Player => wager,
            Outcome::Blackjack => wager * self.rule.payout_blackjack,
            Outcome::Tie => 0.0,
            Outcome::InProgress => return Err(Error::RoundInProgress),
        };
        self.current_game_phase = GamePhase::Settled;
        Ok(reward)
    }

    pub fn get_rule(&self) -> &Rule {
        &self.rule
    }

    pub fn get_shoe(&self) -> &Shoe {
        &self.shoe
    }

    /// Direct access to the shoe, e.g. to stack cards for a scripted round.
    pub fn get_shoe_mut(&mut self) -> &mut Shoe {
        &mut self.shoe
    }

    pub fn get_state(&self) -> RoundState {
        self.state
    }

    pub fn get_outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn get_wager(&self) -> u32 {
        self.wager
    }

    pub fn get_phase(&self) -> GamePhase {
        self.current_game_phase
    }

    pub fn get_player_hand(&self) -> &Hand {
        &self.player_hand
    }

    pub fn get_dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    fn finish_with_dealer(&mut self) -> Result<f64, Error> {
        self.current_game_phase = GamePhase::DealerActing;
        self.dealer_play()?;
        self.outcome = self.check_winner();
        self.settle()
    }

    fn reshuffle_threshold(&self) -> usize {
        (self.rule.shoe_size() as f64 * self.rule.reshuffle_proportion) as usize
    }

    fn refresh_state(&mut self) {
        let player = self.player_hand.value();
        self.state = RoundState {
            dealer_value: self.dealer_hand.value().total,
            player_total: player.total,
            true_count: self.shoe.get_true_count(),
            usable_ace: player.demoted_ace,
        };
    }

    fn clear_table(&mut self) {
        self.player_hand.clear();
        self.dealer_hand.clear();
        self.wager = 0;
        self.outcome = Outcome::InProgress;
        self.current_game_phase = GamePhase::AwaitingDeal;
    }
}
