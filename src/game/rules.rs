use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{
    Card, CardType, CreaturePermanent, GameEvent, GamePhase, GameState, IntegrityError,
    LandPermanent, PlayerState, VictoryReason, VictoryState, STARTING_LIFE,
};

pub const OPENING_HAND: usize = 7;
pub const MAX_HAND_SIZE: usize = 7;
pub const LANDS_PER_TURN: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    pub opening_hand: usize,
    pub max_hand_size: usize,
    pub starting_life: i32,
    pub lands_per_turn: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            opening_hand: OPENING_HAND,
            max_hand_size: MAX_HAND_SIZE,
            starting_life: STARTING_LIFE,
            lands_per_turn: LANDS_PER_TURN,
        }
    }
}

/// One externally callable rules transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameAction {
    BeginTurn,
    PlayLand { hand_index: usize },
    TapLand { land_index: usize },
    CastCreature { hand_index: usize },
    BeginCombat,
    DeclareAttackers { attackers: Vec<usize> },
    EndTurn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    InvalidPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    LandAlreadyPlayed {
        limit: u32,
    },
    HandIndexOutOfRange {
        index: usize,
        len: usize,
    },
    LandIndexOutOfRange {
        index: usize,
        len: usize,
    },
    CreatureIndexOutOfRange {
        index: usize,
        len: usize,
    },
    CardTypeMismatch {
        expected: CardType,
        actual: CardType,
    },
    InsufficientMana {
        required: u32,
        available: u32,
    },
    LandAlreadyTapped {
        index: usize,
    },
    CreatureTapped {
        index: usize,
    },
    SummoningSick {
        index: usize,
    },
    IntegrityViolation {
        error: IntegrityError,
    },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameFinished => write!(f, "game already ended"),
            RuleError::InvalidPhase { expected, actual } => {
                write!(f, "action requires the {expected:?} phase, game is in {actual:?}")
            }
            RuleError::LandAlreadyPlayed { limit } => {
                write!(f, "only {limit} land(s) may be played per turn")
            }
            RuleError::HandIndexOutOfRange { index, len } => {
                write!(f, "hand index {index} out of range (hand holds {len})")
            }
            RuleError::LandIndexOutOfRange { index, len } => {
                write!(f, "land index {index} out of range ({len} lands)")
            }
            RuleError::CreatureIndexOutOfRange { index, len } => {
                write!(f, "creature index {index} out of range ({len} creatures)")
            }
            RuleError::CardTypeMismatch { expected, actual } => {
                write!(f, "selected card is a {actual:?}, expected a {expected:?}")
            }
            RuleError::InsufficientMana {
                required,
                available,
            } => write!(
                f,
                "insufficient floating mana: {required} required, {available} available"
            ),
            RuleError::LandAlreadyTapped { index } => write!(f, "land {index} is already tapped"),
            RuleError::CreatureTapped { index } => write!(f, "creature {index} is tapped"),
            RuleError::SummoningSick { index } => {
                write!(f, "creature {index} is summoning sick")
            }
            RuleError::IntegrityViolation { error } => {
                write!(f, "game state failed integrity check: {error:?}")
            }
        }
    }
}

impl std::error::Error for RuleError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryState>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let victory = state.outcome.clone();
        Self {
            state,
            events,
            victory,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: RulesConfig,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    fn ensure_running(state: &GameState) -> Result<(), RuleError> {
        if state.is_terminal() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_phase(state: &GameState, expected: GamePhase) -> Result<(), RuleError> {
        if state.phase != expected {
            return Err(RuleError::InvalidPhase {
                expected,
                actual: state.phase,
            });
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn enter_phase(state: &mut GameState, phase: GamePhase, events: &mut Vec<GameEvent>) {
        if state.phase != phase {
            events.push(GameEvent::PhaseChanged {
                from: state.phase,
                to: phase,
            });
            state.phase = phase;
        }
    }

    fn victory_event(victory: &VictoryState) -> GameEvent {
        GameEvent::GameWon {
            winner: victory.winner,
            loser: victory.loser,
            reason: victory.reason,
        }
    }

    /// Shuffles both decks from one stream seeded with `seed` (deck A first),
    /// then deals the opening hands alternately starting with seat 0.
    pub fn initialize_game(
        &self,
        mut deck_a: Vec<Card>,
        mut deck_b: Vec<Card>,
        seed: u64,
    ) -> Result<GameState, RuleError> {
        let mut state = GameState::new(
            [PlayerState::default(), PlayerState::default()],
            seed,
        );
        deck_a.shuffle(&mut state.rng);
        deck_b.shuffle(&mut state.rng);
        state.players = [
            PlayerState::new(self.config.starting_life, deck_a),
            PlayerState::new(self.config.starting_life, deck_b),
        ];
        Self::ensure_integrity(&state)?;

        for _ in 0..self.config.opening_hand {
            for player_id in [0, 1] {
                state.draw_card(player_id);
            }
        }

        state.phase = GamePhase::Draw;
        state.active = 0;
        state.turn = 1;
        log::debug!(
            "initialized game with seed {seed}: libraries {} / {}",
            state.players[0].library.len(),
            state.players[1].library.len()
        );
        Ok(state)
    }

    /// Untap, reset per-turn counters and draw for the active player. A draw
    /// from an empty library ends the game and leaves the phase untouched.
    pub fn begin_turn(&self, state: &mut GameState) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_terminal() {
            return Ok(Vec::new());
        }
        Self::ensure_integrity(state)?;

        let active = state.active;
        let player = state.active_player_mut();
        player.ready_permanents();
        player.lands_played_this_turn = 0;
        player.mana_pool = 0;

        let mut events = vec![GameEvent::TurnStarted {
            player_id: active,
            turn: state.turn,
        }];

        match state.draw_card(active) {
            Some(event) => events.push(event),
            None => {
                if let Some(outcome) = &state.outcome {
                    events.push(Self::victory_event(outcome));
                }
                return Ok(events);
            }
        }

        Self::enter_phase(state, GamePhase::Main, &mut events);
        log::debug!("turn {} begins for player {active}", state.turn);
        Ok(events)
    }

    pub fn play_land(
        &self,
        state: &mut GameState,
        hand_index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_running(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, GamePhase::Main)?;

        let active = state.active;
        let player = state.active_player_mut();
        if player.lands_played_this_turn >= self.config.lands_per_turn {
            return Err(RuleError::LandAlreadyPlayed {
                limit: self.config.lands_per_turn,
            });
        }
        let card = player
            .hand
            .get(hand_index)
            .ok_or(RuleError::HandIndexOutOfRange {
                index: hand_index,
                len: player.hand.len(),
            })?;
        if card.card_type != CardType::Land {
            return Err(RuleError::CardTypeMismatch {
                expected: CardType::Land,
                actual: card.card_type,
            });
        }

        let card = player.hand.remove(hand_index);
        let card_id = card.id;
        player.lands.push(LandPermanent {
            card,
            tapped: false,
        });
        player.lands_played_this_turn += 1;

        log::debug!("player {active} played land {card_id}");
        Ok(vec![GameEvent::LandPlayed {
            player_id: active,
            card_id,
        }])
    }

    pub fn tap_land_for_mana(
        &self,
        state: &mut GameState,
        land_index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_running(state)?;
        Self::ensure_integrity(state)?;

        let active = state.active;
        let player = state.active_player_mut();
        let len = player.lands.len();
        let land = player
            .lands
            .get_mut(land_index)
            .ok_or(RuleError::LandIndexOutOfRange {
                index: land_index,
                len,
            })?;
        if land.tapped {
            return Err(RuleError::LandAlreadyTapped { index: land_index });
        }

        land.tapped = true;
        player.mana_pool += 1;

        Ok(vec![GameEvent::ManaAdded {
            player_id: active,
            land_index,
            mana_pool: player.mana_pool,
        }])
    }

    pub fn cast_creature(
        &self,
        state: &mut GameState,
        hand_index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_running(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, GamePhase::Main)?;

        let active = state.active;
        let player = state.active_player_mut();
        let card = player
            .hand
            .get(hand_index)
            .ok_or(RuleError::HandIndexOutOfRange {
                index: hand_index,
                len: player.hand.len(),
            })?;
        if card.card_type != CardType::Creature {
            return Err(RuleError::CardTypeMismatch {
                expected: CardType::Creature,
                actual: card.card_type,
            });
        }
        let cost = card.cost;
        if player.mana_pool < cost {
            return Err(RuleError::InsufficientMana {
                required: cost,
                available: player.mana_pool,
            });
        }

        let card = player.hand.remove(hand_index);
        let card_id = card.id;
        player.mana_pool -= cost;
        player.creatures.push(CreaturePermanent {
            card,
            damage: 0,
            tapped: false,
            summoning_sick: true,
        });

        log::debug!("player {active} cast creature {card_id} for {cost}");
        Ok(vec![GameEvent::CreatureCast {
            player_id: active,
            card_id,
            cost,
        }])
    }

    pub fn begin_combat(&self, state: &mut GameState) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_running(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, GamePhase::Main)?;

        let mut events = Vec::new();
        Self::enter_phase(state, GamePhase::Combat, &mut events);
        Ok(events)
    }

    /// All attackers are validated before any is tapped; a single bad index
    /// rejects the whole declaration. Damage is unblockable.
    pub fn declare_attackers(
        &self,
        state: &mut GameState,
        attackers: &[usize],
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_running(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, GamePhase::Combat)?;

        let mut events = Vec::new();
        if attackers.is_empty() {
            Self::enter_phase(state, GamePhase::End, &mut events);
            return Ok(events);
        }

        let mut unique = attackers.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let attacker_id = state.active;
        let defender_id = state.defending_player();
        {
            let creatures = &state.active_player().creatures;
            for &index in &unique {
                let creature =
                    creatures
                        .get(index)
                        .ok_or(RuleError::CreatureIndexOutOfRange {
                            index,
                            len: creatures.len(),
                        })?;
                if creature.tapped {
                    return Err(RuleError::CreatureTapped { index });
                }
                if creature.summoning_sick {
                    return Err(RuleError::SummoningSick { index });
                }
            }
        }

        let mut power: i32 = 0;
        let creatures = &mut state.active_player_mut().creatures;
        for &index in &unique {
            let creature = &mut creatures[index];
            creature.tapped = true;
            power = power.saturating_add(creature.power());
        }
        events.push(GameEvent::AttackDeclared {
            player_id: attacker_id,
            attackers: unique,
            power,
        });

        let defender = state.player_mut(defender_id);
        defender.life = defender.life.saturating_sub(power);
        let remaining_life = defender.life;
        events.push(GameEvent::DamageResolved {
            source_player: attacker_id,
            target_player: defender_id,
            amount: power,
            remaining_life,
        });

        if remaining_life <= 0 {
            let victory =
                state.declare_victory(attacker_id, defender_id, VictoryReason::LifeDepleted);
            events.push(Self::victory_event(&victory));
        }

        Self::enter_phase(state, GamePhase::End, &mut events);
        Ok(events)
    }

    /// End-of-turn housekeeping: empty the active mana pool, discard down to
    /// the hand limit from the most recently drawn card, and heal all creatures.
    fn cleanup(&self, state: &mut GameState) -> Vec<GameEvent> {
        let active = state.active;
        let max_hand_size = self.config.max_hand_size;
        let mut events = Vec::new();

        let player = state.active_player_mut();
        player.mana_pool = 0;
        while player.hand.len() > max_hand_size {
            if let Some(card) = player.hand.pop() {
                events.push(GameEvent::CardDiscarded {
                    player_id: active,
                    card_id: card.id,
                });
                player.graveyard.push(card);
            }
        }

        for player in &mut state.players {
            player.clear_damage();
        }
        events
    }

    /// Runs cleanup, passes the turn and starts it; the caller always gets
    /// back either the new active player's Main phase or a finished game.
    pub fn end_turn(&self, state: &mut GameState) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_terminal() {
            return Ok(Vec::new());
        }
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, GamePhase::End)?;

        let current = state.active;
        let mut events = self.cleanup(state);
        events.push(GameEvent::TurnEnded { player_id: current });

        state.active = GameState::opponent_of(current);
        state.turn += 1;
        Self::enter_phase(state, GamePhase::Draw, &mut events);

        let mut start_events = self.begin_turn(state)?;
        events.append(&mut start_events);
        Ok(events)
    }

    pub fn apply(
        &self,
        state: &mut GameState,
        action: &GameAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        match action {
            GameAction::BeginTurn => self.begin_turn(state),
            GameAction::PlayLand { hand_index } => self.play_land(state, *hand_index),
            GameAction::TapLand { land_index } => self.tap_land_for_mana(state, *land_index),
            GameAction::CastCreature { hand_index } => self.cast_creature(state, *hand_index),
            GameAction::BeginCombat => self.begin_combat(state),
            GameAction::DeclareAttackers { attackers } => {
                self.declare_attackers(state, attackers)
            }
            GameAction::EndTurn => self.end_turn(state),
        }
    }

    /// Pure form of [`RuleEngine::apply`]: the input state is left untouched.
    pub fn transition(
        &self,
        state: &GameState,
        action: &GameAction,
    ) -> Result<RuleResolution, RuleError> {
        let mut next = state.clone();
        let events = self.apply(&mut next, action)?;
        Ok(RuleResolution::new(next, events))
    }
}
