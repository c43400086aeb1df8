//! Rules core: game state, card lists and the rules engine.

pub mod deck;
pub mod rules;
pub mod state;

pub use rules::{
    GameAction, RuleEngine, RuleError, RuleResolution, RulesConfig, LANDS_PER_TURN, MAX_HAND_SIZE,
    OPENING_HAND,
};
pub use state::{
    Card, CardId, CardType, CreaturePermanent, CreatureStats, GameEvent, GamePhase, GameState,
    IntegrityError, LandPermanent, PlayerId, PlayerState, VictoryReason, VictoryState,
    STARTING_LIFE,
};
