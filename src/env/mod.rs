//! Integer action-id environment over the rules engine.

pub mod action_mask;
pub mod action_space;
pub mod config;
pub mod observation;


use std::fmt;

use serde::Serialize;

use crate::game::{Card, GameEvent, GameState, PlayerId, RuleEngine, RuleError};

pub use action_mask::{
    action_mask_from_state, checked_action_mask, eligible_attackers, ActionMask,
};
pub use action_space::{Action, ActionSpace, PASS_ID};
pub use config::{ConfigError, EnvConfig};
pub use observation::{observation_from_state, Observation};

/// Seat controlled by the caller; every other seat always passes.
pub const AGENT_SEAT: PlayerId = 0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reset {
    pub observation: Observation,
    pub action_mask: ActionMask,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepInfo {
    pub action_mask: ActionMask,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EnvError {
    NotReset,
    ActionOutOfRange { action_id: usize, len: usize },
    ActionMasked { action_id: usize },
    Rule { error: RuleError },
    Config { error: ConfigError },
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::NotReset => write!(f, "environment must be reset before stepping"),
            EnvError::ActionOutOfRange { action_id, len } => {
                write!(f, "action id {action_id} outside [0, {len})")
            }
            EnvError::ActionMasked { action_id } => {
                write!(f, "action id {action_id} is not legal in the current state")
            }
            EnvError::Rule { error } => write!(f, "rule violation: {error}"),
            EnvError::Config { error } => write!(f, "invalid configuration: {error}"),
        }
    }
}

impl std::error::Error for EnvError {}

impl From<RuleError> for EnvError {
    fn from(error: RuleError) -> Self {
        EnvError::Rule { error }
    }
}

impl From<ConfigError> for EnvError {
    fn from(error: ConfigError) -> Self {
        EnvError::Config { error }
    }
}

/// Single-agent environment. Seat [`AGENT_SEAT`] acts through action ids;
/// the opponent passes every turn.
#[derive(Debug, Clone)]
pub struct MtgEnv {
    engine: RuleEngine,
    space: ActionSpace,
    decks: [Vec<Card>; 2],
    seed: u64,
    state: Option<GameState>,
}

impl MtgEnv {
    pub fn new(deck_a: Vec<Card>, deck_b: Vec<Card>, config: EnvConfig) -> Result<Self, EnvError> {
        config.validate()?;
        Ok(Self {
            engine: RuleEngine::with_config(config.rules),
            space: ActionSpace::from_config(&config)?,
            decks: [deck_a, deck_b],
            seed: config.seed,
            state: None,
        })
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> Option<&mut GameState> {
        self.state.as_mut()
    }

    /// Deals a fresh game and starts seat 0's first turn. `None` reuses the
    /// seed of the previous reset.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Reset, EnvError> {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        let [deck_a, deck_b] = self.decks.clone();
        let mut state = self.engine.initialize_game(deck_a, deck_b, self.seed)?;
        self.engine.begin_turn(&mut state)?;
        log::debug!("environment reset with seed {}", self.seed);

        let reset = Reset {
            observation: observation_from_state(&self.space, &state, AGENT_SEAT),
            action_mask: action_mask_from_state(&self.space, self.engine.config(), &state),
        };
        self.state = Some(state);
        Ok(reset)
    }

    pub fn action_mask(&self) -> Result<ActionMask, EnvError> {
        let state = self.state.as_ref().ok_or(EnvError::NotReset)?;
        Ok(action_mask_from_state(
            &self.space,
            self.engine.config(),
            state,
        ))
    }

    pub fn observation(&self) -> Result<Observation, EnvError> {
        let state = self.state.as_ref().ok_or(EnvError::NotReset)?;
        Ok(observation_from_state(&self.space, state, AGENT_SEAT))
    }

    /// Applies one action id. Out-of-range or masked ids are rejected before
    /// the engine sees them, and a failing step leaves the state unchanged.
    pub fn step(&mut self, action_id: usize) -> Result<Step, EnvError> {
        let state = self.state.as_ref().ok_or(EnvError::NotReset)?;

        let len = self.space.len();
        if action_id >= len {
            log::warn!("rejected action id {action_id}: outside [0, {len})");
            return Err(EnvError::ActionOutOfRange { action_id, len });
        }
        if !action_mask_from_state(&self.space, self.engine.config(), state).is_legal(action_id) {
            log::warn!("rejected masked action id {action_id}");
            return Err(EnvError::ActionMasked { action_id });
        }
        let action = self
            .space
            .decode(action_id)
            .ok_or(EnvError::ActionOutOfRange { action_id, len })?;

        let mut next = state.clone();
        let mut events = self.space.dispatch(&self.engine, &mut next, action)?;
        while !next.is_terminal() && next.active != AGENT_SEAT {
            events.extend(self.space.dispatch(&self.engine, &mut next, Action::Pass)?);
        }
        log::debug!("step {action_id} ({action:?}) produced {} events", events.len());

        let terminated = next.is_terminal();
        let reward = match next.winner() {
            Some(AGENT_SEAT) => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        };
        let step = Step {
            observation: observation_from_state(&self.space, &next, AGENT_SEAT),
            reward,
            terminated,
            truncated: false,
            info: StepInfo {
                action_mask: action_mask_from_state(&self.space, self.engine.config(), &next),
                events,
            },
        };
        self.state = Some(next);
        Ok(step)
    }
}
