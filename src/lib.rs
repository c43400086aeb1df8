pub mod env;
pub mod game;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use env::{
    Action, ActionMask, ActionSpace, EnvConfig, EnvError, MtgEnv, Observation, Reset, Step,
    StepInfo, AGENT_SEAT, PASS_ID,
};
pub use game::{
    Card, CardId, CardType, CreaturePermanent, GameAction, GameEvent, GamePhase, GameState,
    IntegrityError, LandPermanent, PlayerId, PlayerState, RuleEngine, RuleError, RuleResolution,
    RulesConfig, VictoryReason, VictoryState,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn parse_deck(json: Option<String>, fallback_first_id: CardId) -> Result<Vec<Card>, JsValue> {
    match json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error),
        None => Ok(game::deck::sample_deck(fallback_first_id)),
    }
}

fn optional_config(config: JsValue) -> Result<EnvConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(EnvConfig::default());
    }
    let config: EnvConfig = from_value(config).map_err(JsValue::from)?;
    config.validate().map_err(to_js_error)?;
    Ok(config)
}

/// Browser-facing environment. Every result crosses the boundary as JSON.
#[wasm_bindgen]
pub struct GameEngine {
    env: MtgEnv,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        deck_a_json: Option<String>,
        deck_b_json: Option<String>,
        config_json: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => EnvConfig::from_json(&json).map_err(to_js_error)?,
            None => EnvConfig::default(),
        };
        let deck_a = parse_deck(deck_a_json, 0)?;
        let deck_b = parse_deck(deck_b_json, 1000)?;
        let env = MtgEnv::new(deck_a, deck_b, config).map_err(to_js_error)?;
        Ok(GameEngine { env })
    }

    pub fn reset(&mut self, seed: Option<u64>) -> Result<String, JsValue> {
        let reset = self.env.reset(seed).map_err(to_js_error)?;
        to_json(&reset)
    }

    pub fn step(&mut self, action_id: usize) -> Result<String, JsValue> {
        match self.env.step(action_id) {
            Ok(step) => to_json(&step),
            Err(error) => {
                let message = format!("rejected action {action_id}: {error}");
                web_sys::console::warn_1(&message.into());
                Err(to_js_error(error))
            }
        }
    }

    pub fn action_mask(&self) -> Result<String, JsValue> {
        let mask = self.env.action_mask().map_err(to_js_error)?;
        to_json(&mask)
    }

    pub fn action_count(&self) -> usize {
        self.env.action_space().len()
    }

    pub fn observation_json(&self) -> Result<String, JsValue> {
        let observation = self.env.observation().map_err(to_js_error)?;
        to_json(&observation)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let state = self
            .env
            .state()
            .ok_or_else(|| to_js_error(EnvError::NotReset))?;
        to_json(state)
    }
}

/// Shuffles and deals two decks; returns the `GameState` as JSON.
#[wasm_bindgen(js_name = "initializeGame")]
pub fn initialize_game(deck_a: JsValue, deck_b: JsValue, seed: u64) -> Result<String, JsValue> {
    let deck_a: Vec<Card> = from_value(deck_a).map_err(JsValue::from)?;
    let deck_b: Vec<Card> = from_value(deck_b).map_err(JsValue::from)?;
    let state = RuleEngine::new()
        .initialize_game(deck_a, deck_b, seed)
        .map_err(to_js_error)?;
    to_json(&state)
}

/// Applies one `GameAction` to a JSON `GameState` without side effects and
/// returns the resolution as JSON.
#[wasm_bindgen(js_name = "applyAction")]
pub fn apply_action(state_json: &str, action: JsValue) -> Result<String, JsValue> {
    let state: GameState = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
    let action: GameAction = from_value(action).map_err(JsValue::from)?;
    let resolution = RuleEngine::new()
        .transition(&state, &action)
        .map_err(to_js_error)?;
    to_json(&resolution)
}

#[wasm_bindgen(js_name = "legalActions")]
pub fn legal_actions(state_json: &str, config: JsValue) -> Result<Vec<u32>, JsValue> {
    let state: GameState = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
    let config = optional_config(config)?;
    let space = ActionSpace::from_config(&config).map_err(to_js_error)?;
    let mask = env::checked_action_mask(&space, &config.rules, &state).map_err(to_js_error)?;
    Ok(mask.legal_ids().map(|id| id as u32).collect())
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state_json: &str) -> Result<(), JsValue> {
    let state: GameState = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
