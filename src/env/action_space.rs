//! Flat action-id layout.
//!
//! Ids are laid out in contiguous half-open ranges:
//! `[0]` pass, `[play_base, cast_base)` play land from hand slot,
//! `[cast_base, tap_base)` cast creature from hand slot,
//! `[tap_base, attack_base)` tap battlefield land slot,
//! `[attack_base, len)` attack with a non-empty creature subset, where
//! `id = attack_base + (mask - 1)`.

use serde::{Deserialize, Serialize};

use super::config::{check_slots, ConfigError, EnvConfig};
use crate::game::{GameEvent, GamePhase, GameState, RuleEngine, RuleError};

pub const PASS_ID: usize = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "slot")]
pub enum Action {
    Pass,
    PlayLand(usize),
    CastCreature(usize),
    TapLand(usize),
    /// Bit `i` set means creature slot `i` attacks.
    Attack(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpace {
    hand_slots: usize,
    land_slots: usize,
    creature_slots: usize,
}

impl ActionSpace {
    pub fn new(
        hand_slots: usize,
        land_slots: usize,
        creature_slots: usize,
    ) -> Result<Self, ConfigError> {
        check_slots(hand_slots, land_slots, creature_slots)?;
        Ok(Self {
            hand_slots,
            land_slots,
            creature_slots,
        })
    }

    pub fn from_config(config: &EnvConfig) -> Result<Self, ConfigError> {
        Self::new(config.hand_slots, config.land_slots, config.creature_slots)
    }

    pub fn hand_slots(&self) -> usize {
        self.hand_slots
    }

    pub fn land_slots(&self) -> usize {
        self.land_slots
    }

    pub fn creature_slots(&self) -> usize {
        self.creature_slots
    }

    pub fn play_base(&self) -> usize {
        PASS_ID + 1
    }

    pub fn cast_base(&self) -> usize {
        self.play_base() + self.hand_slots
    }

    pub fn tap_base(&self) -> usize {
        self.cast_base() + self.hand_slots
    }

    pub fn attack_base(&self) -> usize {
        self.tap_base() + self.land_slots
    }

    /// Largest attack mask, `2^creature_slots - 1`.
    pub fn full_attack_mask(&self) -> u32 {
        (1u32 << self.creature_slots) - 1
    }

    /// Total number of ids, fixed at construction.
    pub fn len(&self) -> usize {
        self.attack_base() + self.full_attack_mask() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attack_id(&self, mask: u32) -> usize {
        self.attack_base() + (mask as usize - 1)
    }

    pub fn encode(&self, action: Action) -> Option<usize> {
        match action {
            Action::Pass => Some(PASS_ID),
            Action::PlayLand(slot) if slot < self.hand_slots => Some(self.play_base() + slot),
            Action::CastCreature(slot) if slot < self.hand_slots => Some(self.cast_base() + slot),
            Action::TapLand(slot) if slot < self.land_slots => Some(self.tap_base() + slot),
            Action::Attack(mask) if mask != 0 && mask <= self.full_attack_mask() => {
                Some(self.attack_id(mask))
            }
            _ => None,
        }
    }

    pub fn decode(&self, id: usize) -> Option<Action> {
        if id == PASS_ID {
            Some(Action::Pass)
        } else if id < self.cast_base() {
            Some(Action::PlayLand(id - self.play_base()))
        } else if id < self.tap_base() {
            Some(Action::CastCreature(id - self.cast_base()))
        } else if id < self.attack_base() {
            Some(Action::TapLand(id - self.tap_base()))
        } else if id < self.len() {
            Some(Action::Attack((id - self.attack_base() + 1) as u32))
        } else {
            None
        }
    }

    /// Creature slots named by an attack mask, ascending. Only the low
    /// `creature_slots` bits are read.
    pub fn attack_indices(&self, mask: u32) -> Vec<usize> {
        (0..self.creature_slots)
            .filter(|slot| (mask >> slot) & 1 == 1)
            .collect()
    }

    /// Runs the single rules call an action maps to. Legality masking is the
    /// caller's job; the engine still validates every call.
    pub fn dispatch(
        &self,
        engine: &RuleEngine,
        state: &mut GameState,
        action: Action,
    ) -> Result<Vec<GameEvent>, RuleError> {
        match action {
            Action::Pass => {
                if state.is_terminal() {
                    return Ok(Vec::new());
                }
                match state.phase {
                    GamePhase::Draw => engine.begin_turn(state),
                    GamePhase::Main => engine.begin_combat(state),
                    GamePhase::Combat => engine.declare_attackers(state, &[]),
                    GamePhase::End => engine.end_turn(state),
                }
            }
            Action::PlayLand(slot) => engine.play_land(state, slot),
            Action::CastCreature(slot) => engine.cast_creature(state, slot),
            Action::TapLand(slot) => engine.tap_land_for_mana(state, slot),
            Action::Attack(mask) => {
                let attackers = self.attack_indices(mask);
                if state.phase != GamePhase::Main {
                    return engine.declare_attackers(state, &attackers);
                }
                // begin_combat and the declaration commit together or not at all
                let mut next = state.clone();
                let mut events = engine.begin_combat(&mut next)?;
                events.extend(engine.declare_attackers(&mut next, &attackers)?);
                *state = next;
                Ok(events)
            }
        }
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self {
            hand_slots: super::config::DEFAULT_HAND_SLOTS,
            land_slots: super::config::DEFAULT_LAND_SLOTS,
            creature_slots: super::config::DEFAULT_CREATURE_SLOTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::basic_lands;
    use crate::game::{Card, CreaturePermanent};

    #[test]
    fn default_layout_matches_reference_sizes() {
        let space = ActionSpace::default();
        assert_eq!(space.play_base(), 1);
        assert_eq!(space.cast_base(), 11);
        assert_eq!(space.tap_base(), 21);
        assert_eq!(space.attack_base(), 33);
        assert_eq!(space.len(), 1 + 2 * 10 + 12 + 1023);
    }

    #[test]
    fn range_boundaries_are_half_open() {
        let space = ActionSpace::new(2, 3, 2).expect("valid layout");
        assert_eq!(space.decode(0), Some(Action::Pass));
        assert_eq!(space.decode(1), Some(Action::PlayLand(0)));
        assert_eq!(space.decode(2), Some(Action::PlayLand(1)));
        assert_eq!(space.decode(3), Some(Action::CastCreature(0)));
        assert_eq!(space.decode(5), Some(Action::TapLand(0)));
        assert_eq!(space.decode(7), Some(Action::TapLand(2)));
        assert_eq!(space.decode(8), Some(Action::Attack(0b01)));
        assert_eq!(space.decode(10), Some(Action::Attack(0b11)));
        assert_eq!(space.decode(11), None);
        assert_eq!(space.len(), 11);
    }

    #[test]
    fn every_id_decodes_to_an_action_that_encodes_back() {
        let space = ActionSpace::new(3, 2, 4).expect("valid layout");
        for id in 0..space.len() {
            let action = space.decode(id).expect("in-range id decodes");
            assert_eq!(space.encode(action), Some(id));
        }
        assert_eq!(space.encode(Action::PlayLand(3)), None);
        assert_eq!(space.encode(Action::Attack(0)), None);
        assert_eq!(space.encode(Action::Attack(1 << 4)), None);
    }

    #[test]
    fn attack_indices_read_low_bits_only() {
        let space = ActionSpace::new(1, 1, 3).expect("valid layout");
        assert_eq!(space.attack_indices(0b101), vec![0, 2]);
        assert_eq!(space.attack_indices(0b1010), vec![1]);
    }

    #[test]
    fn creature_slot_limits_are_enforced() {
        assert!(ActionSpace::new(1, 1, 0).is_err());
        assert!(ActionSpace::new(1, 1, 17).is_err());
        assert!(matches!(
            ActionSpace::new(usize::MAX, 1, 1),
            Err(ConfigError::HandSlotsOutOfRange { .. })
        ));
        assert!(matches!(
            ActionSpace::new(1, usize::MAX, 1),
            Err(ConfigError::LandSlotsOutOfRange { .. })
        ));
        let widest = ActionSpace::new(1, 1, 16).expect("16 slots fit");
        assert_eq!(widest.full_attack_mask(), u16::MAX as u32);
    }

    #[test]
    fn attacking_from_main_opens_combat_first() {
        let engine = RuleEngine::new();
        let space = ActionSpace::default();
        let mut state = engine
            .initialize_game(basic_lands(30, 0), basic_lands(30, 100), 1)
            .expect("valid decks");
        engine.begin_turn(&mut state).expect("turn starts");
        let mut creature =
            CreaturePermanent::new(Card::creature(500, "Vanilla 2/2", 2, 2, 2)).expect("creature");
        creature.summoning_sick = false;
        state.players[0].creatures.push(creature);

        space
            .dispatch(&engine, &mut state, Action::Attack(0b1))
            .expect("ready creature may attack");

        assert_eq!(state.phase, GamePhase::End);
        assert_eq!(state.players[1].life, 18);
    }

    #[test]
    fn failed_attack_from_main_leaves_state_in_main() {
        let engine = RuleEngine::new();
        let space = ActionSpace::default();
        let mut state = engine
            .initialize_game(basic_lands(30, 0), basic_lands(30, 100), 1)
            .expect("valid decks");
        engine.begin_turn(&mut state).expect("turn starts");
        let before = state.clone();

        assert!(space
            .dispatch(&engine, &mut state, Action::Attack(0b1))
            .is_err());
        assert_eq!(state, before);
    }
}
