//! Legality mask over the flat action-id space.

use serde::{Deserialize, Serialize};

use super::action_space::{ActionSpace, PASS_ID};
use crate::game::{CardType, GamePhase, GameState, PlayerState, RuleError, RulesConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ActionMask {
    legal: Vec<bool>,
}

impl ActionMask {
    pub fn new(len: usize) -> Self {
        Self {
            legal: vec![false; len],
        }
    }

    fn allow(&mut self, id: usize) {
        if let Some(slot) = self.legal.get_mut(id) {
            *slot = true;
        }
    }

    pub fn is_legal(&self, id: usize) -> bool {
        self.legal.get(id).copied().unwrap_or(false)
    }

    pub fn legal_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.legal
            .iter()
            .enumerate()
            .filter_map(|(id, &legal)| legal.then_some(id))
    }

    pub fn count_legal(&self) -> usize {
        self.legal.iter().filter(|&&legal| legal).count()
    }

    pub fn len(&self) -> usize {
        self.legal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legal.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.legal
    }
}

/// Bitmask of creature slots (first `slots` only) that may attack right now.
pub fn eligible_attackers(player: &PlayerState, slots: usize) -> u32 {
    player
        .creatures
        .iter()
        .take(slots)
        .enumerate()
        .filter(|(_, creature)| creature.can_attack())
        .fold(0, |mask, (slot, _)| mask | (1u32 << slot))
}

/// Pass is always legal; everything else depends on the phase of the
/// active player's turn. Finished games only allow Pass.
pub fn action_mask_from_state(
    space: &ActionSpace,
    rules: &RulesConfig,
    state: &GameState,
) -> ActionMask {
    let mut mask = ActionMask::new(space.len());
    mask.allow(PASS_ID);

    if state.is_terminal() {
        return mask;
    }

    let player = state.active_player();
    match state.phase {
        GamePhase::Main => {
            let land_drop_open = player.lands_played_this_turn < rules.lands_per_turn;
            for (slot, card) in player.hand.iter().take(space.hand_slots()).enumerate() {
                match card.card_type {
                    CardType::Land if land_drop_open => mask.allow(space.play_base() + slot),
                    CardType::Creature if card.cost <= player.mana_pool => {
                        mask.allow(space.cast_base() + slot)
                    }
                    _ => {}
                }
            }
            for (slot, land) in player.lands.iter().take(space.land_slots()).enumerate() {
                if !land.tapped {
                    mask.allow(space.tap_base() + slot);
                }
            }
        }
        GamePhase::Combat => {
            let eligible = eligible_attackers(player, space.creature_slots());
            let mut subset = eligible;
            while subset != 0 {
                mask.allow(space.attack_id(subset));
                subset = (subset - 1) & eligible;
            }
        }
        GamePhase::Draw | GamePhase::End => {}
    }

    mask
}

/// Same as [`action_mask_from_state`] for states that did not come from the
/// engine, such as deserialized input; a state failing the integrity check
/// is refused instead of masked.
pub fn checked_action_mask(
    space: &ActionSpace,
    rules: &RulesConfig,
    state: &GameState,
) -> Result<ActionMask, RuleError> {
    state
        .integrity_check()
        .map_err(|error| RuleError::IntegrityViolation { error })?;
    Ok(action_mask_from_state(space, rules, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::basic_lands;
    use crate::game::{Card, CreaturePermanent, IntegrityError, LandPermanent, RuleEngine};

    fn main_phase_state() -> GameState {
        let engine = RuleEngine::new();
        let mut state = engine
            .initialize_game(basic_lands(30, 0), basic_lands(30, 100), 1)
            .expect("valid decks");
        engine.begin_turn(&mut state).expect("turn starts");
        state
    }

    fn creature(sick: bool, tapped: bool) -> CreaturePermanent {
        let mut creature =
            CreaturePermanent::new(Card::creature(600, "Vanilla 1/1", 1, 1, 1)).expect("creature");
        creature.summoning_sick = sick;
        creature.tapped = tapped;
        creature
    }

    #[test]
    fn main_phase_offers_lands_taps_and_affordable_creatures() {
        let space = ActionSpace::default();
        let rules = RulesConfig::default();
        let mut state = main_phase_state();
        let player = state.active_player_mut();
        player.hand.truncate(2);
        player.hand.push(Card::creature(700, "Cheap", 1, 1, 1));
        player.hand.push(Card::creature(701, "Pricey", 3, 3, 3));
        player.hand.push(Card::sorcery(702, "Unused", 0));
        player
            .lands
            .push(LandPermanent::new(Card::land(703, "Basic Land")).expect("land"));
        let mut tapped = LandPermanent::new(Card::land(704, "Basic Land")).expect("land");
        tapped.tapped = true;
        player.lands.push(tapped);
        player.mana_pool = 1;

        let mask = action_mask_from_state(&space, &rules, &state);

        let legal: Vec<usize> = mask.legal_ids().collect();
        assert_eq!(
            legal,
            vec![
                PASS_ID,
                space.play_base(),
                space.play_base() + 1,
                space.cast_base() + 2,
                space.tap_base(),
            ]
        );
    }

    #[test]
    fn land_drop_closes_after_one_land() {
        let space = ActionSpace::default();
        let rules = RulesConfig::default();
        let mut state = main_phase_state();
        state.active_player_mut().lands_played_this_turn = 1;

        let mask = action_mask_from_state(&space, &rules, &state);
        assert!((space.play_base()..space.cast_base()).all(|id| !mask.is_legal(id)));
    }

    #[test]
    fn combat_mask_enumerates_eligible_subsets_only() {
        let space = ActionSpace::default();
        let rules = RulesConfig::default();
        let mut state = main_phase_state();
        let creatures = &mut state.active_player_mut().creatures;
        creatures.push(creature(false, false));
        creatures.push(creature(true, false));
        creatures.push(creature(false, true));
        creatures.push(creature(false, false));
        creatures.push(creature(false, false));
        state.phase = GamePhase::Combat;

        let mask = action_mask_from_state(&space, &rules, &state);

        let eligible = 0b11001;
        assert_eq!(eligible_attackers(state.active_player(), 10), eligible);
        let attack_ids: Vec<usize> = mask
            .legal_ids()
            .filter(|&id| id >= space.attack_base())
            .collect();
        assert_eq!(attack_ids.len(), (1 << 3) - 1);
        for id in attack_ids {
            let subset = (id - space.attack_base() + 1) as u32;
            assert_eq!(subset & !eligible, 0, "subset {subset:#b} uses an ineligible slot");
        }
        assert_eq!(mask.count_legal(), 1 + 7);
    }

    #[test]
    fn creatures_past_the_slot_limit_are_ignored() {
        let space = ActionSpace::new(10, 12, 2).expect("valid layout");
        let rules = RulesConfig::default();
        let mut state = main_phase_state();
        for _ in 0..4 {
            state.active_player_mut().creatures.push(creature(false, false));
        }
        state.phase = GamePhase::Combat;

        let mask = action_mask_from_state(&space, &rules, &state);
        assert_eq!(mask.count_legal(), 1 + 3);
    }

    #[test]
    fn end_draw_and_finished_games_only_pass() {
        let space = ActionSpace::default();
        let rules = RulesConfig::default();
        let mut state = main_phase_state();

        state.phase = GamePhase::End;
        assert_eq!(action_mask_from_state(&space, &rules, &state).count_legal(), 1);
        state.phase = GamePhase::Draw;
        assert_eq!(action_mask_from_state(&space, &rules, &state).count_legal(), 1);

        state.phase = GamePhase::Main;
        state.declare_victory(1, 0, crate::game::VictoryReason::LifeDepleted);
        let mask = action_mask_from_state(&space, &rules, &state);
        assert_eq!(mask.legal_ids().collect::<Vec<_>>(), vec![PASS_ID]);
        assert_eq!(mask.len(), space.len());
    }

    #[test]
    fn deserialized_state_with_a_bad_seat_is_refused() {
        let space = ActionSpace::default();
        let rules = RulesConfig::default();
        let json = serde_json::to_string(&main_phase_state()).expect("state serializes");
        assert!(json.contains("\"active\":0"));
        let json = json.replacen("\"active\":0", "\"active\":2", 1);
        let state: GameState = serde_json::from_str(&json).expect("shape is still valid");

        assert_eq!(
            checked_action_mask(&space, &rules, &state),
            Err(RuleError::IntegrityViolation {
                error: IntegrityError::InvalidPlayerIndex { player_id: 2 }
            })
        );

        let mask = checked_action_mask(&space, &rules, &main_phase_state())
            .expect("engine states pass the check");
        assert!(mask.is_legal(PASS_ID));
    }
}
