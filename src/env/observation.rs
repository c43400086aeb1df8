//! Fixed-shape observation for agents.
//!
//! Encoded from one seat's point of view; slot counts follow the action
//! space so every observable slot has a matching action id.

use serde::{Deserialize, Serialize};

use super::action_space::ActionSpace;
use crate::game::{CreaturePermanent, GameState, PlayerId};

const EMPTY_SLOT: i8 = -1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Observation {
    pub phase: u8,
    pub turn: u32,
    pub active: PlayerId,
    pub terminal: bool,
    pub winner: Option<PlayerId>,
    /// `[self, opponent]`
    pub life: [i32; 2],
    pub mana_pool: u32,
    pub lands_played_this_turn: u32,
    pub library_size: [usize; 2],
    pub hand_size: [usize; 2],
    pub graveyard_size: [usize; 2],
    /// Card type index per hand slot, `-1` when empty.
    pub hand_type: Vec<i8>,
    pub hand_cost: Vec<u32>,
    /// `[power, toughness]` per hand slot.
    pub hand_pt: Vec<[i32; 2]>,
    /// `1` tapped, `0` untapped, `-1` empty.
    pub lands_tapped: Vec<i8>,
    /// `[power, toughness, summoning_sick, tapped]` per creature slot.
    pub creatures: Vec<[i32; 4]>,
    pub opponent_creatures: Vec<[i32; 4]>,
}

fn creature_features(creatures: &[CreaturePermanent], slots: usize) -> Vec<[i32; 4]> {
    (0..slots)
        .map(|slot| match creatures.get(slot) {
            Some(creature) => [
                creature.power(),
                creature.toughness(),
                i32::from(creature.summoning_sick),
                i32::from(creature.tapped),
            ],
            None => [0; 4],
        })
        .collect()
}

pub fn observation_from_state(
    space: &ActionSpace,
    state: &GameState,
    seat: PlayerId,
) -> Observation {
    let opponent = GameState::opponent_of(seat);
    let me = state.player(seat);
    let them = state.player(opponent);

    let hand_slot = |slot: usize| me.hand.get(slot);

    Observation {
        phase: state.phase.index(),
        turn: state.turn,
        active: state.active,
        terminal: state.is_terminal(),
        winner: state.winner(),
        life: [me.life, them.life],
        mana_pool: me.mana_pool,
        lands_played_this_turn: me.lands_played_this_turn,
        library_size: [me.library.len(), them.library.len()],
        hand_size: [me.hand.len(), them.hand.len()],
        graveyard_size: [me.graveyard.len(), them.graveyard.len()],
        hand_type: (0..space.hand_slots())
            .map(|slot| {
                hand_slot(slot)
                    .map(|card| card.card_type.index())
                    .unwrap_or(EMPTY_SLOT)
            })
            .collect(),
        hand_cost: (0..space.hand_slots())
            .map(|slot| hand_slot(slot).map(|card| card.cost).unwrap_or(0))
            .collect(),
        hand_pt: (0..space.hand_slots())
            .map(|slot| {
                hand_slot(slot)
                    .map(|card| [card.power(), card.toughness()])
                    .unwrap_or([0, 0])
            })
            .collect(),
        lands_tapped: (0..space.land_slots())
            .map(|slot| match me.lands.get(slot) {
                Some(land) => i8::from(land.tapped),
                None => EMPTY_SLOT,
            })
            .collect(),
        creatures: creature_features(&me.creatures, space.creature_slots()),
        opponent_creatures: creature_features(&them.creatures, space.creature_slots()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::basic_lands;
    use crate::game::{Card, GamePhase, LandPermanent, RuleEngine};

    #[test]
    fn observation_shapes_follow_the_action_space() {
        let space = ActionSpace::new(4, 3, 2).expect("valid layout");
        let engine = RuleEngine::new();
        let mut state = engine
            .initialize_game(basic_lands(30, 0), basic_lands(30, 100), 1)
            .expect("valid decks");
        engine.begin_turn(&mut state).expect("turn starts");

        let observation = observation_from_state(&space, &state, 0);

        assert_eq!(observation.phase, GamePhase::Main.index());
        assert_eq!(observation.hand_type, vec![0; 4]);
        assert_eq!(observation.hand_pt.len(), 4);
        assert_eq!(observation.lands_tapped, vec![-1; 3]);
        assert_eq!(observation.creatures, vec![[0; 4]; 2]);
        assert_eq!(observation.hand_size, [8, 7]);
        assert_eq!(observation.library_size, [22, 23]);
        assert_eq!(observation.life, [20, 20]);
    }

    #[test]
    fn permanents_are_encoded_per_slot() {
        let space = ActionSpace::default();
        let mut state = GameState::new(Default::default(), 3).with_phase(GamePhase::Main);
        let me = &mut state.players[0];
        me.hand.push(Card::creature(1, "Vanilla 2/3", 2, 2, 3));
        let mut land = LandPermanent::new(Card::land(2, "Basic Land")).expect("land");
        land.tapped = true;
        me.lands.push(land);
        me.creatures
            .push(CreaturePermanent::new(Card::creature(3, "Vanilla 1/1", 1, 1, 1)).expect("creature"));
        state.players[1].life = 12;

        let observation = observation_from_state(&space, &state, 0);

        assert_eq!(observation.hand_type[0], 1);
        assert_eq!(observation.hand_type[1], -1);
        assert_eq!(observation.hand_cost[0], 2);
        assert_eq!(observation.hand_pt[0], [2, 3]);
        assert_eq!(observation.lands_tapped[0], 1);
        assert_eq!(observation.lands_tapped[1], -1);
        assert_eq!(observation.creatures[0], [1, 1, 1, 0]);
        assert_eq!(observation.life, [20, 12]);

        let theirs = observation_from_state(&space, &state, 1);
        assert_eq!(theirs.life, [12, 20]);
        assert_eq!(theirs.opponent_creatures[0], [1, 1, 1, 0]);
    }
}
