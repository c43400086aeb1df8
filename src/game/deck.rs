//! Card list builders for quick games and tests.

use super::state::{Card, CardId};

const SAMPLE_LAND_COUNT: u32 = 17;

/// Power, toughness and cost of the creatures in the sample deck.
const SAMPLE_CREATURES: [(i32, i32, u32); 13] = [
    (1, 1, 1),
    (1, 1, 1),
    (2, 1, 1),
    (2, 2, 2),
    (2, 2, 2),
    (2, 3, 2),
    (3, 2, 3),
    (3, 3, 3),
    (3, 3, 3),
    (4, 3, 4),
    (4, 4, 4),
    (5, 5, 5),
    (6, 6, 6),
];

pub fn basic_lands(count: u32, first_id: CardId) -> Vec<Card> {
    (0..count)
        .map(|offset| Card::land(first_id + offset, "Basic Land"))
        .collect()
}

/// Builds one creature per `(power, toughness, cost)` triple.
pub fn vanilla_creatures(specs: &[(i32, i32, u32)], first_id: CardId) -> Vec<Card> {
    specs
        .iter()
        .zip(first_id..)
        .map(|(&(power, toughness, cost), id)| {
            Card::creature(id, format!("Vanilla {power}/{toughness}"), cost, power, toughness)
        })
        .collect()
}

pub fn sample_deck(first_id: CardId) -> Vec<Card> {
    let mut deck = basic_lands(SAMPLE_LAND_COUNT, first_id);
    deck.extend(vanilla_creatures(
        &SAMPLE_CREATURES,
        first_id + SAMPLE_LAND_COUNT,
    ));
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_deck_has_thirty_distinct_cards() {
        let deck = sample_deck(100);
        assert_eq!(deck.len(), 30);
        assert_eq!(deck.iter().filter(|card| card.is_land()).count(), 17);

        let mut ids: Vec<CardId> = deck.iter().map(|card| card.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 30);
        assert!(deck.iter().all(Card::is_well_formed));
    }

    #[test]
    fn vanilla_creatures_carry_their_stats() {
        let creatures = vanilla_creatures(&[(1, 1, 1), (3, 2, 4)], 10);
        assert_eq!(creatures[1].id, 11);
        assert_eq!(creatures[1].power(), 3);
        assert_eq!(creatures[1].toughness(), 2);
        assert_eq!(creatures[1].cost, 4);
    }
}
