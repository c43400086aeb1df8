use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const STARTING_LIFE: i32 = 20;

/// Identifier of a card definition.
pub type CardId = u32;
/// Seat index, 0 or 1.
pub type PlayerId = u8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardType {
    Land,
    Creature,
    Sorcery,
}

impl CardType {
    pub fn index(self) -> i8 {
        match self {
            CardType::Land => 0,
            CardType::Creature => 1,
            CardType::Sorcery => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatureStats {
    pub power: i32,
    pub toughness: i32,
}

/// Immutable card definition. `stats` is present exactly when the card is a creature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub card_type: CardType,
    #[serde(default)]
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<CreatureStats>,
}

impl Card {
    pub fn land(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            card_type: CardType::Land,
            cost: 0,
            stats: None,
        }
    }

    pub fn creature(
        id: CardId,
        name: impl Into<String>,
        cost: u32,
        power: i32,
        toughness: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            card_type: CardType::Creature,
            cost,
            stats: Some(CreatureStats { power, toughness }),
        }
    }

    pub fn sorcery(id: CardId, name: impl Into<String>, cost: u32) -> Self {
        Self {
            id,
            name: name.into(),
            card_type: CardType::Sorcery,
            cost,
            stats: None,
        }
    }

    pub fn is_land(&self) -> bool {
        self.card_type == CardType::Land
    }

    pub fn is_creature(&self) -> bool {
        self.card_type == CardType::Creature
    }

    pub fn power(&self) -> i32 {
        self.stats.map(|stats| stats.power).unwrap_or(0)
    }

    pub fn toughness(&self) -> i32 {
        self.stats.map(|stats| stats.toughness).unwrap_or(0)
    }

    pub fn is_well_formed(&self) -> bool {
        self.is_creature() == self.stats.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LandPermanent {
    pub card: Card,
    #[serde(default)]
    pub tapped: bool,
}

impl LandPermanent {
    pub fn new(card: Card) -> Option<Self> {
        card.is_land().then_some(Self {
            card,
            tapped: false,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreaturePermanent {
    pub card: Card,
    #[serde(default)]
    pub damage: i32,
    #[serde(default)]
    pub tapped: bool,
    #[serde(default)]
    pub summoning_sick: bool,
}

impl CreaturePermanent {
    /// Enters untapped, undamaged and summoning-sick.
    pub fn new(card: Card) -> Option<Self> {
        card.is_creature().then_some(Self {
            card,
            damage: 0,
            tapped: false,
            summoning_sick: true,
        })
    }

    pub fn power(&self) -> i32 {
        self.card.power()
    }

    pub fn toughness(&self) -> i32 {
        self.card.toughness()
    }

    pub fn can_attack(&self) -> bool {
        !self.tapped && !self.summoning_sick
    }
}

/// Per-seat zones and counters. The top of the library is its last element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerState {
    pub life: i32,
    #[serde(default)]
    pub library: Vec<Card>,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub lands: Vec<LandPermanent>,
    #[serde(default)]
    pub creatures: Vec<CreaturePermanent>,
    #[serde(default)]
    pub graveyard: Vec<Card>,
    #[serde(default)]
    pub lands_played_this_turn: u32,
    #[serde(default)]
    pub mana_pool: u32,
}

impl PlayerState {
    pub fn new(life: i32, library: Vec<Card>) -> Self {
        Self {
            life,
            library,
            hand: Vec::new(),
            lands: Vec::new(),
            creatures: Vec::new(),
            graveyard: Vec::new(),
            lands_played_this_turn: 0,
            mana_pool: 0,
        }
    }

    pub fn ready_permanents(&mut self) {
        for land in &mut self.lands {
            land.tapped = false;
        }
        for creature in &mut self.creatures {
            creature.tapped = false;
            creature.summoning_sick = false;
        }
    }

    pub fn clear_damage(&mut self) {
        for creature in &mut self.creatures {
            creature.damage = 0;
        }
    }

    fn cards(&self) -> impl Iterator<Item = &Card> {
        self.library
            .iter()
            .chain(self.hand.iter())
            .chain(self.graveyard.iter())
            .chain(self.lands.iter().map(|land| &land.card))
            .chain(self.creatures.iter().map(|creature| &creature.card))
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(STARTING_LIFE, Vec::new())
    }
}

/// Turn phases in order; `Draw` is only ever observed transiently or after a draw-out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GamePhase {
    Draw,
    Main,
    Combat,
    End,
}

impl GamePhase {
    pub fn index(self) -> u8 {
        match self {
            GamePhase::Draw => 0,
            GamePhase::Main => 1,
            GamePhase::Combat => 2,
            GamePhase::End => 3,
        }
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Draw
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VictoryReason {
    LifeDepleted,
    DeckOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VictoryState {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub reason: VictoryReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardDrawn {
        player_id: PlayerId,
        card_id: CardId,
    },
    TurnStarted {
        player_id: PlayerId,
        turn: u32,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    LandPlayed {
        player_id: PlayerId,
        card_id: CardId,
    },
    ManaAdded {
        player_id: PlayerId,
        land_index: usize,
        mana_pool: u32,
    },
    CreatureCast {
        player_id: PlayerId,
        card_id: CardId,
        cost: u32,
    },
    AttackDeclared {
        player_id: PlayerId,
        attackers: Vec<usize>,
        power: i32,
    },
    DamageResolved {
        source_player: PlayerId,
        target_player: PlayerId,
        amount: i32,
        remaining_life: i32,
    },
    CardDiscarded {
        player_id: PlayerId,
        card_id: CardId,
    },
    TurnEnded {
        player_id: PlayerId,
    },
    GameWon {
        winner: PlayerId,
        loser: PlayerId,
        reason: VictoryReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    InvalidPlayerIndex { player_id: PlayerId },
    MalformedCard { card_id: CardId },
    LandPermanentMismatch { card_id: CardId, actual: CardType },
    CreaturePermanentMismatch { card_id: CardId, actual: CardType },
    InconsistentOutcome { winner: PlayerId, loser: PlayerId },
}

/// Whole-game state. Mutated only through `RuleEngine`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub players: [PlayerState; 2],
    pub active: PlayerId,
    pub phase: GamePhase,
    pub turn: u32,
    pub rng: ChaCha8Rng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryState>,
}

impl GameState {
    pub fn new(players: [PlayerState; 2], seed: u64) -> Self {
        Self {
            players,
            active: 0,
            phase: GamePhase::default(),
            turn: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            outcome: None,
        }
    }

    pub fn with_phase(mut self, phase: GamePhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[usize::from(id)]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[usize::from(id)]
    }

    pub fn active_player(&self) -> &PlayerState {
        self.player(self.active)
    }

    pub fn active_player_mut(&mut self) -> &mut PlayerState {
        self.player_mut(self.active)
    }

    pub fn opponent_of(player_id: PlayerId) -> PlayerId {
        1 - player_id
    }

    pub fn defending_player(&self) -> PlayerId {
        Self::opponent_of(self.active)
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.as_ref().map(|outcome| outcome.winner)
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.outcome.as_ref().map(|outcome| outcome.loser)
    }

    /// Moves the top of the library into hand. An empty library ends the game
    /// with `player_id` as the loser and returns `None`.
    pub fn draw_card(&mut self, player_id: PlayerId) -> Option<GameEvent> {
        let player = self.player_mut(player_id);
        match player.library.pop() {
            Some(card) => {
                let card_id = card.id;
                player.hand.push(card);
                Some(GameEvent::CardDrawn { player_id, card_id })
            }
            None => {
                self.declare_victory(
                    Self::opponent_of(player_id),
                    player_id,
                    VictoryReason::DeckOut,
                );
                None
            }
        }
    }

    /// The first declared outcome sticks; later calls return it unchanged.
    pub fn declare_victory(
        &mut self,
        winner: PlayerId,
        loser: PlayerId,
        reason: VictoryReason,
    ) -> VictoryState {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let victory = VictoryState {
            winner,
            loser,
            reason,
        };
        log::info!(
            "game over on turn {}: player {} wins ({:?})",
            self.turn,
            winner,
            reason
        );
        self.outcome = Some(victory.clone());
        victory
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if usize::from(self.active) >= self.players.len() {
            return Err(IntegrityError::InvalidPlayerIndex {
                player_id: self.active,
            });
        }

        if let Some(outcome) = &self.outcome {
            if outcome.winner == outcome.loser || outcome.winner > 1 || outcome.loser > 1 {
                return Err(IntegrityError::InconsistentOutcome {
                    winner: outcome.winner,
                    loser: outcome.loser,
                });
            }
        }

        for player in &self.players {
            if let Some(card) = player.cards().find(|card| !card.is_well_formed()) {
                return Err(IntegrityError::MalformedCard { card_id: card.id });
            }
            if let Some(land) = player.lands.iter().find(|land| !land.card.is_land()) {
                return Err(IntegrityError::LandPermanentMismatch {
                    card_id: land.card.id,
                    actual: land.card.card_type,
                });
            }
            if let Some(creature) = player
                .creatures
                .iter()
                .find(|creature| !creature.card.is_creature())
            {
                return Err(IntegrityError::CreaturePermanentMismatch {
                    card_id: creature.card.id,
                    actual: creature.card.card_type,
                });
            }
        }

        Ok(())
    }
}
