//! Speaking order generation.
//!
//! A fresh order is generated once per deliberation round. Every order is a
//! permutation of the participant ids; the full history is kept so that
//! cross-round constraints can be checked.

use crate::participant::ParticipantId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Shuffle attempts before the random pattern accepts an order unconditionally
pub const MAX_REORDER_ATTEMPTS: usize = 10;

/// How turn order is produced each round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingOrderPattern {
    /// Shuffle, avoiding the previous round's last speaker opening the round
    #[default]
    Random,
    /// Sorted ids rotated left by `(round - 1) mod n`
    Sequential,
    /// The first `leaders` sorted ids shuffled, then the rest shuffled
    Hierarchical { leaders: usize },
}

impl SpeakingOrderPattern {
    pub fn description(&self) -> String {
        match self {
            SpeakingOrderPattern::Random => "random (no back-to-back speaker)".to_string(),
            SpeakingOrderPattern::Sequential => "sequential rotation".to_string(),
            SpeakingOrderPattern::Hierarchical { leaders } => {
                format!("hierarchical ({} leaders first)", leaders)
            }
        }
    }
}

impl std::fmt::Display for SpeakingOrderPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeakingOrderPattern::Random => write!(f, "random"),
            SpeakingOrderPattern::Sequential => write!(f, "sequential"),
            SpeakingOrderPattern::Hierarchical { leaders } => write!(f, "hierarchical:{}", leaders),
        }
    }
}

impl std::str::FromStr for SpeakingOrderPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SpeakingOrderPattern::Random),
            "sequential" => Ok(SpeakingOrderPattern::Sequential),
            s if s.starts_with("hierarchical:") => {
                let leaders: usize = s
                    .trim_start_matches("hierarchical:")
                    .parse()
                    .map_err(|_| "Invalid leader count for hierarchical")?;
                Ok(SpeakingOrderPattern::Hierarchical { leaders })
            }
            _ => Err(format!(
                "Unknown speaking order: {}. Valid: random, sequential, hierarchical:K",
                s
            )),
        }
    }
}

/// Turn order for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakingOrder {
    pub round_number: u32,
    pub order: Vec<ParticipantId>,
}

impl SpeakingOrder {
    pub fn first(&self) -> Option<&ParticipantId> {
        self.order.first()
    }

    pub fn last(&self) -> Option<&ParticipantId> {
        self.order.last()
    }

    /// True when the order contains every id exactly once
    pub fn is_permutation_of(&self, participants: &[ParticipantId]) -> bool {
        if self.order.len() != participants.len() {
            return false;
        }
        let expected: HashSet<&ParticipantId> = participants.iter().collect();
        let seen: HashSet<&ParticipantId> = self.order.iter().collect();
        seen.len() == self.order.len() && seen == expected
    }
}

/// Produces one [`SpeakingOrder`] per round and remembers all of them
#[derive(Debug, Clone)]
pub struct SpeakingOrderGenerator {
    pattern: SpeakingOrderPattern,
    history: Vec<SpeakingOrder>,
}

impl SpeakingOrderGenerator {
    pub fn new(pattern: SpeakingOrderPattern) -> Self {
        Self {
            pattern,
            history: Vec::new(),
        }
    }

    pub fn pattern(&self) -> SpeakingOrderPattern {
        self.pattern
    }

    pub fn history(&self) -> &[SpeakingOrder] {
        &self.history
    }

    pub fn into_history(self) -> Vec<SpeakingOrder> {
        self.history
    }

    /// Generate, record and return the order for `round_number`
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        round_number: u32,
        participants: &[ParticipantId],
        rng: &mut R,
    ) -> SpeakingOrder {
        let order = match self.pattern {
            SpeakingOrderPattern::Random => self.random_order(round_number, participants, rng),
            SpeakingOrderPattern::Sequential => sequential_order(round_number, participants),
            SpeakingOrderPattern::Hierarchical { leaders } => {
                hierarchical_order(leaders, participants, rng)
            }
        };

        let order = SpeakingOrder {
            round_number,
            order,
        };
        self.history.push(order.clone());
        order
    }

    fn random_order<R: Rng + ?Sized>(
        &self,
        round_number: u32,
        participants: &[ParticipantId],
        rng: &mut R,
    ) -> Vec<ParticipantId> {
        let mut order = participants.to_vec();
        let previous_last = if round_number > 1 {
            self.history.last().and_then(|o| o.last()).cloned()
        } else {
            None
        };

        let Some(previous_last) = previous_last else {
            order.shuffle(rng);
            return order;
        };

        for attempt in 1..=MAX_REORDER_ATTEMPTS {
            order.shuffle(rng);
            if order.first() != Some(&previous_last) {
                return order;
            }
            debug!(
                "Round {}: attempt {} opens with previous closer {}",
                round_number, attempt, previous_last
            );
        }

        debug!(
            "Round {}: accepting order after {} attempts",
            round_number, MAX_REORDER_ATTEMPTS
        );
        order
    }
}

fn sequential_order(round_number: u32, participants: &[ParticipantId]) -> Vec<ParticipantId> {
    let mut order = participants.to_vec();
    order.sort();
    if !order.is_empty() {
        let shift = round_number.saturating_sub(1) as usize % order.len();
        order.rotate_left(shift);
    }
    order
}

fn hierarchical_order<R: Rng + ?Sized>(
    leaders: usize,
    participants: &[ParticipantId],
    rng: &mut R,
) -> Vec<ParticipantId> {
    let mut sorted = participants.to_vec();
    sorted.sort();
    let split = leaders.min(sorted.len());
    let mut followers = sorted.split_off(split);

    sorted.shuffle(rng);
    followers.shuffle(rng);
    sorted.extend(followers);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(ParticipantId::from_index).collect()
    }

    #[test]
    fn test_sequential_keeps_roster_order_past_nine_participants() {
        let participants: Vec<ParticipantId> = ids(12).into_iter().rev().collect();
        let mut generator = SpeakingOrderGenerator::new(SpeakingOrderPattern::Sequential);
        let mut rng = StdRng::seed_from_u64(0);

        let first = generator.generate(1, &participants, &mut rng);
        assert_eq!(first.order, ids(12));

        let second = generator.generate(2, &participants, &mut rng);
        assert_eq!(second.order[0], ParticipantId::from_index(1));
        assert_eq!(second.order[11], ParticipantId::from_index(0));
    }

    #[test]
    fn test_hierarchical_leaders_are_lowest_roster_positions() {
        let participants = ids(11);
        let mut generator =
            SpeakingOrderGenerator::new(SpeakingOrderPattern::Hierarchical { leaders: 2 });
        let mut rng = StdRng::seed_from_u64(4);

        let order = generator.generate(1, &participants, &mut rng);
        let leaders: HashSet<_> = order.order[..2].iter().cloned().collect();
        assert_eq!(leaders, ids(2).into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn test_every_pattern_yields_permutations() {
        let participants = ids(5);
        let mut rng = StdRng::seed_from_u64(7);

        for pattern in [
            SpeakingOrderPattern::Random,
            SpeakingOrderPattern::Sequential,
            SpeakingOrderPattern::Hierarchical { leaders: 2 },
            SpeakingOrderPattern::Hierarchical { leaders: 9 },
        ] {
            let mut generator = SpeakingOrderGenerator::new(pattern);
            for round in 1..=6 {
                let order = generator.generate(round, &participants, &mut rng);
                assert!(order.is_permutation_of(&participants), "{}", pattern);
            }
            assert_eq!(generator.history().len(), 6);
        }
    }

    #[test]
    fn test_random_avoids_back_to_back_speaker() {
        let participants = ids(3);
        let mut differs = 0;

        for trial in 0..10 {
            let mut rng = StdRng::seed_from_u64(trial);
            let mut generator = SpeakingOrderGenerator::new(SpeakingOrderPattern::Random);
            let first = generator.generate(1, &participants, &mut rng);
            let second = generator.generate(2, &participants, &mut rng);
            if second.first() != first.last() {
                differs += 1;
            }
        }

        assert!(differs >= 9, "only {} of 10 trials differed", differs);
    }

    #[test]
    fn test_random_single_participant_uses_fallback() {
        let participants = ids(1);
        let mut rng = StdRng::seed_from_u64(1);
        let mut generator = SpeakingOrderGenerator::new(SpeakingOrderPattern::Random);

        generator.generate(1, &participants, &mut rng);
        let second = generator.generate(2, &participants, &mut rng);
        assert_eq!(second.order, participants);
    }

    #[test]
    fn test_sequential_rotates_by_round() {
        let participants = vec![
            ParticipantId::from("c"),
            ParticipantId::from("a"),
            ParticipantId::from("b"),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let mut generator = SpeakingOrderGenerator::new(SpeakingOrderPattern::Sequential);

        let names = |o: SpeakingOrder| {
            o.order
                .iter()
                .map(|id| id.as_str().to_string())
                .collect::<Vec<_>>()
        };

        let mut next = |round| names(generator.generate(round, &participants, &mut rng));
        assert_eq!(next(1), ["a", "b", "c"]);
        assert_eq!(next(2), ["b", "c", "a"]);
        assert_eq!(next(3), ["c", "a", "b"]);
        assert_eq!(next(4), ["a", "b", "c"]);
    }

    #[test]
    fn test_hierarchical_leaders_speak_first() {
        let participants = ids(6);
        let mut rng = StdRng::seed_from_u64(42);
        let mut generator =
            SpeakingOrderGenerator::new(SpeakingOrderPattern::Hierarchical { leaders: 2 });

        let order = generator.generate(1, &participants, &mut rng);
        let mut sorted = participants.clone();
        sorted.sort();
        let leaders: HashSet<_> = sorted[..2].iter().collect();

        assert!(order.order[..2].iter().all(|id| leaders.contains(id)));
        assert!(order.order[2..].iter().all(|id| !leaders.contains(id)));
    }

    #[test]
    fn test_is_permutation_rejects_duplicates() {
        let participants = ids(2);
        let order = SpeakingOrder {
            round_number: 1,
            order: vec![participants[0].clone(), participants[0].clone()],
        };
        assert!(!order.is_permutation_of(&participants));
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(
            "random".parse::<SpeakingOrderPattern>().ok(),
            Some(SpeakingOrderPattern::Random)
        );
        assert_eq!(
            "Sequential".parse::<SpeakingOrderPattern>().ok(),
            Some(SpeakingOrderPattern::Sequential)
        );
        assert_eq!(
            "hierarchical:3".parse::<SpeakingOrderPattern>().ok(),
            Some(SpeakingOrderPattern::Hierarchical { leaders: 3 })
        );
        assert!("hierarchical:x".parse::<SpeakingOrderPattern>().is_err());
        assert!("shouting".parse::<SpeakingOrderPattern>().is_err());
    }
}
