//! Habitat evaluation: which breed does a location favour?

use crate::breeds::{Breed, BreedRegistry};
use crate::math::BlockPos;
use crate::world::EggWorld;

/// Score every breed at `pos`, in registry order.
pub fn score_all<'r, W: EggWorld + ?Sized>(
    registry: &'r BreedRegistry,
    world: &W,
    pos: BlockPos,
) -> Vec<(&'r Breed, u32)> {
    registry
        .iter()
        .map(|breed| (breed, world.habitat_points(breed, pos)))
        .collect()
}

/// Pick the breed best suited to `pos`.
///
/// Only breeds scoring strictly more than `min_points` are eligible. The
/// highest score wins and ties keep the breed found first. Returns `None`
/// when nothing is eligible.
pub fn evaluate<'r, W: EggWorld + ?Sized>(
    registry: &'r BreedRegistry,
    world: &W,
    pos: BlockPos,
    min_points: u32,
) -> Option<&'r Breed> {
    let mut winner = None;
    let mut best = min_points;

    for (breed, points) in score_all(registry, world, pos) {
        if points > best {
            winner = Some(breed);
            best = points;
        }
    }

    if let Some(breed) = winner {
        tracing::trace!(breed = %breed.id, points = best, ?pos, "Habitat winner");
    }
    winner
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::{BreedData, ParticleStyle};

    struct Scores(HashMap<&'static str, u32>);

    impl EggWorld for Scores {
        fn habitat_points(&self, breed: &Breed, _pos: BlockPos) -> u32 {
            self.0.get(breed.id.as_str()).copied().unwrap_or(0)
        }
    }

    fn registry(ids: &[&str]) -> BreedRegistry {
        let data = ids
            .iter()
            .map(|id| BreedData {
                id: (*id).to_string(),
                primary_color: [0; 3],
                secondary_color: [0; 3],
                particle: ParticleStyle::Dust,
                habitats: Vec::new(),
            })
            .collect();
        BreedRegistry::new(data, None).unwrap()
    }

    fn winner(ids: &[&str], scores: &[(&'static str, u32)]) -> Option<String> {
        let reg = registry(ids);
        let world = Scores(scores.iter().copied().collect());
        evaluate(&reg, &world, BlockPos::default(), 2).map(|b| b.id.to_string())
    }

    #[test]
    fn test_highest_above_threshold_wins() {
        assert_eq!(
            winner(
                &["water", "ice", "fire"],
                &[("fire", 5), ("ice", 3), ("water", 1)]
            )
            .as_deref(),
            Some("fire")
        );
    }

    #[test]
    fn test_nothing_above_threshold() {
        assert_eq!(winner(&["fire", "ice"], &[("fire", 2), ("ice", 1)]), None);
    }

    #[test]
    fn test_ties_keep_first_in_registry_order() {
        assert_eq!(
            winner(&["ice", "fire"], &[("fire", 4), ("ice", 4)]).as_deref(),
            Some("ice")
        );
        assert_eq!(
            winner(&["fire", "ice"], &[("fire", 4), ("ice", 4)]).as_deref(),
            Some("fire")
        );
    }

    #[test]
    fn test_score_all_preserves_order() {
        let reg = registry(&["a", "b", "c"]);
        let world = Scores([("b", 7)].into_iter().collect());
        let scores: Vec<_> = score_all(&reg, &world, BlockPos::default())
            .into_iter()
            .map(|(b, p)| (b.id.to_string(), p))
            .collect();
        assert_eq!(
            scores,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 7),
                ("c".to_string(), 0)
            ]
        );
    }
}
