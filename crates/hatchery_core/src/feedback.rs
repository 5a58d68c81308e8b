//! Cosmetic output produced on the replica side.
//!
//! The core only describes particles and sounds; the host renders and
//! plays them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::breeds::Breed;
use crate::data::ParticleStyle;
use crate::math::{Fixed, Vec3Fixed};

/// Particle appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Colored dust mote, stationary.
    Dust {
        /// RGB color.
        color: [u8; 3],
    },
    /// Portal mote drifting with the given velocity.
    Portal {
        /// Drift velocity.
        velocity: Vec3Fixed,
    },
}

/// A single particle to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Particle {
    /// Spawn position.
    pub position: Vec3Fixed,
    /// Appearance.
    pub kind: ParticleKind,
}

/// Sounds played locally on a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Egg hatching.
    Hatch,
    /// Egg shell cracking during a wiggle.
    Crack,
}

/// Uniform value in `[-0.5, 0.5)` built from raw fixed-point bits.
fn jitter<R: Rng + ?Sized>(rng: &mut R) -> Fixed {
    Fixed::from_bits(rng.gen_range(-(1i64 << 31)..(1i64 << 31)))
}

fn jitter_vec<R: Rng + ?Sized>(rng: &mut R) -> Vec3Fixed {
    Vec3Fixed::new(jitter(rng), jitter(rng), jitter(rng))
}

/// One incubation particle for `breed` around `center`, raised by `y_offset`.
///
/// Dust picks the primary color three times out of four. Portal motes are
/// not raised and drift in a random direction.
pub fn hatching_particle<R: Rng + ?Sized>(
    breed: &Breed,
    center: Vec3Fixed,
    y_offset: Fixed,
    rng: &mut R,
) -> Particle {
    let position = center + jitter_vec(rng);

    match breed.particle {
        ParticleStyle::Portal => {
            let two = Fixed::from_num(2);
            let drift = jitter_vec(rng);
            Particle {
                position,
                kind: ParticleKind::Portal {
                    velocity: Vec3Fixed::new(drift.x * two, drift.y * two, drift.z * two),
                },
            }
        }
        ParticleStyle::Dust => {
            let color = if rng.gen_ratio(3, 4) {
                breed.primary_color
            } else {
                breed.secondary_color
            };
            Particle {
                position: Vec3Fixed::new(position.x, position.y + y_offset, position.z),
                kind: ParticleKind::Dust { color },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::breeds::BreedId;

    fn breed(particle: ParticleStyle) -> Breed {
        Breed {
            id: BreedId::parse("test").unwrap(),
            primary_color: [255, 0, 0],
            secondary_color: [0, 0, 255],
            particle,
            habitats: Vec::new(),
        }
    }

    #[test]
    fn test_dust_stays_near_center_and_uses_breed_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = Vec3Fixed::from_ints(10, 64, -3);
        let b = breed(ParticleStyle::Dust);
        let half = Fixed::from_num(0.5);

        for _ in 0..200 {
            let p = hatching_particle(&b, center, Fixed::ONE, &mut rng);
            assert!((p.position.x - center.x).abs() <= half);
            assert!((p.position.z - center.z).abs() <= half);
            let dy = p.position.y - center.y - Fixed::ONE;
            assert!(dy.abs() <= half);
            match p.kind {
                ParticleKind::Dust { color } => {
                    assert!(color == b.primary_color || color == b.secondary_color);
                }
                ParticleKind::Portal { .. } => panic!("dust breed produced portal particle"),
            }
        }
    }

    #[test]
    fn test_portal_particles_drift() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = breed(ParticleStyle::Portal);
        let p = hatching_particle(&b, Vec3Fixed::ZERO, Fixed::ONE, &mut rng);
        assert!(matches!(p.kind, ParticleKind::Portal { .. }));
        // Portal motes ignore the vertical offset
        assert!(p.position.y.abs() <= Fixed::from_num(0.5));
    }

    #[test]
    fn test_same_seed_same_particles() {
        let b = breed(ParticleStyle::Dust);
        let mut a = StdRng::seed_from_u64(3);
        let mut c = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(
                hatching_particle(&b, Vec3Fixed::ZERO, Fixed::ONE, &mut a),
                hatching_particle(&b, Vec3Fixed::ZERO, Fixed::ONE, &mut c)
            );
        }
    }
}
