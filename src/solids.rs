//! Suspended-solids accounting for process streams.
//!
//! Soluble components can carry a nonzero mass factor in the simulator's
//! component registry (acetate is the usual example). They are dissolved,
//! so they never count towards total suspended solids.

use serde::{Deserialize, Serialize};

/// Size class of a stream component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleSize {
    Soluble,
    Colloidal,
    Particulate,
}

/// Solids contribution of one component (mg/L).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolidsComponent {
    pub id: String,
    pub particle_size: ParticleSize,
    pub mg_l: f64,
}

impl SolidsComponent {
    pub fn new(id: impl Into<String>, particle_size: ParticleSize, mg_l: f64) -> Self {
        Self {
            id: id.into(),
            particle_size,
            mg_l,
        }
    }
}

/// Total suspended solids (mg/L).
///
/// With `None` this is particulate plus colloidal solids only. With a size
/// class it is the solids of that class alone. Negative entries count as 0.
pub fn total_suspended_solids(
    components: &[SolidsComponent],
    particle_size: Option<ParticleSize>,
) -> f64 {
    let sum_of = |size: ParticleSize| -> f64 {
        components
            .iter()
            .filter(|c| c.particle_size == size)
            .map(|c| c.mg_l.max(0.0))
            .sum()
    };
    match particle_size {
        Some(size) => sum_of(size),
        None => sum_of(ParticleSize::Particulate) + sum_of(ParticleSize::Colloidal),
    }
}
