pub mod adapters;
pub mod chemistry;
pub mod error;
pub mod models;
pub mod solids;
pub mod speciation;

pub use crate::chemistry::{DissociationConstants, Molarities, PkaSet};
pub use crate::error::AppError;
pub use crate::models::{
    AqueousStream, Assumptions, BicarbonateCorrection, Phase, Species, SpeciesConcentrations,
    Stream,
};
pub use crate::solids::{ParticleSize, SolidsComponent, total_suspended_solids};
pub use crate::speciation::solver::{
    EquilibriumOutcome, EquilibriumSolver, Speciation, update_equilibrium,
};
