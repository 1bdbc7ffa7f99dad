use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, warn};

use crate::chemistry::{
    DissociationConstants, Molarities, NO_SPECIES_ALK_MEQ_L, NO_SPECIES_PH, NON_LIQUID_ALK_MEQ_L,
    NON_LIQUID_PH, alkalinity_meq_l, charge_balance, charge_balance_slope, mol_per_l,
};
use crate::models::{
    AqueousStream, Assumptions, BicarbonateCorrection, Phase, Species, SpeciesConcentrations,
};
use crate::speciation::root::{Root, brent};

/// Hard cap on Newton steps when refining a bracketed root. Convergence is
/// quadratic, so a handful of steps is the norm.
const POLISH_MAX_STEPS: usize = 60;

/// How the reported pH and alkalinity were obtained.
///
/// Downstream displays treat every reading the same way; this keeps the
/// difference between a solved state and a substituted default visible.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EquilibriumOutcome {
    /// Charge balance solved in `iterations` root-finder iterations.
    Solved { iterations: usize },
    /// Root finding failed; neutral [H+] was substituted.
    Fallback { reason: String },
    /// Liquid stream without any recognized species; literal defaults written.
    NoSpecies,
    /// Not a liquid stream; literal defaults written.
    NonLiquid,
}

impl EquilibriumOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, EquilibriumOutcome::Solved { .. })
    }
}

/// Result of one speciation.
///
/// - `ph`: −log10 [H+]
/// - `alkalinity`: meq/L, never negative
/// - `h_ion`: mol/L, `None` when no solve was attempted
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Speciation {
    pub ph: f64,
    pub alkalinity: f64,
    pub h_ion: Option<f64>,
    pub outcome: EquilibriumOutcome,
}

/// Molarities (mol/L) of the species present in `conc`.
///
/// Absent species contribute 0. Returns `None` if none of the recognized
/// species is present at all.
pub fn molarities_from_concentrations(conc: &SpeciesConcentrations) -> Option<Molarities> {
    if conc.is_empty() {
        return None;
    }
    let m = |sp: Species| conc.get(sp).map_or(0.0, |mg_l| mol_per_l(mg_l, sp.molar_mass()));
    Some(Molarities {
        s_cat: m(Species::Cat),
        s_an: m(Species::An),
        s_in: m(Species::In),
        s_ic: m(Species::Ic),
        s_ac: m(Species::Ac),
        s_pro: m(Species::Pro),
        s_bu: m(Species::Bu),
        s_va: m(Species::Va),
    })
}

/// Raise `alk_meq_l` to the direct bicarbonate estimate when inorganic carbon
/// exceeds the policy threshold. `None` leaves the value untouched.
pub fn apply_bicarbonate_correction(
    alk_meq_l: f64,
    m: &Molarities,
    policy: Option<&BicarbonateCorrection>,
) -> f64 {
    match policy {
        Some(p) if m.s_ic > p.ic_threshold_mol_l => {
            let direct = m.s_ic * p.bicarbonate_fraction * 1000.0;
            alk_meq_l.max(direct)
        }
        _ => alk_meq_l,
    }
}

/// Newton iteration on the charge balance started from the bracket end where
/// the residual is negative.
///
/// The residual is increasing and concave in [H+], so iterates approach the
/// root monotonically from below and never leave the bracket. A step is kept
/// only if it stays in the bracket and shrinks `|f|`; the first step that
/// does not ends the iteration.
fn polish_from_below(
    root: &Root,
    m: &Molarities,
    ka: &DissociationConstants,
) -> Option<(f64, f64)> {
    let (lo, hi) = root.bracket;
    let mut h = lo;
    let mut r = charge_balance(h, m, ka);
    if r >= 0.0 {
        return None;
    }
    for _ in 0..POLISH_MAX_STEPS {
        let step = -r / charge_balance_slope(h, m, ka);
        let next = h + step;
        if !(next.is_finite() && next > lo && next <= hi) {
            break;
        }
        let r_next = charge_balance(next, m, ka);
        if r_next.abs() >= r.abs() {
            break;
        }
        h = next;
        r = r_next;
        if r >= 0.0 || step.abs() <= f64::EPSILON * h {
            break;
        }
    }
    Some((h, r))
}

/// Charge-balance speciation with fixed constants and assumptions.
///
/// Built once and shared; holds no mutable state, so one solver can serve
/// any number of threads.
#[derive(Clone, Debug)]
pub struct EquilibriumSolver {
    constants: DissociationConstants,
    assumptions: Assumptions,
}

impl Default for EquilibriumSolver {
    fn default() -> Self {
        Self::with_constants(*DissociationConstants::standard(), &Assumptions::default())
    }
}

impl EquilibriumSolver {
    /// Constants are derived from `assumptions.pka`.
    pub fn new(assumptions: &Assumptions) -> Self {
        let assumptions = assumptions.clone().normalized();
        Self {
            constants: DissociationConstants::from_pka(&assumptions.pka),
            assumptions,
        }
    }

    /// Use `constants` as given; `assumptions.pka` is ignored.
    pub fn with_constants(constants: DissociationConstants, assumptions: &Assumptions) -> Self {
        Self {
            constants,
            assumptions: assumptions.clone().normalized(),
        }
    }

    /// Process-wide solver for the default assumptions.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<EquilibriumSolver> = OnceLock::new();
        STANDARD.get_or_init(Self::default)
    }

    pub fn constants(&self) -> &DissociationConstants {
        &self.constants
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Hydrogen-ion concentration (mol/L) balancing the charges of `m`.
    ///
    /// Never fails: an unusable constant set, a bracket without sign change,
    /// or an exhausted iteration budget all yield the fallback [H+].
    pub fn solve_h_ion(&self, m: &Molarities) -> (f64, EquilibriumOutcome) {
        let ass = &self.assumptions;
        let ka = &self.constants;

        if let Some((i, value)) = ka.first_invalid() {
            let reason = format!(
                "invalid dissociation constant {} = {value}",
                DissociationConstants::NAMES[i]
            );
            warn!(%reason, fallback_h = ass.fallback_h, "pH solve skipped");
            return (ass.fallback_h, EquilibriumOutcome::Fallback { reason });
        }

        let f = |h: f64| charge_balance(h, m, ka);
        match brent(f, ass.h_lower, ass.h_upper, ass.xtol, ass.max_iter) {
            Ok(root) => {
                let (h, residual) = match polish_from_below(&root, m, ka) {
                    Some((h, r)) if r.abs() < root.residual.abs() => (h, r),
                    _ => (root.x, root.residual),
                };
                debug!(h, residual, iterations = root.iterations, "charge balance solved");
                (h, EquilibriumOutcome::Solved { iterations: root.iterations })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(%reason, fallback_h = ass.fallback_h, "pH solve failed");
                (ass.fallback_h, EquilibriumOutcome::Fallback { reason })
            }
        }
    }

    /// pH and alkalinity for the given concentrations and phase.
    pub fn speciate(&self, conc: &SpeciesConcentrations, phase: Phase) -> Speciation {
        if phase != Phase::Liquid {
            debug!(?phase, "non-liquid stream, writing defaults");
            return Speciation {
                ph: NON_LIQUID_PH,
                alkalinity: NON_LIQUID_ALK_MEQ_L,
                h_ion: None,
                outcome: EquilibriumOutcome::NonLiquid,
            };
        }

        let Some(m) = molarities_from_concentrations(conc) else {
            debug!("no recognized species, writing defaults");
            return Speciation {
                ph: NO_SPECIES_PH,
                alkalinity: NO_SPECIES_ALK_MEQ_L,
                h_ion: None,
                outcome: EquilibriumOutcome::NoSpecies,
            };
        };

        let (h, outcome) = self.solve_h_ion(&m);
        let ph = -h.log10();
        let alk = alkalinity_meq_l(&m, ph, &self.constants);
        let alkalinity = apply_bicarbonate_correction(
            alk,
            &m,
            self.assumptions.bicarbonate_correction.as_ref(),
        );
        debug!(ph, alkalinity, equilibrium_alkalinity = alk, "speciation done");

        Speciation {
            ph,
            alkalinity,
            h_ion: Some(h),
            outcome,
        }
    }

    /// Write pH and alkalinity onto `stream` and hand the stream back.
    pub fn update_equilibrium<'a, S: AqueousStream>(&self, stream: &'a mut S) -> &'a mut S {
        self.update_equilibrium_with_outcome(stream);
        stream
    }

    /// Like [`EquilibriumSolver::update_equilibrium`], reporting how the values were obtained.
    pub fn update_equilibrium_with_outcome<S: AqueousStream>(
        &self,
        stream: &mut S,
    ) -> EquilibriumOutcome {
        let s = self.speciate(stream.concentrations(), stream.phase());
        stream.set_ph(s.ph);
        stream.set_alkalinity(s.alkalinity);
        s.outcome
    }
}

/// Update pH and alkalinity of `stream` with the standard solver.
pub fn update_equilibrium<S: AqueousStream>(stream: &mut S) -> &mut S {
    EquilibriumSolver::standard().update_equilibrium(stream)
}
