use serde::{Deserialize, Serialize};

use crate::chemistry::{M_AC, M_AN, M_BU, M_C, M_CAT, M_N, M_PRO, M_VA, PkaSet};
use crate::solids::{ParticleSize, SolidsComponent, total_suspended_solids};

/// Phase of a process stream. Only liquid streams are speciated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Liquid,
    Gas,
    Solid,
}

/// The species taking part in the acid-base equilibria.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    #[serde(rename = "S_cat")]
    Cat,
    #[serde(rename = "S_an")]
    An,
    #[serde(rename = "S_IN")]
    In,
    #[serde(rename = "S_IC")]
    Ic,
    #[serde(rename = "S_ac")]
    Ac,
    #[serde(rename = "S_pro")]
    Pro,
    #[serde(rename = "S_bu")]
    Bu,
    #[serde(rename = "S_va")]
    Va,
}

impl Species {
    pub const ALL: [Species; 8] = [
        Species::Cat,
        Species::An,
        Species::In,
        Species::Ic,
        Species::Ac,
        Species::Pro,
        Species::Bu,
        Species::Va,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Species::Cat => "S_cat",
            Species::An => "S_an",
            Species::In => "S_IN",
            Species::Ic => "S_IC",
            Species::Ac => "S_ac",
            Species::Pro => "S_pro",
            Species::Bu => "S_bu",
            Species::Va => "S_va",
        }
    }

    /// Molar mass (g/mol) on the basis the simulator reports the species in.
    pub fn molar_mass(self) -> f64 {
        match self {
            Species::Cat => M_CAT,
            Species::An => M_AN,
            Species::In => M_N,
            Species::Ic => M_C,
            Species::Ac => M_AC,
            Species::Pro => M_PRO,
            Species::Bu => M_BU,
            Species::Va => M_VA,
        }
    }
}

/// Mass concentrations (mg/L, i.e. g/m³) of the recognized species.
///
/// `None` marks a species the stream does not carry at all, which is
/// different from a stored zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConcentrations {
    #[serde(rename = "S_cat", default, skip_serializing_if = "Option::is_none")]
    pub s_cat: Option<f64>,
    #[serde(rename = "S_an", default, skip_serializing_if = "Option::is_none")]
    pub s_an: Option<f64>,
    #[serde(rename = "S_IN", default, skip_serializing_if = "Option::is_none")]
    pub s_in: Option<f64>,
    #[serde(rename = "S_IC", default, skip_serializing_if = "Option::is_none")]
    pub s_ic: Option<f64>,
    #[serde(rename = "S_ac", default, skip_serializing_if = "Option::is_none")]
    pub s_ac: Option<f64>,
    #[serde(rename = "S_pro", default, skip_serializing_if = "Option::is_none")]
    pub s_pro: Option<f64>,
    #[serde(rename = "S_bu", default, skip_serializing_if = "Option::is_none")]
    pub s_bu: Option<f64>,
    #[serde(rename = "S_va", default, skip_serializing_if = "Option::is_none")]
    pub s_va: Option<f64>,
}

impl SpeciesConcentrations {
    /// Build from (species, kg/m³) pairs, the unit the process simulator is fed with.
    pub fn from_kg_per_m3(pairs: &[(Species, f64)]) -> Self {
        let mut out = Self::default();
        for &(sp, kg_m3) in pairs {
            out.set(sp, kg_m3 * 1000.0);
        }
        out
    }

    pub fn get(&self, species: Species) -> Option<f64> {
        *self.slot(species)
    }

    pub fn set(&mut self, species: Species, mg_l: f64) {
        *self.slot_mut(species) = Some(mg_l);
    }

    pub fn is_empty(&self) -> bool {
        Species::ALL.iter().all(|&sp| self.get(sp).is_none())
    }

    fn slot(&self, species: Species) -> &Option<f64> {
        match species {
            Species::Cat => &self.s_cat,
            Species::An => &self.s_an,
            Species::In => &self.s_in,
            Species::Ic => &self.s_ic,
            Species::Ac => &self.s_ac,
            Species::Pro => &self.s_pro,
            Species::Bu => &self.s_bu,
            Species::Va => &self.s_va,
        }
    }

    fn slot_mut(&mut self, species: Species) -> &mut Option<f64> {
        match species {
            Species::Cat => &mut self.s_cat,
            Species::An => &mut self.s_an,
            Species::In => &mut self.s_in,
            Species::Ic => &mut self.s_ic,
            Species::Ac => &mut self.s_ac,
            Species::Pro => &mut self.s_pro,
            Species::Bu => &mut self.s_bu,
            Species::Va => &mut self.s_va,
        }
    }
}

/// What the speciation solver needs from a process stream.
///
/// The simulator owns the stream; this crate only reads its phase and
/// concentrations and overwrites the two equilibrium outputs.
pub trait AqueousStream {
    fn phase(&self) -> Phase;
    fn concentrations(&self) -> &SpeciesConcentrations;
    fn set_ph(&mut self, ph: f64);
    /// Alkalinity in meq/L.
    fn set_alkalinity(&mut self, alk_meq_l: f64);
}

/// A process stream as exchanged with the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub concentrations: SpeciesConcentrations,
    #[serde(default)]
    pub solids: Vec<SolidsComponent>,
    #[serde(default = "default_ph")]
    pub ph: f64,
    /// Alkalinity (SAlk) in meq/L.
    #[serde(default)]
    pub alkalinity: f64,
}

fn default_ph() -> f64 {
    7.0
}

impl Stream {
    pub fn new(id: impl Into<String>, phase: Phase, concentrations: SpeciesConcentrations) -> Self {
        Self {
            id: id.into(),
            phase,
            concentrations,
            solids: Vec::new(),
            ph: default_ph(),
            alkalinity: 0.0,
        }
    }

    pub fn with_solids(mut self, solids: Vec<SolidsComponent>) -> Self {
        self.solids = solids;
        self
    }

    /// Total suspended solids (mg/L); see [`total_suspended_solids`].
    pub fn total_suspended_solids(&self, particle_size: Option<ParticleSize>) -> f64 {
        total_suspended_solids(&self.solids, particle_size)
    }
}

impl AqueousStream for Stream {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn concentrations(&self) -> &SpeciesConcentrations {
        &self.concentrations
    }

    fn set_ph(&mut self, ph: f64) {
        self.ph = ph;
    }

    fn set_alkalinity(&mut self, alk_meq_l: f64) {
        self.alkalinity = alk_meq_l;
    }
}

/// Direct bicarbonate estimate used as an alkalinity floor when inorganic
/// carbon dominates buffering.
///
/// Heuristic: above `ic_threshold_mol_l` the reported alkalinity is at least
/// `bicarbonate_fraction · S_IC · 1000` meq/L.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BicarbonateCorrection {
    pub ic_threshold_mol_l: f64,
    pub bicarbonate_fraction: f64,
}

impl Default for BicarbonateCorrection {
    fn default() -> Self {
        Self {
            ic_threshold_mol_l: 0.01,
            bicarbonate_fraction: 0.7,
        }
    }
}

/// Calculation assumptions for the speciation solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    pub pka: PkaSet,
    /// Lower end of the [H+] bracket (mol/L).
    pub h_lower: f64,
    /// Upper end of the [H+] bracket (mol/L).
    pub h_upper: f64,
    /// Absolute tolerance on [H+].
    pub xtol: f64,
    pub max_iter: usize,
    /// [H+] substituted when the root finder fails (pH 7).
    pub fallback_h: f64,
    /// `None` disables the inorganic-carbon alkalinity floor.
    pub bicarbonate_correction: Option<BicarbonateCorrection>,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            pka: PkaSet::default(),
            h_lower: 1e-14,
            h_upper: 1.0,
            xtol: 1e-12,
            max_iter: 100,
            fallback_h: 1e-7,
            bicarbonate_correction: Some(BicarbonateCorrection::default()),
        }
    }
}

impl Assumptions {
    /// Replace values the solver cannot work with by their defaults.
    pub fn normalized(mut self) -> Self {
        let d = Self::default();
        let bracket_ok = self.h_lower.is_finite()
            && self.h_upper.is_finite()
            && self.h_lower > 0.0
            && self.h_upper <= 1.0
            && self.h_lower < self.h_upper;
        if !bracket_ok {
            self.h_lower = d.h_lower;
            self.h_upper = d.h_upper;
        }
        if !(self.xtol.is_finite() && self.xtol > 0.0) {
            self.xtol = d.xtol;
        }
        if self.max_iter == 0 {
            self.max_iter = d.max_iter;
        }
        if !(self.fallback_h > self.h_lower && self.fallback_h < self.h_upper) {
            self.fallback_h = d.fallback_h;
        }
        if let Some(c) = self.bicarbonate_correction {
            if !(c.ic_threshold_mol_l.is_finite() && c.bicarbonate_fraction.is_finite()) {
                self.bicarbonate_correction = d.bicarbonate_correction;
            } else {
                self.bicarbonate_correction = Some(BicarbonateCorrection {
                    ic_threshold_mol_l: c.ic_threshold_mol_l.max(0.0),
                    bicarbonate_fraction: c.bicarbonate_fraction.clamp(0.0, 1.0),
                });
            }
        }
        self
    }
}
