//! Chemistry module: constants and pure functions for digester liquor acid-base equilibria.
//!
//! This module provides:
//! - Molar masses (g/mol) used to convert the simulator's mass concentrations to molarity
//! - The default pKa table at 25 °C and the derived dissociation constants
//! - Dissociated (basic) fractions of the weak acid/base pairs
//! - The charge-balance residual solved for the hydrogen-ion concentration
//! - Alkalinity (meq/L) at a given pH
//!
//! Units conventions:
//! - Mass concentrations are mg/L (equivalently g/m³) unless otherwise stated
//! - Molarities are mol/L
//! - Alkalinity is meq/L
//!
//! Design notes:
//! - Strong cations and anions are lumped as monovalent species with unit molar mass
//! - Inorganic nitrogen and carbon are expressed on an elemental basis (as N, as C)
//! - Organic acids use approximate molecular weights of the free acids
//! - Nothing here mutates state; every function may be called from any thread
//!
//! # Examples
//! ```rust
//! use digester_ph::chemistry::{DissociationConstants, Molarities, alkalinity_meq_l, charge_balance};
//!
//! let ka = DissociationConstants::standard();
//! let m = Molarities { s_cat: 0.04, s_an: 0.02, ..Default::default() };
//! // Excess strong cations: the residual is already positive at pH 7, and it
//! // grows with [H+], so the root lies above pH 7.
//! assert!(charge_balance(1e-7, &m, ka) > 0.0);
//! assert!(alkalinity_meq_l(&m, 12.0, ka) > 0.0);
//! ```
//!
//! # Panics
//! None of the functions panic.
//!
//! # Limitations
//! No activity corrections, no temperature dependence of the constants, no
//! carbonate (CO3^2-) or phosphate terms.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Lumped strong cations, taken as monovalent with unit molar mass.
pub const M_CAT: f64 = 1.0;
/// Lumped strong anions, taken as monovalent with unit molar mass.
pub const M_AN: f64 = 1.0;
/// Nitrogen (inorganic nitrogen is reported as N).
pub const M_N: f64 = 14.007;
/// Carbon (inorganic carbon is reported as C).
pub const M_C: f64 = 12.011;
pub const M_AC: f64 = 60.0;
pub const M_PRO: f64 = 74.0;
pub const M_BU: f64 = 88.0;
pub const M_VA: f64 = 102.0;

/// Literature pKa values at 25 °C.
pub const PKA_W: f64 = 14.0;
pub const PKA_NH: f64 = 9.25;
pub const PKA_CO2: f64 = 6.35;
pub const PKA_AC: f64 = 4.76;
pub const PKA_PRO: f64 = 4.88;
pub const PKA_BU: f64 = 4.82;
pub const PKA_VA: f64 = 4.86;

/// Outputs written for streams that are not liquid.
pub const NON_LIQUID_PH: f64 = 7.0;
pub const NON_LIQUID_ALK_MEQ_L: f64 = 0.0;
/// Outputs written when a liquid stream carries none of the recognized species.
pub const NO_SPECIES_PH: f64 = 7.0;
pub const NO_SPECIES_ALK_MEQ_L: f64 = 2.5;

pub const TINY: f64 = 1e-20;

/// Convert mass concentration (mg/L) to molar concentration (mol/L).
///
/// Negative concentrations are treated as 0; the molar mass is guarded
/// against division by ~0 via `TINY`.
pub fn mol_per_l(mg_l: f64, molar_mass_g_mol: f64) -> f64 {
    (mg_l.max(0.0)) / 1000.0 / molar_mass_g_mol.max(TINY)
}

/// Dissociated (basic) amount of a weak acid/base pair with total molarity
/// `total` at hydrogen-ion concentration `h`: `total · Ka / (Ka + h)`.
pub fn dissociated(total: f64, ka: f64, h: f64) -> f64 {
    total * ka / (ka + h)
}

/// pKa table for the seven equilibria, in the order water, ammonium,
/// carbonic acid, acetic, propionic, butyric, valeric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PkaSet {
    pub w: f64,
    pub nh: f64,
    pub co2: f64,
    pub ac: f64,
    pub pro: f64,
    pub bu: f64,
    pub va: f64,
}

impl Default for PkaSet {
    fn default() -> Self {
        Self {
            w: PKA_W,
            nh: PKA_NH,
            co2: PKA_CO2,
            ac: PKA_AC,
            pro: PKA_PRO,
            bu: PKA_BU,
            va: PKA_VA,
        }
    }
}

/// Equilibrium constants `Kw, Ka_nh, Ka_co2, Ka_ac, Ka_pro, Ka_bu, Ka_va`.
///
/// Fixed once built; the solver only ever reads them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DissociationConstants {
    pub kw: f64,
    pub ka_nh: f64,
    pub ka_co2: f64,
    pub ka_ac: f64,
    pub ka_pro: f64,
    pub ka_bu: f64,
    pub ka_va: f64,
}

impl DissociationConstants {
    pub const NAMES: [&'static str; 7] =
        ["Kw", "Ka_nh", "Ka_co2", "Ka_ac", "Ka_pro", "Ka_bu", "Ka_va"];

    /// `Ka = 10^-pKa` for every entry of `pka`.
    pub fn from_pka(pka: &PkaSet) -> Self {
        let k = |p: f64| 10f64.powf(-p);
        Self {
            kw: k(pka.w),
            ka_nh: k(pka.nh),
            ka_co2: k(pka.co2),
            ka_ac: k(pka.ac),
            ka_pro: k(pka.pro),
            ka_bu: k(pka.bu),
            ka_va: k(pka.va),
        }
    }

    /// Constants for the default 25 °C pKa table, computed on first use.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<DissociationConstants> = OnceLock::new();
        STANDARD.get_or_init(|| Self::from_pka(&PkaSet::default()))
    }

    pub fn as_array(&self) -> [f64; 7] {
        [
            self.kw,
            self.ka_nh,
            self.ka_co2,
            self.ka_ac,
            self.ka_pro,
            self.ka_bu,
            self.ka_va,
        ]
    }

    /// Index and value of the first entry that is not finite and strictly positive.
    pub fn first_invalid(&self) -> Option<(usize, f64)> {
        self.as_array()
            .into_iter()
            .enumerate()
            .find(|(_, k)| !(k.is_finite() && *k > 0.0))
    }

    pub fn is_valid(&self) -> bool {
        self.first_invalid().is_none()
    }

    /// Reject constants that are not strictly positive and finite.
    ///
    /// # Errors
    /// [`AppError::InvalidConstant`] naming the offending entry.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.first_invalid() {
            None => Ok(()),
            Some((i, value)) => Err(AppError::InvalidConstant {
                name: Self::NAMES[i],
                value,
            }),
        }
    }
}

impl Default for DissociationConstants {
    fn default() -> Self {
        *Self::standard()
    }
}

/// Molar concentrations (mol/L) of the recognized species. Absent species are 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Molarities {
    pub s_cat: f64,
    pub s_an: f64,
    pub s_in: f64,
    pub s_ic: f64,
    pub s_ac: f64,
    pub s_pro: f64,
    pub s_bu: f64,
    pub s_va: f64,
}

/// Base-equivalent species at a given hydrogen-ion concentration (mol/L).
struct Dissociated {
    oh: f64,
    nh3: f64,
    hco3: f64,
    ac: f64,
    pro: f64,
    bu: f64,
    va: f64,
}

impl Dissociated {
    fn at(h: f64, m: &Molarities, ka: &DissociationConstants) -> Self {
        Self {
            oh: ka.kw / h,
            nh3: dissociated(m.s_in, ka.ka_nh, h),
            hco3: dissociated(m.s_ic, ka.ka_co2, h),
            ac: dissociated(m.s_ac, ka.ka_ac, h),
            pro: dissociated(m.s_pro, ka.ka_pro, h),
            bu: dissociated(m.s_bu, ka.ka_bu, h),
            va: dissociated(m.s_va, ka.ka_va, h),
        }
    }

    fn vfa(&self) -> f64 {
        self.ac + self.pro + self.bu + self.va
    }
}

/// Charge-balance residual (mol/L) at hydrogen-ion concentration `h`.
///
/// `S_cat + h + NH4+ − S_an − OH− − HCO3− − Ac− − Pro− − Bu− − Va−`, where
/// NH4+ is the undissociated part of inorganic nitrogen. Zero at equilibrium,
/// strictly increasing in `h` for non-negative molarities.
pub fn charge_balance(h: f64, m: &Molarities, ka: &DissociationConstants) -> f64 {
    let d = Dissociated::at(h, m, ka);
    m.s_cat + h + (m.s_in - d.nh3) - m.s_an - d.oh - d.hco3 - d.vfa()
}

/// Analytic derivative of [`charge_balance`] with respect to `h`.
pub fn charge_balance_slope(h: f64, m: &Molarities, ka: &DissociationConstants) -> f64 {
    let pair = |total: f64, k: f64| total * k / ((k + h) * (k + h));
    1.0 + ka.kw / (h * h)
        + pair(m.s_in, ka.ka_nh)
        + pair(m.s_ic, ka.ka_co2)
        + pair(m.s_ac, ka.ka_ac)
        + pair(m.s_pro, ka.ka_pro)
        + pair(m.s_bu, ka.ka_bu)
        + pair(m.s_va, ka.ka_va)
}

/// Alkalinity (meq/L) at the given pH.
///
/// `HCO3− + OH− − H+ + NH3 + VFA anions + S_cat − S_an`, converted to meq/L
/// and clamped at zero. A non-finite sum is reported as 0.
pub fn alkalinity_meq_l(m: &Molarities, ph: f64, ka: &DissociationConstants) -> f64 {
    let h = 10f64.powf(-ph);
    let d = Dissociated::at(h, m, ka);
    let alk_molar = d.hco3 + d.oh - h + d.nh3 + d.vfa() + m.s_cat - m.s_an;
    let alk = alk_molar * 1000.0;
    if alk.is_finite() { alk.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn standard_constants_follow_pka_table() {
        let ka = DissociationConstants::standard();
        assert!((ka.kw - 1e-14).abs() < 1e-28);
        assert!((ka.ka_co2 - 10f64.powf(-6.35)).abs() < 1e-20);
        assert!(ka.is_valid());
        assert!(ka.validate().is_ok());
    }

    #[test]
    fn validate_names_offending_entry() {
        let ka = DissociationConstants {
            ka_co2: -1.0,
            ..*DissociationConstants::standard()
        };
        let msg = ka.validate().unwrap_err().to_string();
        assert!(msg.contains("Ka_co2"), "{msg}");
    }

    #[test]
    fn mol_per_l_clamps_negative_mass() {
        assert_eq!(mol_per_l(-5.0, M_C), 0.0);
        assert!((mol_per_l(12.011, M_C) - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn half_dissociated_at_pka() {
        let ka = 10f64.powf(-4.76);
        assert!((dissociated(2.0, ka, ka) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pure_water_is_neutral() {
        let ka = DissociationConstants::standard();
        let m = Molarities::default();
        assert!(charge_balance(1e-7, &m, ka).abs() < 1e-18);
        // 10^-7 is not exactly sqrt(Kw); only round-off remains
        let alk = alkalinity_meq_l(&m, 7.0, ka);
        assert!(alk >= 0.0 && alk < 1e-12, "alk = {alk}");
    }

    #[test]
    fn alkalinity_clamps_excess_acidity() {
        let ka = DissociationConstants::standard();
        let m = Molarities {
            s_an: 0.1,
            ..Default::default()
        };
        assert_eq!(alkalinity_meq_l(&m, 1.0, ka), 0.0);
    }

    #[test]
    fn slope_matches_finite_difference() {
        let ka = DissociationConstants::standard();
        let m = Molarities {
            s_cat: 0.03,
            s_an: 0.01,
            s_in: 0.05,
            s_ic: 0.2,
            s_ac: 0.002,
            ..Default::default()
        };
        let h = 3e-7;
        let dh = h * 1e-6;
        let fd = (charge_balance(h + dh, &m, ka) - charge_balance(h - dh, &m, ka)) / (2.0 * dh);
        let an = charge_balance_slope(h, &m, ka);
        assert!(((fd - an) / an).abs() < 1e-5, "fd={fd} analytic={an}");
    }

    fn molarities() -> impl Strategy<Value = Molarities> {
        (
            prop::array::uniform4(0.0_f64..0.2),
            prop::array::uniform4(0.0_f64..0.05),
        )
            .prop_map(|(a, b)| Molarities {
                s_cat: a[0],
                s_an: a[1],
                s_in: a[2],
                s_ic: a[3],
                s_ac: b[0],
                s_pro: b[1],
                s_bu: b[2],
                s_va: b[3],
            })
    }

    proptest! {
        #[test]
        fn residual_strictly_monotone(m in molarities(), lo in -14.0_f64..-0.01, step in 0.001_f64..1.0) {
            let ka = DissociationConstants::standard();
            let h1 = 10f64.powf(lo);
            let h2 = 10f64.powf((lo + step).min(-0.001));
            prop_assume!(h2 > h1);
            prop_assert!(charge_balance(h2, &m, ka) > charge_balance(h1, &m, ka));
        }

        #[test]
        fn alkalinity_never_negative(m in molarities(), ph in 0.0_f64..14.0) {
            let alk = alkalinity_meq_l(&m, ph, DissociationConstants::standard());
            prop_assert!(alk >= 0.0 && alk.is_finite());
        }
    }
}
