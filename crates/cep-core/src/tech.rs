//! Technology records

use serde::{Deserialize, Serialize};

use crate::error::{CepError, CepResult};

/// Which physical role a storage technology plays.
///
/// A storage unit is split into three technologies sharing one reservoir:
/// the reservoir itself (energy, MWh), a charger and a discharger (power, MW).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoragePart {
    Energy,
    Charge,
    Discharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Generation,
    Storage(StoragePart),
    Transmission,
}

impl TechCategory {
    pub fn is_generation(&self) -> bool {
        matches!(self, TechCategory::Generation)
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, TechCategory::Storage(_))
    }

    pub fn is_transmission(&self) -> bool {
        matches!(self, TechCategory::Transmission)
    }

    pub fn storage_part(&self) -> Option<StoragePart> {
        match self {
            TechCategory::Storage(part) => Some(*part),
            _ => None,
        }
    }
}

/// Conversion efficiency. Storage reservoirs carry separate charge and
/// discharge efficiencies; everything else carries a single factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Efficiency {
    Conversion(f64),
    Storage { input: f64, output: f64 },
}

impl Efficiency {
    /// Efficiency applied when energy enters (charging) or the single factor.
    pub fn input(&self) -> f64 {
        match self {
            Efficiency::Conversion(eff) => *eff,
            Efficiency::Storage { input, .. } => *input,
        }
    }

    /// Efficiency applied when energy leaves (discharging) or the single factor.
    pub fn output(&self) -> f64 {
        match self {
            Efficiency::Conversion(eff) => *eff,
            Efficiency::Storage { output, .. } => *output,
        }
    }

    fn validate(&self, tech: &str) -> CepResult<()> {
        let (a, b) = (self.input(), self.output());
        if !(a > 0.0 && a <= 1.0 && b > 0.0 && b <= 1.0) {
            return Err(CepError::InvalidData(format!(
                "technology '{}' has efficiency outside (0, 1]",
                tech
            )));
        }
        Ok(())
    }
}

/// Capital Recovery Factor for annualizing investment costs
///
/// CRF = r(1+r)^n / ((1+r)^n - 1)
///
/// where r = discount rate, n = financial lifetime in years
pub fn capital_recovery_factor(discount_rate: f64, years: f64) -> f64 {
    let r = discount_rate;
    if r < 1e-10 {
        // No discounting
        1.0 / years
    } else {
        r * (1.0 + r).powf(years) / ((1.0 + r).powf(years) - 1.0)
    }
}

/// One technology of the energy system.
///
/// The annuity factor is derived from `financial_lifetime` and `discount_rate`
/// and is refreshed by every setter that touches either of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TechnologyRepr", into = "TechnologyRepr")]
pub struct Technology {
    pub name: String,
    pub category: TechCategory,
    pub sector: String,
    pub efficiency: Efficiency,
    /// Availability series key; `None` means always fully available.
    pub time_series: Option<String>,
    /// Physical lifetime in years, used to spread embodied emissions.
    pub lifetime: f64,
    /// For storage charge/discharge parts: the reservoir technology.
    pub storage_unit: Option<String>,
    financial_lifetime: f64,
    discount_rate: f64,
    annuity_factor: f64,
}

#[derive(Serialize, Deserialize)]
struct TechnologyRepr {
    name: String,
    category: TechCategory,
    sector: String,
    efficiency: Efficiency,
    #[serde(default)]
    time_series: Option<String>,
    lifetime: f64,
    financial_lifetime: f64,
    discount_rate: f64,
    #[serde(default)]
    storage_unit: Option<String>,
}

impl TryFrom<TechnologyRepr> for Technology {
    type Error = CepError;

    fn try_from(repr: TechnologyRepr) -> Result<Self, Self::Error> {
        let mut tech = Technology::new(repr.name, repr.category, repr.sector)
            .with_efficiency(repr.efficiency)
            .with_lifetime(repr.lifetime)
            .with_financing(repr.financial_lifetime, repr.discount_rate);
        tech.time_series = repr.time_series;
        tech.storage_unit = repr.storage_unit;
        tech.validate()?;
        Ok(tech)
    }
}

impl From<Technology> for TechnologyRepr {
    fn from(tech: Technology) -> Self {
        TechnologyRepr {
            name: tech.name,
            category: tech.category,
            sector: tech.sector,
            efficiency: tech.efficiency,
            time_series: tech.time_series,
            lifetime: tech.lifetime,
            financial_lifetime: tech.financial_lifetime,
            discount_rate: tech.discount_rate,
            storage_unit: tech.storage_unit,
        }
    }
}

impl Technology {
    /// New technology with unit efficiency, a one-year lifetime and no
    /// discounting (annuity factor 1).
    pub fn new(name: impl Into<String>, category: TechCategory, sector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category,
            sector: sector.into(),
            efficiency: Efficiency::Conversion(1.0),
            time_series: None,
            lifetime: 1.0,
            storage_unit: None,
            financial_lifetime: 1.0,
            discount_rate: 0.0,
            annuity_factor: 1.0,
        }
    }

    pub fn generation(name: impl Into<String>, sector: impl Into<String>) -> Self {
        Self::new(name, TechCategory::Generation, sector)
    }

    pub fn transmission(name: impl Into<String>, sector: impl Into<String>) -> Self {
        Self::new(name, TechCategory::Transmission, sector)
    }

    /// Reservoir, charger and discharger for one storage unit, named
    /// `{base}_e`, `{base}_in` and `{base}_out`.
    pub fn storage_unit(
        base: &str,
        sector: impl Into<String>,
        input_efficiency: f64,
        output_efficiency: f64,
    ) -> [Technology; 3] {
        let sector = sector.into();
        let energy_name = format!("{}_e", base);
        let energy = Self::new(
            energy_name.clone(),
            TechCategory::Storage(StoragePart::Energy),
            sector.clone(),
        )
        .with_efficiency(Efficiency::Storage {
            input: input_efficiency,
            output: output_efficiency,
        });
        let charge = Self::new(
            format!("{}_in", base),
            TechCategory::Storage(StoragePart::Charge),
            sector.clone(),
        )
        .with_storage_unit(energy_name.clone());
        let discharge = Self::new(
            format!("{}_out", base),
            TechCategory::Storage(StoragePart::Discharge),
            sector,
        )
        .with_storage_unit(energy_name);
        [energy, charge, discharge]
    }

    pub fn with_efficiency(mut self, efficiency: Efficiency) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn with_time_series(mut self, key: impl Into<String>) -> Self {
        self.time_series = Some(key.into());
        self
    }

    pub fn with_lifetime(mut self, years: f64) -> Self {
        self.lifetime = years;
        self
    }

    pub fn with_financing(mut self, financial_lifetime: f64, discount_rate: f64) -> Self {
        self.financial_lifetime = financial_lifetime;
        self.discount_rate = discount_rate;
        self.refresh_annuity();
        self
    }

    pub fn with_storage_unit(mut self, energy_tech: impl Into<String>) -> Self {
        self.storage_unit = Some(energy_tech.into());
        self
    }

    pub fn financial_lifetime(&self) -> f64 {
        self.financial_lifetime
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    pub fn set_financial_lifetime(&mut self, years: f64) {
        self.financial_lifetime = years;
        self.refresh_annuity();
    }

    pub fn set_discount_rate(&mut self, rate: f64) {
        self.discount_rate = rate;
        self.refresh_annuity();
    }

    pub fn annuity_factor(&self) -> f64 {
        self.annuity_factor
    }

    fn refresh_annuity(&mut self) {
        self.annuity_factor = capital_recovery_factor(self.discount_rate, self.financial_lifetime);
    }

    /// Check record-level invariants.
    pub fn validate(&self) -> CepResult<()> {
        if !(self.lifetime > 0.0) || !(self.financial_lifetime > 0.0) {
            return Err(CepError::InvalidData(format!(
                "technology '{}' needs positive lifetimes",
                self.name
            )));
        }
        if !(self.discount_rate >= 0.0) {
            return Err(CepError::InvalidData(format!(
                "technology '{}' has a negative discount rate",
                self.name
            )));
        }
        self.efficiency.validate(&self.name)?;
        match self.category {
            TechCategory::Storage(StoragePart::Charge)
            | TechCategory::Storage(StoragePart::Discharge) => {
                if self.storage_unit.is_none() {
                    return Err(CepError::MissingData(format!(
                        "storage technology '{}' does not name its reservoir",
                        self.name
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}
