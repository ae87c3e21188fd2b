use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("withdrawal rate must be > 0 and <= 1, got {0}")]
    WithdrawalRate(f64),
    #[error("target expenses must be finite and >= 0, got {0}")]
    Expenses(f64),
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("{field} must be between {min} and {max}, got {value}")]
    RateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("unknown {picker} preset '{label}'")]
    UnknownPreset { picker: &'static str, label: String },
    #[error("{picker} picker does not allow custom rates")]
    CustomNotAllowed { picker: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub years: u32,
    pub final_balance: f64,
    pub trajectory: Vec<f64>,
    pub reached: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealEstateCashflow {
    pub rental_income: f64,
    pub mortgage: f64,
    pub maintenance: f64,
    pub tax_insurance: f64,
}

impl RealEstateCashflow {
    pub fn net(self) -> f64 {
        self.rental_income - self.mortgage - self.maintenance - self.tax_insurance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetWorth {
    pub liquid: f64,
    pub illiquid: f64,
    pub include_illiquid: bool,
}

impl NetWorth {
    /// Net worth the projection starts from.
    pub fn projected(self) -> f64 {
        if self.include_illiquid {
            self.liquid + self.illiquid
        } else {
            self.liquid
        }
    }

    pub fn total(self) -> f64 {
        self.liquid + self.illiquid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appreciation {
    pub property_value: f64,
    pub rate: f64,
    pub years: u32,
    pub future_value: f64,
    pub gain: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressTier {
    Starting,
    Underway,
    Halfway,
    Close,
    Reached,
}

impl ProgressTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressTier::Starting => "starting",
            ProgressTier::Underway => "underway",
            ProgressTier::Halfway => "halfway",
            ProgressTier::Close => "close",
            ProgressTier::Reached => "reached",
        }
    }

    pub fn from_fraction(fraction: f64) -> Self {
        if fraction >= 1.0 {
            ProgressTier::Reached
        } else if fraction >= 0.75 {
            ProgressTier::Close
        } else if fraction >= 0.5 {
            ProgressTier::Halfway
        } else if fraction >= 0.25 {
            ProgressTier::Underway
        } else {
            ProgressTier::Starting
        }
    }
}

/// Validated tracker inputs. Rates are fractions, money is in currency units.
#[derive(Debug, Clone)]
pub struct TrackerInputs {
    pub net_worth: NetWorth,
    pub annual_savings: f64,
    pub target_expenses: f64,
    pub withdrawal_rate: f64,
    pub annual_return: f64,
    pub real_estate: RealEstateCashflow,
    pub include_real_estate: bool,
    pub property_value: f64,
    pub appreciation_rate: f64,
    pub appreciation_years: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerReport {
    pub fire_goal: f64,
    pub target_expenses: f64,
    pub adjusted_expenses: f64,
    pub net_real_estate_cashflow: f64,
    pub real_estate_included: bool,
    pub liquid_assets: f64,
    pub illiquid_assets: f64,
    pub illiquid_included: bool,
    pub projected_net_worth: f64,
    pub total_net_worth: f64,
    pub years_to_fi: u32,
    pub reached: bool,
    pub final_net_worth: f64,
    pub trajectory: Vec<f64>,
    pub progress: f64,
    pub progress_tier: ProgressTier,
    pub appreciation: Appreciation,
}
