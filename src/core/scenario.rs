use serde::{Deserialize, Serialize};

use super::session::SessionContext;
use super::types::InputError;

pub const CUSTOM_OPTION: &str = "Custom";

const RATE_MATCH_EPS: f64 = 1e-6;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickerKind {
    Inflation,
    Return,
    #[serde(alias = "growth", alias = "savingsGrowth")]
    SavingsGrowth,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub label: &'static str,
    pub percent: f64,
}

const INFLATION_PRESETS: &[Preset] = &[
    Preset {
        label: "Low (1.5%)",
        percent: 1.5,
    },
    Preset {
        label: "Average (2.5%)",
        percent: 2.5,
    },
    Preset {
        label: "High (4.0%)",
        percent: 4.0,
    },
];

const RETURN_PRESETS: &[Preset] = &[
    Preset {
        label: "Income-Focused (5.0%)",
        percent: 5.0,
    },
    Preset {
        label: "Moderate Growth (7.0%)",
        percent: 7.0,
    },
    Preset {
        label: "Growth-Oriented (10.0%)",
        percent: 10.0,
    },
];

const GROWTH_PRESETS: &[Preset] = &[
    Preset {
        label: "Flat (0.0%)",
        percent: 0.0,
    },
    Preset {
        label: "Conservative (1.0%)",
        percent: 1.0,
    },
    Preset {
        label: "Typical Merit Increase (2.0%)",
        percent: 2.0,
    },
    Preset {
        label: "Strong Career Growth (3.5%)",
        percent: 3.5,
    },
    Preset {
        label: "Temporary Setback (-1.0%)",
        percent: -1.0,
    },
];

const WITHDRAWAL_PRESETS: &[Preset] = &[
    Preset {
        label: "Conservative (3.0%)",
        percent: 3.0,
    },
    Preset {
        label: "Moderate (3.5%)",
        percent: 3.5,
    },
    Preset {
        label: "Flexible FIRE (4.0%)",
        percent: 4.0,
    },
];

/// A rate picked from a preset table or typed in by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum RateChoice {
    Preset(Preset),
    Custom { percent: f64 },
}

impl RateChoice {
    pub fn label(&self) -> &str {
        match self {
            RateChoice::Preset(preset) => preset.label,
            RateChoice::Custom { .. } => CUSTOM_OPTION,
        }
    }

    pub fn percent(&self) -> f64 {
        match self {
            RateChoice::Preset(preset) => preset.percent,
            RateChoice::Custom { percent } => *percent,
        }
    }
}

/// What the user did with the picker on this interaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Selection {
    Preset(String),
    Custom(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    pub option: String,
    pub percent: f64,
    /// `percent / 100`, ready for the projection engine.
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct Picker {
    kind: PickerKind,
    option_key: String,
    rate_key: String,
    default_option: &'static str,
}

impl Picker {
    pub fn new(kind: PickerKind) -> Self {
        match kind {
            PickerKind::Inflation => Self::with_keys(kind, "inflation_option", "inflation_rate"),
            PickerKind::Return => Self::with_keys(kind, "return_option", "expected_return_percent"),
            PickerKind::SavingsGrowth => Self::savings_growth("growth"),
            PickerKind::Withdrawal => Self::with_keys(kind, "withdrawal_option", "withdrawal_rate"),
        }
    }

    /// Savings-growth picker whose session keys are namespaced by `key_prefix`,
    /// so salary and savings growth can be tracked independently.
    pub fn savings_growth(key_prefix: &str) -> Self {
        Self::with_keys(
            PickerKind::SavingsGrowth,
            &format!("{key_prefix}_growth_scenario"),
            &format!("{key_prefix}_growth_rate"),
        )
    }

    fn with_keys(kind: PickerKind, option_key: &str, rate_key: &str) -> Self {
        Self {
            kind,
            option_key: option_key.to_string(),
            rate_key: rate_key.to_string(),
            default_option: default_option(kind),
        }
    }

    pub fn kind(&self) -> PickerKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        picker_name(self.kind)
    }

    pub fn presets(&self) -> &'static [Preset] {
        presets(self.kind)
    }

    pub fn default_option(&self) -> &'static str {
        self.default_option
    }

    /// Inclusive bounds for a custom rate, in percent.
    pub fn custom_bounds(&self) -> (f64, f64) {
        match self.kind {
            PickerKind::Inflation => (0.0, 10.0),
            PickerKind::Return => (3.0, 12.0),
            PickerKind::SavingsGrowth => (-5.0, 10.0),
            PickerKind::Withdrawal => (0.0, 10.0),
        }
    }

    fn default_percent(&self) -> f64 {
        self.find_preset(self.default_option)
            .map(|preset| preset.percent)
            .unwrap_or(0.0)
    }

    fn find_preset(&self, label: &str) -> Option<Preset> {
        self.presets()
            .iter()
            .copied()
            .find(|preset| preset.label == label)
    }

    fn preset_for_percent(&self, percent: f64) -> Option<Preset> {
        self.presets()
            .iter()
            .copied()
            .find(|preset| (preset.percent - percent).abs() < RATE_MATCH_EPS)
    }

    pub fn resolve(&self, selection: &Selection) -> Result<RateChoice, InputError> {
        match selection {
            Selection::Preset(label) => self
                .find_preset(label)
                .map(RateChoice::Preset)
                .ok_or_else(|| InputError::UnknownPreset {
                    picker: self.name(),
                    label: label.clone(),
                }),
            Selection::Custom(percent) => {
                let (min, max) = self.custom_bounds();
                if !percent.is_finite() || *percent < min || *percent > max {
                    return Err(InputError::RateOutOfRange {
                        field: self.name(),
                        value: *percent,
                        min,
                        max,
                    });
                }
                Ok(RateChoice::Custom { percent: *percent })
            }
        }
    }

    /// Resolves the picker against the session and writes the outcome back.
    ///
    /// With no selection the previous choice is replayed from the session,
    /// falling back to the picker default. A stored preset label that no
    /// longer agrees with the stored rate is re-pointed at the preset whose
    /// rate matches, or at `Custom` when none does. Preset-only pickers
    /// replay a stored custom rate as the matching preset, else the default.
    pub fn apply(
        &self,
        session: &mut SessionContext,
        selection: Option<Selection>,
        allow_custom: bool,
    ) -> Result<ResolvedRate, InputError> {
        let stored_option = session
            .get_text(&self.option_key, self.default_option)
            .to_string();
        let stored_percent = session.get_number(
            &self.rate_key,
            self.find_preset(&stored_option)
                .map(|preset| preset.percent)
                .unwrap_or_else(|| self.default_percent()),
        );

        let selection = match selection {
            Some(Selection::Custom(_)) if !allow_custom => {
                return Err(InputError::CustomNotAllowed {
                    picker: self.name(),
                });
            }
            Some(selection) => selection,
            None => match self.replay(&stored_option, stored_percent) {
                // A custom rate left over from an earlier, custom-enabled run.
                Selection::Custom(_) if !allow_custom => {
                    let label = self
                        .preset_for_percent(stored_percent)
                        .map_or(self.default_option, |preset| preset.label);
                    Selection::Preset(label.to_string())
                }
                selection => selection,
            },
        };

        let choice = self.resolve(&selection)?;
        let option = choice.label().to_string();
        let percent = choice.percent();

        session.set_text(self.option_key.clone(), option.clone());
        session.set_number(self.rate_key.clone(), percent);

        Ok(ResolvedRate {
            option,
            percent,
            rate: percent / 100.0,
        })
    }

    fn replay(&self, stored_option: &str, stored_percent: f64) -> Selection {
        if stored_option == CUSTOM_OPTION {
            return Selection::Custom(stored_percent);
        }
        match self.find_preset(stored_option) {
            Some(preset) if (preset.percent - stored_percent).abs() < RATE_MATCH_EPS => {
                Selection::Preset(preset.label.to_string())
            }
            _ => match self.preset_for_percent(stored_percent) {
                Some(preset) => Selection::Preset(preset.label.to_string()),
                None => Selection::Custom(stored_percent),
            },
        }
    }
}

pub fn presets(kind: PickerKind) -> &'static [Preset] {
    match kind {
        PickerKind::Inflation => INFLATION_PRESETS,
        PickerKind::Return => RETURN_PRESETS,
        PickerKind::SavingsGrowth => GROWTH_PRESETS,
        PickerKind::Withdrawal => WITHDRAWAL_PRESETS,
    }
}

fn default_option(kind: PickerKind) -> &'static str {
    match kind {
        PickerKind::Inflation => "Average (2.5%)",
        PickerKind::Return => "Moderate Growth (7.0%)",
        PickerKind::SavingsGrowth => "Flat (0.0%)",
        PickerKind::Withdrawal => "Moderate (3.5%)",
    }
}

fn picker_name(kind: PickerKind) -> &'static str {
    match kind {
        PickerKind::Inflation => "inflation",
        PickerKind::Return => "return",
        PickerKind::SavingsGrowth => "savings growth",
        PickerKind::Withdrawal => "withdrawal",
    }
}
