mod engine;
mod scenario;
mod session;
mod types;

pub use engine::{
    MAX_PROJECTION_YEARS, adjusted_expenses, appreciate, fire_target, progress_fraction,
    project_net_worth, project_net_worth_capped, run_tracker,
};
pub use scenario::{
    CUSTOM_OPTION, Picker, PickerKind, Preset, RateChoice, ResolvedRate, Selection, presets,
};
pub use session::{SessionContext, SessionValue};
pub use types::{
    Appreciation, InputError, NetWorth, ProgressTier, Projection, RealEstateCashflow,
    TrackerInputs, TrackerReport,
};
