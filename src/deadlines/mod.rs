pub mod calculator;
pub mod overrides;
pub mod validator;

pub use calculator::{
    compute, compute_career_plan_deadline, derive_deadlines, CareerPlanDeadline, DeadlineStatus,
    DerivedDeadlines, PlanStrategy,
};
pub use overrides::{effective_deadlines, DeadlineOverride};
pub use validator::{validate_anchor, validate_override, OverrideRequest};
