//! Violation classification and the zero-tolerance policy

pub mod classifier;
pub mod engine;
pub mod types;

pub use classifier::classify;
pub use engine::{CycleOutcome, PolicyEngine};
pub use types::{
    EnforcementAction, EnforcementKind, RecommendedAction, Severity, Violation, ViolationKind,
};
