//! Rules: specs, checks, registry and TOML loading

pub mod check;
pub mod context;
mod loader;
pub mod regions;
pub mod registry;
pub mod rule;

pub use check::{Check, Contact};
pub use context::RuleContext;
pub use loader::{load_registry, load_rule_specs, parse_rule_specs};
pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use rule::{Outcome, Rule, RuleSpec, Violation};
