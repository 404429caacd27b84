//! Load types, combinations and the stages that register loads
//!
//! Loads are registered unfactored under their load-type case name; the
//! solver's combination mechanism applies the factors at solve time.

mod applicator;
mod area;
mod combination;
mod load_type;
mod self_weight;

pub use applicator::{solver_direction, LoadApplicator};
pub use area::AreaLoadMapper;
pub use combination::{
    analysis_label, direction_token, CombinationTable, LoadCombination, DIRECTION_TOKENS,
};
pub use load_type::LoadType;
pub use self_weight::{SelfWeightInjector, SelfWeightSummary, WeightedMember};
