pub mod plan;
pub mod random_walk;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use plan::{ProcessTester, SimulationPlan, SimulationSummary, Step};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
