pub mod catalog;

use crate::logic::SimulationPlan;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let key = key.to_lowercase();
    catalog::CATALOG
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| TestScenario::simulation(entry.name, (entry.build)()))
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::CATALOG
        .iter()
        .map(|entry| (entry.key, entry.name))
        .collect()
}

pub fn all_scenario_keys() -> Vec<String> {
    catalog::CATALOG
        .iter()
        .map(|entry| entry.key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, name) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.name, name);
        }
        assert!(get_scenario("PERFECT-STILL").is_some());
        assert!(get_scenario("rosé").is_none());
    }
}
