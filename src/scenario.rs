use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::models::Scenario;
use std::fs;
use std::path::Path;

/// List the scenario subdirectories of a simulation run directory.
///
/// Files at this level are ignored. Scenarios are sorted by name so that the
/// combined output does not depend on filesystem enumeration order. An empty
/// result is only a warning; callers fail later on missing data.
pub fn discover_scenarios(simulation_dir: &Path, diag: &dyn Diagnostics) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();

    for entry in fs::read_dir(simulation_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        scenarios.push(Scenario::new(name, path));
    }

    scenarios.sort_by(|a, b| a.name.cmp(&b.name));

    for scenario in &scenarios {
        diag.info(&format!("Scenario found: {}", scenario.name));
    }
    if scenarios.is_empty() {
        diag.warn(&format!("No scenarios found in {}", simulation_dir.display()));
    }

    Ok(scenarios)
}
