//! 多情境平行求解

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use surgery_core::{Catalog, Scenario, SolveOutcome};
use surgery_optimizer::Allocator;

/// 單一情境的求解結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub outcome: SolveOutcome,
}

/// 情境執行器
#[derive(Debug, Default)]
pub struct ScenarioRunner {
    allocator: Allocator,
}

impl ScenarioRunner {
    /// 創建新的情境執行器
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    /// 求解單一情境
    pub fn run(&self, catalog: &Catalog, scenario: &Scenario) -> surgery_core::Result<ScenarioResult> {
        let outcome = self
            .allocator
            .allocate(catalog, &scenario.envelope, scenario.criterion)?;
        tracing::debug!("情境 {} 求解狀態: {}", scenario.name, outcome.status());

        Ok(ScenarioResult {
            scenario: scenario.clone(),
            outcome,
        })
    }

    /// 平行求解所有情境，結果順序與輸入相同
    pub fn run_all(
        &self,
        catalog: &Catalog,
        scenarios: &[Scenario],
    ) -> surgery_core::Result<Vec<ScenarioResult>> {
        tracing::info!("平行求解 {} 個情境", scenarios.len());

        scenarios
            .par_iter()
            .map(|scenario| self.run(catalog, scenario))
            .collect()
    }
}
