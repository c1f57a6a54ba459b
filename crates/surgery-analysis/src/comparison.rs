//! 情境比較與方法比較

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surgery_core::{Catalog, ObjectiveCriterion, Scenario, SolveOutcome, SolveStatus, SolverConfig};
use surgery_optimizer::Allocator;

use crate::runner::ScenarioResult;

/// 情境比較表的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenario: String,
    pub criterion: ObjectiveCriterion,
    pub status: SolveStatus,
    /// 手術總數
    pub procedures: u64,
    pub cost: Decimal,
    pub hours: Decimal,
    pub icu_units: u32,
    /// 目標值（無分配時為 None）
    pub value: Option<f64>,
}

impl ScenarioComparison {
    fn from_result(result: &ScenarioResult) -> Self {
        let allocation = result.outcome.allocation();
        Self {
            scenario: result.scenario.name.clone(),
            criterion: result.scenario.criterion,
            status: result.outcome.status(),
            procedures: allocation.map_or(0, |a| a.totals.total_procedures),
            cost: allocation.map_or(Decimal::ZERO, |a| a.totals.total_cost),
            hours: allocation.map_or(Decimal::ZERO, |a| a.totals.total_hours),
            icu_units: allocation.map_or(0, |a| a.totals.total_icu_units),
            value: allocation.map(|a| a.totals.total_value),
        }
    }
}

/// 將多個情境結果整理為比較表
pub fn compare_scenarios(results: &[ScenarioResult]) -> Vec<ScenarioComparison> {
    results.iter().map(ScenarioComparison::from_result).collect()
}

/// 精確解與貪婪近似的比較
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub scenario: String,
    pub exact: SolveOutcome,
    pub greedy: SolveOutcome,
    pub exact_value: Option<f64>,
    pub greedy_value: Option<f64>,
    /// 精確值減貪婪值（≥ 0）
    pub gap: Option<f64>,
    /// 差距佔精確值的百分比（精確值為 0 時為 None）
    pub gap_pct: Option<f64>,
}

/// 以同一配置分別用精確求解與貪婪近似求解一個情境
pub fn compare_methods(
    catalog: &Catalog,
    scenario: &Scenario,
    config: &SolverConfig,
) -> surgery_core::Result<MethodComparison> {
    let (exact, greedy) = rayon::join(
        || {
            Allocator::exact().with_config(config.clone()).allocate(
                catalog,
                &scenario.envelope,
                scenario.criterion,
            )
        },
        || {
            Allocator::greedy().with_config(config.clone()).allocate(
                catalog,
                &scenario.envelope,
                scenario.criterion,
            )
        },
    );
    let (exact, greedy) = (exact?, greedy?);

    let exact_value = exact.objective_value();
    let greedy_value = greedy.objective_value();
    let gap = match (exact.status(), exact_value, greedy_value) {
        (SolveStatus::Optimal, Some(e), Some(g)) => Some(e - g),
        _ => None,
    };
    let gap_pct = match (gap, exact_value) {
        (Some(gap), Some(e)) if e > 0.0 => Some(gap / e * 100.0),
        _ => None,
    };

    if let Some(gap) = gap {
        tracing::info!("情境 {} 貪婪近似與最佳解差距: {:.4}", scenario.name, gap);
    }

    Ok(MethodComparison {
        scenario: scenario.name.clone(),
        exact,
        greedy,
        exact_value,
        greedy_value,
        gap,
        gap_pct,
    })
}
