//! 預算敏感度分析

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surgery_core::{AllocError, Catalog, Scenario, SolveStatus};
use surgery_optimizer::Allocator;

/// 敏感度分析的一個取樣點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// 預算倍率
    pub factor: Decimal,
    pub budget: Decimal,
    pub status: SolveStatus,
    pub procedures: u64,
    pub value: Option<f64>,
}

/// 以不同預算倍率重新求解基準情境，其他資源維持不變
///
/// 倍率為負或乘積超出 Decimal 範圍時回傳 `InvalidEnvelope`。
pub fn budget_sensitivity(
    allocator: &Allocator,
    catalog: &Catalog,
    base: &Scenario,
    factors: &[Decimal],
) -> surgery_core::Result<Vec<SensitivityPoint>> {
    tracing::info!(
        "預算敏感度分析：情境 {}，取樣 {} 點",
        base.name,
        factors.len()
    );

    factors
        .par_iter()
        .map(|&factor| -> surgery_core::Result<SensitivityPoint> {
            let budget = base.envelope.budget().checked_mul(factor).ok_or_else(|| {
                AllocError::InvalidEnvelope {
                    field: "budget",
                    value: format!("{} × {factor}", base.envelope.budget()),
                }
            })?;
            let envelope = base.envelope.clone().with_budget(budget)?;
            let outcome = allocator.allocate(catalog, &envelope, base.criterion)?;
            let allocation = outcome.allocation();

            Ok(SensitivityPoint {
                factor,
                budget,
                status: outcome.status(),
                procedures: allocation.map_or(0, |a| a.totals.total_procedures),
                value: allocation.map(|a| a.totals.total_value),
            })
        })
        .collect()
}
