//! 目標準則

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::procedure::ProcedureType;
use crate::{AllocError, Result};

/// 成本效益權重的顯示倍率
///
/// 對權重排序沒有影響，只放大報表中的目標值數量級。
pub const COST_EFFICIENCY_SCALE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// 目標準則：決定每單位手術的權重如何由手術類型推導
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveCriterion {
    /// 嚴重度優先
    #[serde(alias = "gravidade")]
    Severity,
    /// 人口發生率優先（滿足較大需求）
    #[serde(alias = "incidencia")]
    Incidence,
    /// 成本效益（嚴重度 / 成本 × 10,000）
    #[serde(alias = "cost_efficiency", alias = "custo_beneficio")]
    CostEfficiency,
}

impl ObjectiveCriterion {
    pub const ALL: [ObjectiveCriterion; 3] = [
        ObjectiveCriterion::Severity,
        ObjectiveCriterion::Incidence,
        ObjectiveCriterion::CostEfficiency,
    ];

    /// 計算精確權重
    ///
    /// 極小的單位成本可能使成本效益權重超出 Decimal 範圍，此時回傳 `Solver` 錯誤。
    pub fn weight_decimal(&self, procedure: &ProcedureType) -> Result<Decimal> {
        let weight = match self {
            ObjectiveCriterion::Severity => Some(procedure.severity),
            ObjectiveCriterion::Incidence => Some(procedure.incidence_rate),
            ObjectiveCriterion::CostEfficiency => procedure
                .severity
                .checked_div(procedure.unit_cost)
                .and_then(|ratio| ratio.checked_mul(COST_EFFICIENCY_SCALE)),
        };
        weight.ok_or_else(|| self.out_of_range(procedure))
    }

    /// 計算求解器使用的浮點權重
    pub fn weight(&self, procedure: &ProcedureType) -> Result<f64> {
        self.weight_decimal(procedure)?
            .to_f64()
            .ok_or_else(|| self.out_of_range(procedure))
    }

    fn out_of_range(&self, procedure: &ProcedureType) -> AllocError {
        AllocError::Solver(format!(
            "手術 {} 的 {} 權重超出數值範圍",
            procedure.id, self
        ))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveCriterion::Severity => "severity",
            ObjectiveCriterion::Incidence => "incidence",
            ObjectiveCriterion::CostEfficiency => "cost-efficiency",
        }
    }
}

impl fmt::Display for ObjectiveCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectiveCriterion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "severity" | "gravidade" => Ok(ObjectiveCriterion::Severity),
            "incidence" | "incidencia" => Ok(ObjectiveCriterion::Incidence),
            "cost-efficiency" | "cost_efficiency" | "custo_beneficio" => {
                Ok(ObjectiveCriterion::CostEfficiency)
            }
            other => Err(format!(
                "未知的目標準則 `{other}`（可用: severity, incidence, cost-efficiency）"
            )),
        }
    }
}
