//! 分配結果模型（求解輸出）

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Catalog;
use crate::envelope::{ResourceEnvelope, ResourceKind};
use crate::objective::ObjectiveCriterion;
use crate::{AllocError, Result};

/// 求解方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// 分支定界（精確）
    Exact,
    /// 貪婪近似（不保證最佳）
    Greedy,
    /// 外部 MILP 後端（精確）
    Milp,
}

impl SolveMethod {
    /// 是否保證最佳解
    pub fn is_exact(&self) -> bool {
        !matches!(self, SolveMethod::Greedy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMethod::Exact => "exact",
            SolveMethod::Greedy => "greedy",
            SolveMethod::Milp => "milp",
        }
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一手術類型的分配明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub procedure_id: String,
    pub name: String,
    pub quantity: u32,
    /// 每單位權重
    pub unit_weight: f64,
    /// 此列貢獻的目標值
    pub value: f64,
    pub cost: Decimal,
    pub hours: Decimal,
    pub icu_units: u32,
}

/// 分配總計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationTotals {
    pub total_value: f64,
    pub total_cost: Decimal,
    pub total_hours: Decimal,
    pub total_icu_units: u32,
    pub total_procedures: u64,
}

impl AllocationTotals {
    /// 依資源種類取得用量
    pub fn usage(&self, kind: ResourceKind) -> Decimal {
        match kind {
            ResourceKind::Budget => self.total_cost,
            ResourceKind::RoomHours => self.total_hours,
            ResourceKind::IcuBeds => Decimal::from(self.total_icu_units),
        }
    }
}

/// 資源使用率（百分比；容量為 0 時為 None）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub budget_pct: Option<f64>,
    pub room_hours_pct: Option<f64>,
    pub icu_beds_pct: Option<f64>,
}

impl ResourceUtilization {
    fn compute(totals: &AllocationTotals, envelope: &ResourceEnvelope) -> Self {
        let pct = |kind: ResourceKind| {
            let capacity = envelope.capacity(kind);
            if capacity.is_zero() {
                None
            } else {
                totals
                    .usage(kind)
                    .checked_div(capacity)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .and_then(|pct| pct.to_f64())
            }
        };

        Self {
            budget_pct: pct(ResourceKind::Budget),
            room_hours_pct: pct(ResourceKind::RoomHours),
            icu_beds_pct: pct(ResourceKind::IcuBeds),
        }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<f64> {
        match kind {
            ResourceKind::Budget => self.budget_pct,
            ResourceKind::RoomHours => self.room_hours_pct,
            ResourceKind::IcuBeds => self.icu_beds_pct,
        }
    }
}

/// 求解統計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    /// 探索的分支定界節點數
    pub nodes_explored: u64,
    /// 求解耗時（毫秒）
    pub elapsed_ms: u64,
}

/// 分配結果
///
/// 每個目錄項目各一列（依目錄順序，數量為 0 者也保留）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub criterion: ObjectiveCriterion,
    pub method: SolveMethod,
    pub lines: Vec<AllocationLine>,
    pub totals: AllocationTotals,
    pub utilization: ResourceUtilization,
    pub stats: SolveStats,
}

impl Allocation {
    /// 由數量向量建立分配結果
    ///
    /// `quantities` 與目錄順序一一對應；總計以 Decimal 精確計算，
    /// 超出 Decimal 範圍時回傳 `Solver` 錯誤。
    pub fn from_quantities(
        catalog: &Catalog,
        envelope: &ResourceEnvelope,
        criterion: ObjectiveCriterion,
        quantities: &[u32],
        method: SolveMethod,
    ) -> Result<Self> {
        debug_assert_eq!(catalog.len(), quantities.len());

        let mut lines = Vec::with_capacity(catalog.len());
        let mut totals = AllocationTotals::default();

        for (procedure, &quantity) in catalog.iter().zip(quantities) {
            let overflow = || {
                AllocError::Solver(format!(
                    "手術 {} 數量 {} 的用量超出數值範圍",
                    procedure.id, quantity
                ))
            };
            let unit_weight = criterion.weight(procedure)?;
            let qty = Decimal::from(quantity);
            let line = AllocationLine {
                procedure_id: procedure.id.clone(),
                name: procedure.name.clone(),
                quantity,
                unit_weight,
                value: unit_weight * f64::from(quantity),
                cost: procedure.unit_cost.checked_mul(qty).ok_or_else(overflow)?,
                hours: procedure
                    .duration_hours
                    .checked_mul(qty)
                    .ok_or_else(overflow)?,
                icu_units: procedure.icu_units().saturating_mul(quantity),
            };

            totals.total_value += line.value;
            totals.total_cost = totals
                .total_cost
                .checked_add(line.cost)
                .ok_or_else(overflow)?;
            totals.total_hours = totals
                .total_hours
                .checked_add(line.hours)
                .ok_or_else(overflow)?;
            totals.total_icu_units = totals.total_icu_units.saturating_add(line.icu_units);
            totals.total_procedures += u64::from(quantity);
            lines.push(line);
        }

        let utilization = ResourceUtilization::compute(&totals, envelope);

        Ok(Self {
            criterion,
            method,
            lines,
            totals,
            utilization,
            stats: SolveStats::default(),
        })
    }

    /// 全零分配
    pub fn zero(
        catalog: &Catalog,
        envelope: &ResourceEnvelope,
        criterion: ObjectiveCriterion,
        method: SolveMethod,
    ) -> Result<Self> {
        Self::from_quantities(
            catalog,
            envelope,
            criterion,
            &vec![0; catalog.len()],
            method,
        )
    }

    /// 建構器模式：設置求解統計
    pub fn with_stats(mut self, stats: SolveStats) -> Self {
        self.stats = stats;
        self
    }

    /// 查詢某手術類型的數量（不存在時為 0）
    pub fn quantity(&self, procedure_id: &str) -> u32 {
        self.lines
            .iter()
            .find(|l| l.procedure_id == procedure_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// 數量向量（目錄順序）
    pub fn quantities(&self) -> Vec<u32> {
        self.lines.iter().map(|l| l.quantity).collect()
    }

    /// 手術類型ID → 數量（僅非零）
    pub fn quantity_map(&self) -> BTreeMap<String, u32> {
        self.nonzero_lines()
            .map(|l| (l.procedure_id.clone(), l.quantity))
            .collect()
    }

    /// 報表用：只列出數量大於 0 的明細
    pub fn nonzero_lines(&self) -> impl Iterator<Item = &AllocationLine> + '_ {
        self.lines.iter().filter(|l| l.quantity > 0)
    }

    /// 列出超出容量的資源（正常求解結果應為空）
    pub fn violations(&self, envelope: &ResourceEnvelope) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|&kind| self.totals.usage(kind) > envelope.capacity(kind))
            .collect()
    }

    /// 是否滿足所有容量限制
    pub fn fits(&self, envelope: &ResourceEnvelope) -> bool {
        self.violations(envelope).is_empty()
    }

    /// 剩餘容量
    pub fn slack(&self, envelope: &ResourceEnvelope, kind: ResourceKind) -> Decimal {
        envelope.capacity(kind) - self.totals.usage(kind)
    }
}

/// 求解狀態標籤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Approximate,
    Infeasible,
    Unbounded,
    TimedOut,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Approximate => "approximate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimedOut => "timed_out",
        };
        f.write_str(label)
    }
}

/// 求解結果
///
/// 成功與「沒有好答案」兩種情況都用同一型別表示，呼叫端必須處理兩者。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveOutcome {
    /// 已證明最佳
    Optimal(Allocation),

    /// 近似解（貪婪），不可視為最佳
    Approximate(Allocation),

    /// 無可行解（在非負容量下不應出現，代表輸入有誤）
    Infeasible { message: String },

    /// 模型無界（代表約束式建構有缺陷）
    Unbounded { message: String },

    /// 超出節點或時間預算
    TimedOut {
        best_known: Option<Allocation>,
        nodes_explored: u64,
    },
}

impl SolveOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Optimal(_) => SolveStatus::Optimal,
            SolveOutcome::Approximate(_) => SolveStatus::Approximate,
            SolveOutcome::Infeasible { .. } => SolveStatus::Infeasible,
            SolveOutcome::Unbounded { .. } => SolveStatus::Unbounded,
            SolveOutcome::TimedOut { .. } => SolveStatus::TimedOut,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveOutcome::Optimal(_))
    }

    /// 取得分配結果（逾時時為目前最佳的可行解）
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            SolveOutcome::Optimal(allocation) | SolveOutcome::Approximate(allocation) => {
                Some(allocation)
            }
            SolveOutcome::TimedOut { best_known, .. } => best_known.as_ref(),
            SolveOutcome::Infeasible { .. } | SolveOutcome::Unbounded { .. } => None,
        }
    }

    pub fn into_allocation(self) -> Option<Allocation> {
        match self {
            SolveOutcome::Optimal(allocation) | SolveOutcome::Approximate(allocation) => {
                Some(allocation)
            }
            SolveOutcome::TimedOut { best_known, .. } => best_known,
            SolveOutcome::Infeasible { .. } | SolveOutcome::Unbounded { .. } => None,
        }
    }

    /// 目標值（無分配時為 None）
    pub fn objective_value(&self) -> Option<f64> {
        self.allocation().map(|a| a.totals.total_value)
    }
}
