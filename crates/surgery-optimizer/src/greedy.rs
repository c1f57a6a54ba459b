//! 貪婪近似
//!
//! 依權重由高到低排序，每種手術盡量填滿剩餘容量。速度快，但**不保證最佳**：
//! 當一個高權重項目需要稀缺資源、而該資源已被較低權重的項目先用掉時，
//! 結果可能明顯低於最佳解。只作為比較基準與分支定界的初始下界。

use rust_decimal::Decimal;
use surgery_core::{SolveMethod, SolverConfig};

use crate::model::{max_units, AllocationModel};
use crate::{AllocationStrategy, ModelOutcome};

/// 貪婪近似器
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyApproximator;

impl GreedyApproximator {
    pub fn new() -> Self {
        Self
    }

    /// 計算貪婪填充的數量向量（目錄順序）
    pub fn fill(model: &AllocationModel) -> Vec<u32> {
        let mut order: Vec<usize> = (0..model.len()).collect();
        // 穩定排序：權重相同時保持目錄順序
        order.sort_by(|&a, &b| {
            model.variables[b]
                .weight_exact
                .cmp(&model.variables[a].weight_exact)
        });

        let mut remaining: Vec<Decimal> = model.constraints.iter().map(|c| c.capacity).collect();
        let mut quantities = vec![0u32; model.len()];

        for index in order {
            let variable = &model.variables[index];
            if variable.weight_exact <= Decimal::ZERO {
                continue;
            }

            let by_capacity = model
                .constraints
                .iter()
                .zip(&remaining)
                .filter(|(c, _)| c.coefficients[index] > Decimal::ZERO)
                .map(|(c, rem)| max_units(*rem, c.coefficients[index]))
                .min();

            let quantity = match (by_capacity, variable.upper_bound) {
                (Some(a), Some(b)) => a.min(b),
                (a, b) => a.or(b).unwrap_or(0),
            };
            if quantity == 0 {
                continue;
            }

            quantities[index] = quantity;
            for (c, rem) in model.constraints.iter().zip(remaining.iter_mut()) {
                *rem -= c.coefficients[index] * Decimal::from(quantity);
            }
        }

        quantities
    }
}

impl AllocationStrategy for GreedyApproximator {
    fn method(&self) -> SolveMethod {
        SolveMethod::Greedy
    }

    fn solve(
        &self,
        model: &AllocationModel,
        _config: &SolverConfig,
    ) -> surgery_core::Result<ModelOutcome> {
        Ok(ModelOutcome::Solved {
            quantities: Self::fill(model),
            nodes_explored: 0,
        })
    }
}
