//! # Surgery Optimizer
//!
//! 整數分配求解（分支定界、貪婪近似、MILP 後端）

pub mod allocator;
pub mod branch_and_bound;
pub mod greedy;
pub mod milp;
pub mod model;
pub mod simplex;

// Re-export 主要類型
pub use allocator::Allocator;
pub use branch_and_bound::ExactSolver;
pub use greedy::GreedyApproximator;
pub use milp::MilpSolver;
pub use model::{AllocationModel, CapacityConstraint, DecisionVariable};

use surgery_core::{SolveMethod, SolverConfig};

/// 求解策略
///
/// 所有策略求解同一個 [`AllocationModel`]，回傳目錄順序的數量向量。
/// 是否為最佳解由 [`SolveMethod::is_exact`] 決定。
pub trait AllocationStrategy: Send + Sync {
    fn method(&self) -> SolveMethod;

    fn solve(
        &self,
        model: &AllocationModel,
        config: &SolverConfig,
    ) -> surgery_core::Result<ModelOutcome>;
}

/// 模型層級的求解結果（尚未轉成 [`surgery_core::Allocation`]）
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Solved {
        quantities: Vec<u32>,
        nodes_explored: u64,
    },
    Infeasible(String),
    Unbounded(String),
    TimedOut {
        best_known: Option<Vec<u32>>,
        nodes_explored: u64,
    },
}
