//! 分配器主入口

use std::time::Instant;

use surgery_core::{
    AllocError, Allocation, Catalog, ObjectiveCriterion, ResourceEnvelope, SolveMethod,
    SolveOutcome, SolveStats, SolverConfig,
};

use crate::model::AllocationModel;
use crate::{AllocationStrategy, ExactSolver, GreedyApproximator, MilpSolver, ModelOutcome};

/// 手術分配器
///
/// 持有一個求解策略與求解器配置，可跨執行緒共用。
pub struct Allocator {
    /// 求解策略
    strategy: Box<dyn AllocationStrategy>,

    /// 求解器配置
    config: SolverConfig,
}

impl Allocator {
    /// 以任意策略創建分配器
    pub fn new(strategy: Box<dyn AllocationStrategy>) -> Self {
        Self {
            strategy,
            config: SolverConfig::default(),
        }
    }

    /// 精確求解（分支定界）
    pub fn exact() -> Self {
        Self::new(Box::new(ExactSolver::new()))
    }

    /// 貪婪近似
    pub fn greedy() -> Self {
        Self::new(Box::new(GreedyApproximator::new()))
    }

    /// MILP 後端
    pub fn milp() -> Self {
        Self::new(Box::new(MilpSolver::new()))
    }

    /// 依求解方法創建
    pub fn for_method(method: SolveMethod) -> Self {
        match method {
            SolveMethod::Exact => Self::exact(),
            SolveMethod::Greedy => Self::greedy(),
            SolveMethod::Milp => Self::milp(),
        }
    }

    /// 建構器模式：設置求解器配置
    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method(&self) -> SolveMethod {
        self.strategy.method()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 主求解入口
    ///
    /// 結構性錯誤（空目錄、配置中的未知ID）以 `Err` 回傳；
    /// 無可行解、無界、逾時則以 [`SolveOutcome`] 表示。
    pub fn allocate(
        &self,
        catalog: &Catalog,
        envelope: &ResourceEnvelope,
        criterion: ObjectiveCriterion,
    ) -> surgery_core::Result<SolveOutcome> {
        if catalog.is_empty() {
            return Err(AllocError::EmptyCatalog);
        }

        let method = self.method();
        tracing::info!(
            "開始分配求解：方法 {}，準則 {}，手術類型 {} 種",
            method,
            criterion,
            catalog.len()
        );

        let start_time = Instant::now();
        let model = AllocationModel::build(catalog, envelope, criterion, &self.config)?;
        let outcome = self.strategy.solve(&model, &self.config)?;
        let elapsed_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

        let build = |quantities: &[u32], nodes_explored: u64| -> surgery_core::Result<Allocation> {
            let allocation =
                Allocation::from_quantities(catalog, envelope, criterion, quantities, method)?
                    .with_stats(SolveStats {
                        nodes_explored,
                        elapsed_ms,
                    });
            let violations = allocation.violations(envelope);
            if !violations.is_empty() {
                tracing::error!(?violations, ?quantities, "求解結果超出資源上限");
                return Err(AllocError::Solver(format!(
                    "{method} 求解結果超出資源上限: {violations:?}"
                )));
            }
            Ok(allocation)
        };

        let result = match outcome {
            ModelOutcome::Solved {
                quantities,
                nodes_explored,
            } => {
                let allocation = build(&quantities, nodes_explored)?;
                if method.is_exact() {
                    SolveOutcome::Optimal(allocation)
                } else {
                    SolveOutcome::Approximate(allocation)
                }
            }
            ModelOutcome::Infeasible(message) => {
                tracing::warn!("求解器回報無可行解: {}", message);
                SolveOutcome::Infeasible { message }
            }
            ModelOutcome::Unbounded(message) => {
                tracing::error!("模型無界，約束式建構有缺陷: {}", message);
                SolveOutcome::Unbounded { message }
            }
            ModelOutcome::TimedOut {
                best_known,
                nodes_explored,
            } => SolveOutcome::TimedOut {
                best_known: best_known
                    .map(|quantities| build(&quantities, nodes_explored))
                    .transpose()?,
                nodes_explored,
            },
        };

        tracing::info!(
            "分配求解完成：狀態 {}，目標值 {:?}，耗時 {} ms",
            result.status(),
            result.objective_value(),
            elapsed_ms
        );

        Ok(result)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::exact()
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("method", &self.method())
            .field("config", &self.config)
            .finish()
    }
}
