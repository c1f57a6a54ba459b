//! 外部 MILP 後端（good_lp + microlp）
//!
//! 與 [`crate::ExactSolver`] 求解同一模型，用於交叉驗證。microlp 不支援
//! 節點或時間預算，因此配置中的預算在此被忽略。後端回傳的浮點值
//! 以精確容量重新取整，見 [`snap`]。

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use surgery_core::{AllocError, SolveMethod, SolverConfig};

use crate::model::AllocationModel;
use crate::{AllocationStrategy, ModelOutcome};

/// MILP 後端求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AllocationStrategy for MilpSolver {
    fn method(&self) -> SolveMethod {
        SolveMethod::Milp
    }

    fn solve(
        &self,
        model: &AllocationModel,
        _config: &SolverConfig,
    ) -> surgery_core::Result<ModelOutcome> {
        if let Some(variable) = model.unbounded_variable() {
            return Ok(ModelOutcome::Unbounded(format!(
                "變數 {} 沒有任何正係數的容量約束",
                variable.procedure_id
            )));
        }

        let mut vars = variables!();
        let xs: Vec<Variable> = model
            .variables
            .iter()
            .map(|v| {
                let definition = variable().integer().min(0.0);
                match v.upper_bound {
                    Some(ub) => vars.add(definition.max(f64::from(ub))),
                    None => vars.add(definition),
                }
            })
            .collect();

        let objective: Expression = model
            .variables
            .iter()
            .zip(&xs)
            .map(|(v, &x)| v.weight * x)
            .sum();

        let mut problem = vars.maximise(objective).using(default_solver);
        for c in &model.constraints {
            let lhs: Expression = c
                .coefficients_f64()
                .into_iter()
                .zip(&xs)
                .map(|(a, &x)| a * x)
                .sum();
            problem = problem.with(constraint!(lhs <= c.capacity_f64()));
        }

        match problem.solve() {
            Ok(solution) => {
                let raw: Vec<f64> = xs.iter().map(|&x| solution.value(x)).collect();
                let quantities = snap(model, &raw);
                Ok(ModelOutcome::Solved {
                    quantities,
                    nodes_explored: 0,
                })
            }
            Err(ResolutionError::Infeasible) => {
                Ok(ModelOutcome::Infeasible("MILP 後端回報無可行解".to_string()))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(ModelOutcome::Unbounded("MILP 後端回報模型無界".to_string()))
            }
            Err(other) => Err(AllocError::Solver(other.to_string())),
        }
    }
}

/// 將後端的浮點解轉為精確可行的整數解
///
/// 先取下整，再逐一嘗試捨入到最近整數；若下整仍越界（後端容差內的違反），
/// 依權重由低到高逐個減少數量直到可行。全零必定可行。
fn snap(model: &AllocationModel, raw: &[f64]) -> Vec<u32> {
    let clamp = |i: usize, v: f64| {
        let v = v.max(0.0) as u32;
        model.variables[i].upper_bound.map_or(v, |ub| v.min(ub))
    };

    let mut quantities: Vec<u32> = raw
        .iter()
        .enumerate()
        .map(|(i, &v)| clamp(i, v.floor()))
        .collect();

    if !model.is_feasible(&quantities) {
        tracing::warn!(?raw, "MILP 後端的解超出精確容量，逐步修正");
        while !model.is_feasible(&quantities) {
            let Some(index) = (0..quantities.len())
                .filter(|&i| quantities[i] > 0)
                .min_by(|&a, &b| {
                    model.variables[a]
                        .weight_exact
                        .cmp(&model.variables[b].weight_exact)
                })
            else {
                break;
            };
            quantities[index] -= 1;
        }
    }

    for (i, &v) in raw.iter().enumerate() {
        let rounded = clamp(i, v.round());
        if rounded > quantities[i] {
            let previous = quantities[i];
            quantities[i] = rounded;
            if !model.is_feasible(&quantities) {
                quantities[i] = previous;
            }
        }
    }

    quantities
}
