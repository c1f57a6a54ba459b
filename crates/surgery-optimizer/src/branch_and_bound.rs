//! 精確求解：以線性鬆弛為上界的深度優先分支定界
//!
//! 每個節點以變數的上下界描述。節點的鬆弛問題經由平移 y = x - lower
//! 轉成 b ≥ 0 的標準形式，交給單純形法；若鬆弛解已為整數即為該子樹最佳，
//! 否則以目錄順序中第一個分數變數分支（先探索向上分支）。
//! 鬆弛解在容差內為整數、但捨入後違反精確容量時，把越界的變數當作分數變數繼續分支。
//! 只有嚴格改進才替換現任解，因此相同輸入必得相同結果。

use std::time::Instant;

use surgery_core::{SolveMethod, SolverConfig};

use crate::greedy::GreedyApproximator;
use crate::model::AllocationModel;
use crate::simplex::{self, LpOutcome};
use crate::{AllocationStrategy, ModelOutcome};

/// 整數判定容差
const INTEGRALITY_TOL: f64 = 1e-6;
/// 可行性與剪枝容差
const FEASIBILITY_TOL: f64 = 1e-7;

/// 分支定界節點
#[derive(Debug, Clone)]
struct Node {
    lower: Vec<u32>,
    upper: Vec<u32>,
}

/// 節點鬆弛的結果
enum Relaxation {
    /// 下界已使某個容量超支
    Infeasible,
    Bounded { values: Vec<f64>, bound: f64 },
    Unbounded,
    /// 單純形法未收斂，節點未被探索
    Abandoned,
}

/// 精確求解器（分支定界）
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl ExactSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AllocationStrategy for ExactSolver {
    fn method(&self) -> SolveMethod {
        SolveMethod::Exact
    }

    fn solve(
        &self,
        model: &AllocationModel,
        config: &SolverConfig,
    ) -> surgery_core::Result<ModelOutcome> {
        if let Some(variable) = model.unbounded_variable() {
            return Ok(ModelOutcome::Unbounded(format!(
                "變數 {} 沒有任何正係數的容量約束",
                variable.procedure_id
            )));
        }

        let search = Search::new(model, config);
        Ok(search.run())
    }
}

struct Search<'a> {
    model: &'a AllocationModel,
    config: &'a SolverConfig,
    coefficients: Vec<Vec<f64>>,
    capacities: Vec<f64>,
    weights: Vec<f64>,
    incumbent: Vec<u32>,
    incumbent_value: f64,
    nodes_explored: u64,
    /// 鬆弛未收斂而放棄的節點數；非零時不得宣稱最佳
    abandoned: u64,
    started: Instant,
}

impl<'a> Search<'a> {
    fn new(model: &'a AllocationModel, config: &'a SolverConfig) -> Self {
        let (incumbent, incumbent_value) = if config.warm_start {
            let seed = GreedyApproximator::fill(model);
            let value = model.objective(&seed);
            (seed, value)
        } else {
            (vec![0; model.len()], 0.0)
        };

        Self {
            model,
            config,
            coefficients: model
                .constraints
                .iter()
                .map(|c| c.coefficients_f64())
                .collect(),
            capacities: model.constraints.iter().map(|c| c.capacity_f64()).collect(),
            weights: model.variables.iter().map(|v| v.weight).collect(),
            incumbent,
            incumbent_value,
            nodes_explored: 0,
            abandoned: 0,
            started: Instant::now(),
        }
    }

    fn run(mut self) -> ModelOutcome {
        let root = Node {
            lower: vec![0; self.model.len()],
            upper: self
                .model
                .variables
                .iter()
                .map(|v| v.upper_bound.unwrap_or(0))
                .collect(),
        };
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if self.budget_exhausted() {
                tracing::warn!(
                    nodes = self.nodes_explored,
                    best = self.incumbent_value,
                    "分支定界超出節點或時間預算"
                );
                return ModelOutcome::TimedOut {
                    best_known: Some(self.incumbent),
                    nodes_explored: self.nodes_explored,
                };
            }
            self.nodes_explored += 1;

            let (values, bound) = match self.relax(&node) {
                Relaxation::Infeasible => continue,
                Relaxation::Unbounded => {
                    return ModelOutcome::Unbounded("線性鬆弛無界".to_string());
                }
                Relaxation::Abandoned => {
                    self.abandoned += 1;
                    continue;
                }
                Relaxation::Bounded { values, bound } => (values, bound),
            };

            if bound <= self.incumbent_value + FEASIBILITY_TOL {
                continue;
            }

            match first_fractional(&values) {
                Some((index, value)) => {
                    branch(&mut stack, node, index, value.floor() as u32);
                }
                None => {
                    let candidate = round_within(&node, &values);
                    if self.model.is_feasible(&candidate) {
                        self.offer(candidate);
                    } else if let Some(index) = overshoot(&node, &candidate, &values) {
                        tracing::debug!(?candidate, index, "捨入後的整數解越界，改為分支");
                        branch(&mut stack, node, index, candidate[index] - 1);
                    }
                }
            }
        }

        self.finish()
    }

    fn finish(self) -> ModelOutcome {
        if self.abandoned > 0 {
            tracing::warn!(
                abandoned = self.abandoned,
                best = self.incumbent_value,
                "部分節點的鬆弛未收斂，無法證明最佳"
            );
            return ModelOutcome::TimedOut {
                best_known: Some(self.incumbent),
                nodes_explored: self.nodes_explored,
            };
        }

        tracing::debug!(
            nodes = self.nodes_explored,
            value = self.incumbent_value,
            "分支定界完成"
        );
        ModelOutcome::Solved {
            quantities: self.incumbent,
            nodes_explored: self.nodes_explored,
        }
    }

    fn budget_exhausted(&self) -> bool {
        let nodes_hit = self
            .config
            .max_nodes
            .is_some_and(|max| self.nodes_explored >= max);
        let time_hit = self
            .config
            .time_limit()
            .is_some_and(|limit| self.started.elapsed() >= limit);
        nodes_hit || time_hit
    }

    /// 求解節點的線性鬆弛，回傳原始變數的值與目標上界
    fn relax(&self, node: &Node) -> Relaxation {
        let n = self.model.len();

        // 下界本身以精確算術檢查
        if !self.model.within_capacity(&node.lower) {
            return Relaxation::Infeasible;
        }

        let mut rhs = Vec::with_capacity(self.capacities.len());
        for (row, &capacity) in self.coefficients.iter().zip(&self.capacities) {
            let used: f64 = row
                .iter()
                .zip(&node.lower)
                .map(|(a, &l)| a * f64::from(l))
                .sum();
            rhs.push((capacity - used).max(0.0));
        }

        let free: Vec<usize> = (0..n).filter(|&i| node.upper[i] > node.lower[i]).collect();
        let base_value: f64 = self
            .weights
            .iter()
            .zip(&node.lower)
            .map(|(w, &l)| w * f64::from(l))
            .sum();

        let objective: Vec<f64> = free.iter().map(|&i| self.weights[i]).collect();
        let mut rows: Vec<Vec<f64>> = self
            .coefficients
            .iter()
            .map(|row| free.iter().map(|&i| row[i]).collect())
            .collect();
        for (k, &i) in free.iter().enumerate() {
            let mut bound_row = vec![0.0; free.len()];
            bound_row[k] = 1.0;
            rows.push(bound_row);
            rhs.push(f64::from(node.upper[i] - node.lower[i]));
        }

        match simplex::maximize(&objective, &rows, &rhs) {
            LpOutcome::Optimal {
                values: shifted,
                objective,
            } => {
                let mut values: Vec<f64> = node.lower.iter().map(|&l| f64::from(l)).collect();
                for (k, &i) in free.iter().enumerate() {
                    values[i] += shifted[k];
                }
                Relaxation::Bounded {
                    values,
                    bound: base_value + objective,
                }
            }
            LpOutcome::Unbounded => Relaxation::Unbounded,
            LpOutcome::PivotLimit => {
                tracing::error!(nodes = self.nodes_explored, "單純形法超出樞軸次數上限");
                Relaxation::Abandoned
            }
        }
    }

    /// 已驗證可行的整數解：嚴格改進時成為現任解
    fn offer(&mut self, candidate: Vec<u32>) {
        let value = self.model.objective(&candidate);
        if value > self.incumbent_value + FEASIBILITY_TOL {
            tracing::trace!(value, nodes = self.nodes_explored, "更新現任解");
            self.incumbent = candidate;
            self.incumbent_value = value;
        }
    }
}

/// 以 `floor` 為界拆成向下與向上兩個子節點（向上分支先探索）
fn branch(stack: &mut Vec<Node>, node: Node, index: usize, floor: u32) {
    let mut down = node.clone();
    down.upper[index] = floor;
    let mut up = node;
    up.lower[index] = floor + 1;

    if down.lower[index] <= down.upper[index] {
        stack.push(down);
    }
    if up.lower[index] <= up.upper[index] {
        stack.push(up);
    }
}

/// 將鬆弛解捨入到節點的上下界內
fn round_within(node: &Node, values: &[f64]) -> Vec<u32> {
    values
        .iter()
        .zip(node.lower.iter().zip(&node.upper))
        .map(|(v, (&lower, &upper))| (v.round().max(0.0) as u32).clamp(lower, upper))
        .collect()
}

/// 捨入解不可行時要分支的變數：優先取向上捨入者，其次取任何高於下界者
///
/// 兩者都不存在時捨入解等於下界，而下界已通過精確檢查，因此不會發生。
fn overshoot(node: &Node, candidate: &[u32], values: &[f64]) -> Option<usize> {
    let above_lower = |i: &usize| candidate[*i] > node.lower[*i];
    (0..candidate.len())
        .filter(above_lower)
        .find(|&i| f64::from(candidate[i]) > values[i])
        .or_else(|| (0..candidate.len()).find(above_lower))
}

/// 目錄順序中第一個非整數的變數
fn first_fractional(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .find(|(_, v)| (*v - v.round()).abs() > INTEGRALITY_TOL)
        .map(|(i, &v)| (i, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use surgery_core::{Catalog, ObjectiveCriterion, ProcedureRecord, ResourceEnvelope};

    fn item(id: &str, weight: &str, hours: &str, icu: &str) -> ProcedureRecord {
        ProcedureRecord::new(id, id)
            .with_severity(weight)
            .with_duration_hours(hours)
            .with_unit_cost("1000")
            .with_requires_icu(icu)
            .with_incidence_rate("0")
    }

    fn model(
        records: Vec<ProcedureRecord>,
        hours: i64,
        icu: i64,
        config: &SolverConfig,
    ) -> AllocationModel {
        let catalog = Catalog::load(records).unwrap();
        let envelope =
            ResourceEnvelope::new(Decimal::from(1_000_000), Decimal::from(hours), icu).unwrap();
        AllocationModel::build(&catalog, &envelope, ObjectiveCriterion::Severity, config).unwrap()
    }

    fn solved(outcome: ModelOutcome) -> Vec<u32> {
        match outcome {
            ModelOutcome::Solved { quantities, .. } => quantities,
            other => panic!("expected solved, got {other:?}"),
        }
    }

    #[test]
    fn test_beats_greedy_on_scarce_hours() {
        let config = SolverConfig::default();
        let model = model(
            vec![item("A", "10", "6", "0"), item("B", "9", "5", "0")],
            10,
            0,
            &config,
        );

        let quantities = solved(ExactSolver::new().solve(&model, &config).unwrap());
        assert_eq!(quantities, vec![0, 2]);
        assert!((model.objective(&quantities) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_result_without_warm_start() {
        let config = SolverConfig::default().with_warm_start(false);
        let model = model(
            vec![
                item("A", "10", "6", "1"),
                item("B", "8", "3", "1"),
                item("C", "6", "2", "1"),
            ],
            6,
            1,
            &config,
        );

        let quantities = solved(ExactSolver::new().solve(&model, &config).unwrap());
        assert_eq!(quantities, vec![1, 0, 0]);
    }

    #[test]
    fn test_node_budget_reports_timeout() {
        let config = SolverConfig::default()
            .with_max_nodes(1)
            .with_warm_start(false);
        // 11 小時：根節點鬆弛為 B=2、A=1/6，必須分支
        let model = model(
            vec![item("A", "10", "6", "0"), item("B", "9", "5", "0")],
            11,
            0,
            &config,
        );

        match ExactSolver::new().solve(&model, &config).unwrap() {
            ModelOutcome::TimedOut {
                best_known,
                nodes_explored,
            } => {
                assert_eq!(nodes_explored, 1);
                let best = best_known.unwrap();
                assert!(model.is_feasible(&best));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_near_integral_overshoot_keeps_branching() {
        // 3A + B ≤ 8.9999999：鬆弛解 A ≈ 3 在容差內，但 3 個 A 超出時數
        let config = SolverConfig::default().with_warm_start(false);
        let catalog =
            Catalog::load(vec![item("A", "10", "3", "0"), item("B", "1", "1", "0")]).unwrap();
        let envelope =
            ResourceEnvelope::new(Decimal::from(1_000_000), Decimal::new(89_999_999, 7), 0)
                .unwrap();
        let model =
            AllocationModel::build(&catalog, &envelope, ObjectiveCriterion::Severity, &config)
                .unwrap();

        let quantities = solved(ExactSolver::new().solve(&model, &config).unwrap());
        assert_eq!(quantities, vec![2, 2]);
        assert!((model.objective(&quantities) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_abandoned_relaxation_is_not_optimal() {
        let config = SolverConfig::default();
        let model = model(
            vec![item("A", "10", "6", "0"), item("B", "9", "5", "0")],
            10,
            0,
            &config,
        );

        let mut search = Search::new(&model, &config);
        search.abandoned = 1;
        match search.run() {
            ModelOutcome::TimedOut { best_known, .. } => {
                assert!(model.is_feasible(&best_known.unwrap()));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_overshoot_prefers_rounded_up_variable() {
        let node = Node {
            lower: vec![0, 0],
            upper: vec![5, 5],
        };
        assert_eq!(overshoot(&node, &[2, 3], &[2.0, 2.9999999]), Some(1));
        assert_eq!(overshoot(&node, &[2, 0], &[2.0000001, 0.0]), Some(0));
        assert_eq!(overshoot(&node, &[0, 0], &[0.0, 0.0]), None);
        assert_eq!(round_within(&node, &[-0.0000001, 5.0000001]), vec![0, 5]);
    }

    #[test]
    fn test_first_fractional() {
        assert_eq!(first_fractional(&[1.0, 2.0000000001, 3.5]), Some((2, 3.5)));
        assert_eq!(first_fractional(&[0.0, 4.0]), None);
    }
}
