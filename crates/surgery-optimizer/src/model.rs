//! 整數規劃模型建構
//!
//! maximize Σ w_i·x_i
//! s.t.     Σ cost_i·x_i ≤ budget
//!          Σ hours_i·x_i ≤ room_hours
//!          Σ icu_i·x_i ≤ icu_beds
//!          0 ≤ x_i ≤ max_i, x_i 為整數

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use surgery_core::{Catalog, ObjectiveCriterion, ResourceEnvelope, ResourceKind, SolverConfig};

/// 決策變數（每個手術類型一個，依目錄順序）
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionVariable {
    pub procedure_id: String,
    /// 目標函數係數
    pub weight: f64,
    /// 精確權重（貪婪排序用）
    pub weight_exact: Decimal,
    /// 數量上限（配置上限與容量推導上限取較小者；None 表示無界）
    pub upper_bound: Option<u32>,
}

/// 容量約束 Σ a_i·x_i ≤ capacity
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityConstraint {
    pub resource: ResourceKind,
    pub coefficients: Vec<Decimal>,
    pub capacity: Decimal,
}

impl CapacityConstraint {
    pub fn coefficients_f64(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .map(|c| c.to_f64().unwrap_or(f64::INFINITY))
            .collect()
    }

    pub fn capacity_f64(&self) -> f64 {
        self.capacity.to_f64().unwrap_or(f64::INFINITY)
    }

    /// 以精確算術計算用量（超出 Decimal 範圍時為 None）
    pub fn usage(&self, quantities: &[u32]) -> Option<Decimal> {
        self.coefficients
            .iter()
            .zip(quantities)
            .try_fold(Decimal::ZERO, |total, (a, &x)| {
                total.checked_add(a.checked_mul(Decimal::from(x))?)
            })
    }

    /// 用量是否在容量內
    pub fn admits(&self, quantities: &[u32]) -> bool {
        self.usage(quantities)
            .is_some_and(|used| used <= self.capacity)
    }
}

/// 分配模型
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationModel {
    pub variables: Vec<DecisionVariable>,
    pub constraints: Vec<CapacityConstraint>,
}

impl AllocationModel {
    /// 由目錄、資源上限與目標準則建立模型
    pub fn build(
        catalog: &Catalog,
        envelope: &ResourceEnvelope,
        criterion: ObjectiveCriterion,
        config: &SolverConfig,
    ) -> surgery_core::Result<Self> {
        for id in config.max_quantity.keys() {
            catalog.get(id)?;
        }

        let constraints: Vec<CapacityConstraint> = ResourceKind::ALL
            .into_iter()
            .map(|resource| CapacityConstraint {
                resource,
                coefficients: catalog
                    .iter()
                    .map(|p| match resource {
                        ResourceKind::Budget => p.unit_cost,
                        ResourceKind::RoomHours => p.duration_hours,
                        ResourceKind::IcuBeds => Decimal::from(p.icu_units()),
                    })
                    .collect(),
                capacity: envelope.capacity(resource),
            })
            .collect();

        let variables = catalog
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let implied = implied_bound(&constraints, i);
                let configured = config.quantity_cap(&p.id);
                let upper_bound = match (implied, configured) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };

                Ok(DecisionVariable {
                    procedure_id: p.id.clone(),
                    weight: criterion.weight(p)?,
                    weight_exact: criterion.weight_decimal(p)?,
                    upper_bound,
                })
            })
            .collect::<surgery_core::Result<Vec<_>>>()?;

        Ok(Self {
            variables,
            constraints,
        })
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// 第一個沒有上限的變數（有效目錄下不會出現）
    pub fn unbounded_variable(&self) -> Option<&DecisionVariable> {
        self.variables
            .iter()
            .find(|v| v.upper_bound.is_none() && v.weight > 0.0)
    }

    /// 目標值
    pub fn objective(&self, quantities: &[u32]) -> f64 {
        self.variables
            .iter()
            .zip(quantities)
            .map(|(v, &x)| v.weight * f64::from(x))
            .sum()
    }

    /// 以精確算術檢查可行性
    pub fn is_feasible(&self, quantities: &[u32]) -> bool {
        let within_bounds = self
            .variables
            .iter()
            .zip(quantities)
            .all(|(v, &x)| v.upper_bound.map_or(true, |ub| x <= ub));

        within_bounds && self.within_capacity(quantities)
    }

    /// 只檢查容量約束（不看變數上限）
    pub fn within_capacity(&self, quantities: &[u32]) -> bool {
        self.constraints.iter().all(|c| c.admits(quantities))
    }
}

/// 剩餘容量最多還能容納幾個單位（a > 0）
///
/// 商超出 Decimal 範圍時視為 `u32::MAX`；剩餘量為負時為 0。
pub(crate) fn max_units(remaining: Decimal, coefficient: Decimal) -> u32 {
    if remaining <= Decimal::ZERO {
        return 0;
    }
    remaining
        .checked_div(coefficient)
        .map_or(u32::MAX, |units| units.floor().to_u32().unwrap_or(u32::MAX))
}

/// 由容量推導單一變數的上限：min_k floor(capacity_k / a_k)，僅考慮 a_k > 0
fn implied_bound(constraints: &[CapacityConstraint], index: usize) -> Option<u32> {
    constraints
        .iter()
        .filter(|c| c.coefficients[index] > Decimal::ZERO)
        .map(|c| max_units(c.capacity, c.coefficients[index]))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use surgery_core::reference::oncology_catalog;
    use surgery_core::AllocError;

    fn envelope() -> ResourceEnvelope {
        ResourceEnvelope::new(Decimal::from(500_000), Decimal::from(480), 15).unwrap()
    }

    #[test]
    fn test_build_reference_model() {
        let catalog = oncology_catalog().unwrap();
        let model = AllocationModel::build(
            &catalog,
            &envelope(),
            ObjectiveCriterion::Incidence,
            &SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(model.len(), 8);
        assert_eq!(model.constraints.len(), 3);
        assert_eq!(model.constraints[0].resource, ResourceKind::Budget);
        assert_eq!(model.variables[2].procedure_id, "P3");
        assert!((model.variables[2].weight - 13.71).abs() < 1e-12);

        // P1: min(500000/15000, 480/3.5, 15/1) = 15
        assert_eq!(model.variables[0].upper_bound, Some(15));
        // P7 不需 ICU: min(500000/12000, 480/2.5) = 41
        assert_eq!(model.variables[6].upper_bound, Some(41));
        assert!(model.unbounded_variable().is_none());
    }

    #[test]
    fn test_configured_cap_tightens_bound() {
        let catalog = oncology_catalog().unwrap();
        let config = SolverConfig::new().with_max_quantity("P7", 3);
        let model = AllocationModel::build(
            &catalog,
            &envelope(),
            ObjectiveCriterion::Severity,
            &config,
        )
        .unwrap();

        assert_eq!(model.variables[6].upper_bound, Some(3));
    }

    #[test]
    fn test_unknown_cap_id_rejected() {
        let catalog = oncology_catalog().unwrap();
        let config = SolverConfig::new().with_max_quantity("P99", 3);
        let err = AllocationModel::build(
            &catalog,
            &envelope(),
            ObjectiveCriterion::Severity,
            &config,
        )
        .unwrap_err();

        assert_eq!(err, AllocError::NotFound("P99".to_string()));
    }

    #[test]
    fn test_feasibility_check_is_exact() {
        let catalog = oncology_catalog().unwrap();
        let model = AllocationModel::build(
            &catalog,
            &envelope(),
            ObjectiveCriterion::Incidence,
            &SolverConfig::default(),
        )
        .unwrap();

        // 14×P3 + 1×P2 + 11×P7 恰好用完預算
        let quantities = [0, 1, 14, 0, 0, 0, 11, 0];
        assert!(model.is_feasible(&quantities));
        assert_eq!(
            model.constraints[0].usage(&quantities),
            Some(Decimal::from(500_000))
        );

        let over = [0, 1, 14, 0, 0, 0, 12, 0];
        assert!(!model.is_feasible(&over));
    }

    #[test]
    fn test_tiny_unit_cost_saturates_bound() {
        let catalog = Catalog::load(vec![surgery_core::ProcedureRecord::new("A", "A")
            .with_severity("5")
            .with_duration_hours("1")
            .with_unit_cost("0.0000000000000000000000001")
            .with_requires_icu("0")
            .with_incidence_rate("0")])
        .unwrap();
        let envelope = ResourceEnvelope::new(Decimal::from(1_000_000), Decimal::from(10), 0).unwrap();

        let model = AllocationModel::build(
            &catalog,
            &envelope,
            ObjectiveCriterion::Severity,
            &SolverConfig::default(),
        )
        .unwrap();
        // 預算推導的上限飽和為 u32::MAX，由手術室時數決定
        assert_eq!(model.variables[0].upper_bound, Some(10));

        let err = AllocationModel::build(
            &catalog,
            &envelope,
            ObjectiveCriterion::CostEfficiency,
            &SolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AllocError::Solver(_)));
    }

    #[test]
    fn test_max_units() {
        assert_eq!(max_units(Decimal::from(10), Decimal::from(3)), 3);
        assert_eq!(max_units(Decimal::new(-1, 7), Decimal::ONE), 0);
        assert_eq!(max_units(Decimal::from(1_000_000), Decimal::new(1, 25)), u32::MAX);
    }
}
