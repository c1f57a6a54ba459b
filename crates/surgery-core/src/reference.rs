//! 參考資料：腫瘤外科八種手術類型與三個標準情境
//!
//! 數值來自 SIH/SUS 的平均值與伯南布哥州（PE）發生率估計。

use rust_decimal::Decimal;

use crate::catalog::Catalog;
use crate::envelope::ResourceEnvelope;
use crate::objective::ObjectiveCriterion;
use crate::procedure::ProcedureType;
use crate::scenario::Scenario;
use crate::Result;

/// (ID, 名稱, 嚴重度×10, 時數×10, 成本, ICU, 發生率×100)
const ONCOLOGY_PROCEDURES: [(&str, &str, i64, i64, i64, bool, i64); 8] = [
    ("P1", "Mastectomy (breast cancer)", 85, 35, 15_000, true, 362),
    ("P2", "Prostatectomy (prostate cancer)", 78, 40, 18_000, true, 1001),
    ("P3", "Colectomy (colon cancer)", 92, 50, 25_000, true, 1371),
    ("P4", "Gastrectomy (stomach cancer)", 95, 60, 28_000, true, 736),
    ("P5", "Lobectomy (lung cancer)", 98, 55, 35_000, true, 309),
    ("P6", "Hysterectomy (uterine cancer)", 75, 30, 14_000, true, 520),
    ("P7", "Thyroidectomy (thyroid cancer)", 65, 25, 12_000, false, 480),
    ("P8", "Nephrectomy (kidney cancer)", 80, 45, 22_000, true, 615),
];

/// 參考手術目錄
pub fn oncology_catalog() -> Result<Catalog> {
    let procedures = ONCOLOGY_PROCEDURES
        .iter()
        .map(|&(id, name, severity, hours, cost, icu, incidence)| {
            ProcedureType::new(
                id.to_string(),
                name.to_string(),
                Decimal::new(hours, 1),
                Decimal::from(cost),
            )
            .with_severity(Decimal::new(severity, 1))
            .with_icu(icu)
            .with_incidence_rate(Decimal::new(incidence, 2))
        })
        .collect();

    Catalog::new(procedures)
}

/// 實際情境：每月預算 500,000、約 20 個工作天的手術室時數、15 張 ICU 床
pub fn real_scenario() -> Result<Scenario> {
    Ok(Scenario::new(
        "REAL",
        ResourceEnvelope::new(Decimal::from(500_000), Decimal::from(480), 15)?,
        ObjectiveCriterion::Incidence,
    )
    .with_description("Current capacity of the regional oncology centre"))
}

/// 樂觀情境：追加投資
pub fn optimistic_scenario() -> Result<Scenario> {
    Ok(Scenario::new(
        "OPTIMISTIC",
        ResourceEnvelope::new(Decimal::from(800_000), Decimal::from(720), 25)?,
        ObjectiveCriterion::Severity,
    )
    .with_description("Additional investment"))
}

/// 悲觀情境：預算刪減
pub fn pessimistic_scenario() -> Result<Scenario> {
    Ok(Scenario::new(
        "PESSIMISTIC",
        ResourceEnvelope::new(Decimal::from(300_000), Decimal::from(320), 8)?,
        ObjectiveCriterion::Severity,
    )
    .with_description("Budget cut"))
}

/// 三個標準情境（實際／樂觀／悲觀）
pub fn reference_scenarios() -> Result<Vec<Scenario>> {
    Ok(vec![
        real_scenario()?,
        optimistic_scenario()?,
        pessimistic_scenario()?,
    ])
}

/// 敏感度分析預設的預算倍率（±20%）
pub fn default_budget_factors() -> Vec<Decimal> {
    vec![
        Decimal::new(8, 1),
        Decimal::new(9, 1),
        Decimal::ONE,
        Decimal::new(11, 1),
        Decimal::new(12, 1),
    ]
}
