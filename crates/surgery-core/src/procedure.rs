//! 手術類型模型

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::{AllocError, Result};

/// 嚴重度上限
pub const MAX_SEVERITY: Decimal = Decimal::TEN;

/// 手術類型（目錄中的一列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureType {
    /// 手術類型ID（目錄內唯一）
    pub id: String,

    /// 顯示名稱
    pub name: String,

    /// 嚴重度（0-10）
    pub severity: Decimal,

    /// 平均手術時間（小時，> 0）
    pub duration_hours: Decimal,

    /// 單位成本（貨幣，> 0）
    pub unit_cost: Decimal,

    /// 術後是否需要 ICU 床位
    pub requires_icu: bool,

    /// 人口發生率（每十萬人，>= 0）
    pub incidence_rate: Decimal,
}

impl ProcedureType {
    /// 創建新的手術類型
    pub fn new(id: String, name: String, duration_hours: Decimal, unit_cost: Decimal) -> Self {
        Self {
            id,
            name,
            severity: Decimal::ZERO,
            duration_hours,
            unit_cost,
            requires_icu: false,
            incidence_rate: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置嚴重度
    pub fn with_severity(mut self, severity: Decimal) -> Self {
        self.severity = severity;
        self
    }

    /// 建構器模式：設置是否需要 ICU
    pub fn with_icu(mut self, requires_icu: bool) -> Self {
        self.requires_icu = requires_icu;
        self
    }

    /// 建構器模式：設置發生率
    pub fn with_incidence_rate(mut self, incidence_rate: Decimal) -> Self {
        self.incidence_rate = incidence_rate;
        self
    }

    /// ICU 需求係數（0 或 1）
    pub fn icu_units(&self) -> u32 {
        u32::from(self.requires_icu)
    }

    /// 檢查欄位是否在定義域內
    ///
    /// `row` 只用於錯誤訊息，指出出錯的是第幾筆資料。
    pub fn validate(&self, row: usize) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(invalid(row, "id", &self.id, "手術類型ID不可為空"));
        }
        if self.severity < Decimal::ZERO || self.severity > MAX_SEVERITY {
            return Err(invalid(
                row,
                "severity",
                &self.severity.to_string(),
                "嚴重度必須介於 0 與 10 之間",
            ));
        }
        if self.duration_hours <= Decimal::ZERO {
            return Err(invalid(
                row,
                "duration_hours",
                &self.duration_hours.to_string(),
                "手術時間必須大於 0",
            ));
        }
        if self.unit_cost <= Decimal::ZERO {
            return Err(invalid(
                row,
                "unit_cost",
                &self.unit_cost.to_string(),
                "單位成本必須大於 0",
            ));
        }
        if self.incidence_rate < Decimal::ZERO {
            return Err(invalid(
                row,
                "incidence_rate",
                &self.incidence_rate.to_string(),
                "發生率不可為負",
            ));
        }
        Ok(())
    }
}

/// 目錄匯入記錄
///
/// 外部資料集（CSV、JSON）映射進來的原始欄位，數值欄位保留為文字，
/// 轉換成 [`ProcedureType`] 時才解析與驗證，錯誤訊息可以指出原始值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub duration_hours: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub unit_cost: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub requires_icu: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub incidence_rate: Option<String>,
}

impl ProcedureRecord {
    /// 創建只含 ID 與名稱的記錄
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// 建構器模式：設置嚴重度文字
    pub fn with_severity(mut self, value: impl ToString) -> Self {
        self.severity = Some(value.to_string());
        self
    }

    /// 建構器模式：設置手術時間文字
    pub fn with_duration_hours(mut self, value: impl ToString) -> Self {
        self.duration_hours = Some(value.to_string());
        self
    }

    /// 建構器模式：設置單位成本文字
    pub fn with_unit_cost(mut self, value: impl ToString) -> Self {
        self.unit_cost = Some(value.to_string());
        self
    }

    /// 建構器模式：設置 ICU 需求文字
    pub fn with_requires_icu(mut self, value: impl ToString) -> Self {
        self.requires_icu = Some(value.to_string());
        self
    }

    /// 建構器模式：設置發生率文字
    pub fn with_incidence_rate(mut self, value: impl ToString) -> Self {
        self.incidence_rate = Some(value.to_string());
        self
    }

    /// 解析並驗證為手術類型
    pub fn into_procedure(self, row: usize) -> Result<ProcedureType> {
        let severity = parse_decimal(row, "severity", self.severity.as_deref())?;
        let duration_hours = parse_decimal(row, "duration_hours", self.duration_hours.as_deref())?;
        let unit_cost = parse_decimal(row, "unit_cost", self.unit_cost.as_deref())?;
        let requires_icu = parse_flag(row, "requires_icu", self.requires_icu.as_deref())?;
        let incidence_rate = parse_decimal(row, "incidence_rate", self.incidence_rate.as_deref())?;

        let procedure = ProcedureType {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            severity,
            duration_hours,
            unit_cost,
            requires_icu,
            incidence_rate,
        };
        procedure.validate(row)?;
        Ok(procedure)
    }
}

impl From<&ProcedureType> for ProcedureRecord {
    fn from(procedure: &ProcedureType) -> Self {
        ProcedureRecord::new(procedure.id.clone(), procedure.name.clone())
            .with_severity(procedure.severity)
            .with_duration_hours(procedure.duration_hours)
            .with_unit_cost(procedure.unit_cost)
            .with_requires_icu(procedure.icu_units())
            .with_incidence_rate(procedure.incidence_rate)
    }
}

fn invalid(row: usize, field: &'static str, value: &str, reason: &str) -> AllocError {
    AllocError::Validation {
        row,
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn required<'a>(row: usize, field: &'static str, raw: Option<&'a str>) -> Result<&'a str> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(invalid(row, field, "", "缺少必要欄位")),
    }
}

fn parse_decimal(row: usize, field: &'static str, raw: Option<&str>) -> Result<Decimal> {
    let text = required(row, field, raw)?;
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| invalid(row, field, text, "不是有效的數值"))
}

fn parse_flag(row: usize, field: &'static str, raw: Option<&str>) -> Result<bool> {
    let text = required(row, field, raw)?;
    match text.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" | "sim" | "s" => Ok(true),
        "0" | "0.0" | "false" | "no" | "n" | "nao" | "não" => Ok(false),
        _ => Err(invalid(row, field, text, "必須是 0/1 或 true/false")),
    }
}

/// 接受文字、數值或布林值，一律轉成文字
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mastectomy() -> ProcedureRecord {
        ProcedureRecord::new("P1", "Mastectomy")
            .with_severity("8.5")
            .with_duration_hours("3.5")
            .with_unit_cost("15000")
            .with_requires_icu("1")
            .with_incidence_rate("3.62")
    }

    #[test]
    fn test_record_into_procedure() {
        let procedure = mastectomy().into_procedure(0).unwrap();

        assert_eq!(procedure.id, "P1");
        assert_eq!(procedure.severity, Decimal::new(85, 1));
        assert_eq!(procedure.duration_hours, Decimal::new(35, 1));
        assert_eq!(procedure.unit_cost, Decimal::from(15000));
        assert!(procedure.requires_icu);
        assert_eq!(procedure.icu_units(), 1);
        assert_eq!(procedure.incidence_rate, Decimal::new(362, 2));
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case("Sim", true)]
    #[case("0", false)]
    #[case("no", false)]
    #[case("FALSE", false)]
    fn test_icu_flag_parsing(#[case] raw: &str, #[case] expected: bool) {
        let procedure = mastectomy().with_requires_icu(raw).into_procedure(0).unwrap();
        assert_eq!(procedure.requires_icu, expected);
    }

    #[rstest]
    #[case(mastectomy().with_severity("10.5"), "severity")]
    #[case(mastectomy().with_severity("-1"), "severity")]
    #[case(mastectomy().with_duration_hours("0"), "duration_hours")]
    #[case(mastectomy().with_unit_cost("-15000"), "unit_cost")]
    #[case(mastectomy().with_unit_cost("abc"), "unit_cost")]
    #[case(mastectomy().with_requires_icu("maybe"), "requires_icu")]
    #[case(mastectomy().with_incidence_rate("-0.1"), "incidence_rate")]
    fn test_rejects_out_of_domain(#[case] record: ProcedureRecord, #[case] expected: &str) {
        match record.into_procedure(3) {
            Err(AllocError::Validation { row, field, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(field, expected);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut record = mastectomy();
        record.unit_cost = None;

        let err = record.into_procedure(1).unwrap_err();
        assert!(err.to_string().contains("unit_cost"));
    }

    #[test]
    fn test_json_numbers_are_accepted() {
        let json = r#"{"id":"P7","name":"Thyroidectomy","severity":6.5,"duration_hours":2.5,
            "unit_cost":12000,"requires_icu":false,"incidence_rate":4.8}"#;
        let record: ProcedureRecord = serde_json::from_str(json).unwrap();
        let procedure = record.into_procedure(0).unwrap();

        assert_eq!(procedure.severity, Decimal::new(65, 1));
        assert_eq!(procedure.unit_cost, Decimal::from(12000));
        assert!(!procedure.requires_icu);
    }

    #[test]
    fn test_record_from_procedure() {
        let procedure = mastectomy().into_procedure(0).unwrap();
        let back = ProcedureRecord::from(&procedure).into_procedure(0).unwrap();
        assert_eq!(back, procedure);
    }
}
