//! 資源上限（單一情境的容量限制）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AllocError, Result};

/// 受限資源種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// 預算
    Budget,
    /// 手術室時數
    RoomHours,
    /// ICU 床位
    IcuBeds,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Budget,
        ResourceKind::RoomHours,
        ResourceKind::IcuBeds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Budget => "budget",
            ResourceKind::RoomHours => "room_hours",
            ResourceKind::IcuBeds => "icu_beds",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 資源上限
///
/// 三個容量皆為非負值；負值在建構時即被拒絕，不會進入求解器。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct ResourceEnvelope {
    budget: Decimal,
    room_hours: Decimal,
    icu_beds: u32,
}

#[derive(Deserialize)]
struct RawEnvelope {
    budget: Decimal,
    room_hours: Decimal,
    icu_beds: i64,
}

impl TryFrom<RawEnvelope> for ResourceEnvelope {
    type Error = AllocError;

    fn try_from(raw: RawEnvelope) -> Result<Self> {
        Self::new(raw.budget, raw.room_hours, raw.icu_beds)
    }
}

impl ResourceEnvelope {
    /// 創建並驗證資源上限
    pub fn new(budget: Decimal, room_hours: Decimal, icu_beds: i64) -> Result<Self> {
        check_non_negative("budget", budget)?;
        check_non_negative("room_hours", room_hours)?;
        let icu_beds = u32::try_from(icu_beds).map_err(|_| AllocError::InvalidEnvelope {
            field: "icu_beds",
            value: icu_beds.to_string(),
        })?;

        Ok(Self {
            budget,
            room_hours,
            icu_beds,
        })
    }

    /// 建構器模式：替換預算（敏感度分析用）
    pub fn with_budget(self, budget: Decimal) -> Result<Self> {
        check_non_negative("budget", budget)?;
        Ok(Self { budget, ..self })
    }

    /// 建構器模式：替換手術室時數
    pub fn with_room_hours(self, room_hours: Decimal) -> Result<Self> {
        check_non_negative("room_hours", room_hours)?;
        Ok(Self { room_hours, ..self })
    }

    /// 建構器模式：替換 ICU 床位數
    pub fn with_icu_beds(self, icu_beds: u32) -> Self {
        Self { icu_beds, ..self }
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    pub fn room_hours(&self) -> Decimal {
        self.room_hours
    }

    pub fn icu_beds(&self) -> u32 {
        self.icu_beds
    }

    /// 依資源種類取得容量
    pub fn capacity(&self, kind: ResourceKind) -> Decimal {
        match kind {
            ResourceKind::Budget => self.budget,
            ResourceKind::RoomHours => self.room_hours,
            ResourceKind::IcuBeds => Decimal::from(self.icu_beds),
        }
    }
}

fn check_non_negative(field: &'static str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(AllocError::InvalidEnvelope {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_envelope() {
        let envelope =
            ResourceEnvelope::new(Decimal::from(500_000), Decimal::from(480), 15).unwrap();

        assert_eq!(envelope.budget(), Decimal::from(500_000));
        assert_eq!(envelope.room_hours(), Decimal::from(480));
        assert_eq!(envelope.icu_beds(), 15);
        assert_eq!(envelope.capacity(ResourceKind::IcuBeds), Decimal::from(15));
    }

    #[test]
    fn test_zero_capacities_are_valid() {
        assert!(ResourceEnvelope::new(Decimal::ZERO, Decimal::ZERO, 0).is_ok());
    }

    #[test]
    fn test_negative_capacity_names_field() {
        let err = ResourceEnvelope::new(Decimal::from(-1), Decimal::from(480), 15).unwrap_err();
        assert_eq!(
            err,
            AllocError::InvalidEnvelope {
                field: "budget",
                value: "-1".to_string()
            }
        );

        let err = ResourceEnvelope::new(Decimal::ONE, Decimal::ONE, -3).unwrap_err();
        assert!(err.to_string().contains("icu_beds"));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_with_budget() {
        let envelope = ResourceEnvelope::new(Decimal::from(100), Decimal::from(10), 2).unwrap();
        let scaled = envelope.clone().with_budget(Decimal::from(120)).unwrap();

        assert_eq!(scaled.budget(), Decimal::from(120));
        assert_eq!(scaled.room_hours(), envelope.room_hours());
        assert!(envelope.with_budget(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ResourceEnvelope =
            serde_json::from_str(r#"{"budget": "300000", "room_hours": 320, "icu_beds": 8}"#)
                .unwrap();
        assert_eq!(ok.icu_beds(), 8);

        let bad = serde_json::from_str::<ResourceEnvelope>(
            r#"{"budget": 300000, "room_hours": -1, "icu_beds": 8}"#,
        );
        assert!(bad.is_err());
    }
}
