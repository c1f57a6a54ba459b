//! 情境模型（一組資源上限加上目標準則）

use serde::{Deserialize, Serialize};

use crate::envelope::ResourceEnvelope;
use crate::objective::ObjectiveCriterion;

/// 資源情境
///
/// 純設定值：每次求解時傳入分配器，不持有任何共享狀態。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 情境名稱（如 REAL）
    pub name: String,

    /// 說明文字
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 資源上限
    #[serde(flatten)]
    pub envelope: ResourceEnvelope,

    /// 目標準則
    pub criterion: ObjectiveCriterion,
}

impl Scenario {
    /// 創建新的情境
    pub fn new(
        name: impl Into<String>,
        envelope: ResourceEnvelope,
        criterion: ObjectiveCriterion,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            envelope,
            criterion,
        }
    }

    /// 建構器模式：設置說明
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 建構器模式：替換目標準則
    pub fn with_criterion(mut self, criterion: ObjectiveCriterion) -> Self {
        self.criterion = criterion;
        self
    }
}
