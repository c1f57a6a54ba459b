//! 求解器配置

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 求解器參數配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// 分支定界最多探索的節點數（None 表示不限制）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<u64>,

    /// 求解時間上限（毫秒，None 表示不限制）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,

    /// 各手術類型的數量上限（手術類型ID → 上限）
    ///
    /// 參考模型沒有單項上限；用於病人數有限的情境。
    pub max_quantity: BTreeMap<String, u32>,

    /// 是否以貪婪解作為分支定界的初始下界
    pub warm_start: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_nodes: None,
            time_limit_ms: None,
            max_quantity: BTreeMap::new(),
            warm_start: true,
        }
    }
}

impl SolverConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置節點上限
    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// 建構器模式：設置時間上限
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// 建構器模式：設置單一手術類型的數量上限
    pub fn with_max_quantity(mut self, procedure_id: impl Into<String>, max: u32) -> Self {
        self.max_quantity.insert(procedure_id.into(), max);
        self
    }

    /// 建構器模式：設置是否使用貪婪解暖啟動
    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// 取得某手術類型的數量上限
    pub fn quantity_cap(&self, procedure_id: &str) -> Option<u32> {
        self.max_quantity.get(procedure_id).copied()
    }
}
