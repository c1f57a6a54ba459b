//! # Surgery Core
//!
//! 核心資料模型與類型定義：手術目錄、資源上限、目標準則與分配結果

pub mod allocation;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod objective;
pub mod procedure;
pub mod reference;
pub mod scenario;

// Re-export 主要類型
pub use allocation::{
    Allocation, AllocationLine, AllocationTotals, ResourceUtilization, SolveMethod, SolveOutcome,
    SolveStats, SolveStatus,
};
pub use catalog::Catalog;
pub use config::SolverConfig;
pub use envelope::{ResourceEnvelope, ResourceKind};
pub use objective::{ObjectiveCriterion, COST_EFFICIENCY_SCALE};
pub use procedure::{ProcedureRecord, ProcedureType};
pub use scenario::Scenario;

/// 手術分配錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocError {
    #[error("目錄資料驗證失敗（第 {row} 筆，欄位 `{field}` = {value:?}）: {reason}")]
    Validation {
        row: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("無效的資源上限: `{field}` = {value}")]
    InvalidEnvelope { field: &'static str, value: String },

    #[error("找不到手術類型: {0}")]
    NotFound(String),

    #[error("手術目錄為空，無法求解")]
    EmptyCatalog,

    #[error("求解器錯誤: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, AllocError>;
