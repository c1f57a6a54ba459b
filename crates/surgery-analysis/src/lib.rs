//! # Surgery Analysis
//!
//! 情境分析：多情境平行求解、情境比較、方法比較與預算敏感度

pub mod comparison;
pub mod runner;
pub mod sensitivity;

// Re-export 主要類型
pub use comparison::{compare_methods, compare_scenarios, MethodComparison, ScenarioComparison};
pub use runner::{ScenarioResult, ScenarioRunner};
pub use sensitivity::{budget_sensitivity, SensitivityPoint};
