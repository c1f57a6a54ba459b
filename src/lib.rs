//! # Surgery Alloc
//!
//! 手術資源分配決策工具：目錄匯入、設定檔、報表輸出與日誌初始化

pub mod ingest;
pub mod logging;
pub mod report;
pub mod settings;

// Re-export 主要類型
pub use ingest::{load_catalog, read_csv, read_json, write_csv};
pub use settings::Settings;
