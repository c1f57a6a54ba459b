//! 手術目錄匯入與匯出（CSV / JSON）

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use surgery_core::{Catalog, ProcedureRecord};

/// 依副檔名讀取目錄檔（`.csv` 或 `.json`）
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let file = File::open(path)
        .with_context(|| format!("無法開啟目錄檔: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let records = match extension.as_deref() {
        Some("csv") => read_csv(file),
        Some("json") => read_json(file),
        _ => bail!("不支援的目錄檔格式（僅接受 .csv / .json）: {}", path.display()),
    }
    .with_context(|| format!("無法解析目錄檔: {}", path.display()))?;

    let catalog = Catalog::load(records)
        .with_context(|| format!("目錄資料驗證失敗: {}", path.display()))?;
    tracing::info!("載入手術目錄 {}：{} 種", path.display(), catalog.len());
    Ok(catalog)
}

/// 讀取 CSV 記錄
///
/// 標頭需包含 id, name, severity, duration_hours, unit_cost, requires_icu,
/// incidence_rate；欄位前後空白會被去除，空欄位視為缺值。
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ProcedureRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    reader
        .deserialize::<ProcedureRecord>()
        .enumerate()
        .map(|(row, record)| record.with_context(|| format!("第 {} 筆 CSV 記錄格式錯誤", row)))
        .collect()
}

/// 讀取 JSON 記錄陣列
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ProcedureRecord>> {
    serde_json::from_reader(reader).context("JSON 目錄必須是記錄陣列")
}

/// 將目錄寫成 CSV
pub fn write_csv<W: Write>(catalog: &Catalog, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    for record in catalog.to_records() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use surgery_core::reference::oncology_catalog;

    const CSV: &str = "\
id, name, severity, duration_hours, unit_cost, requires_icu, incidence_rate
P1, Mastectomy, 8.5, 3.5, 15000, 1, 3.62
P7, Thyroidectomy, 6.5, 2.5, 12000, nao, 4.80
";

    #[test]
    fn test_read_csv_trims_fields() {
        let records = read_csv(CSV.as_bytes()).unwrap();
        let catalog = Catalog::load(records).unwrap();

        assert_eq!(catalog.len(), 2);
        let p7 = catalog.get("P7").unwrap();
        assert_eq!(p7.name, "Thyroidectomy");
        assert!(!p7.requires_icu);
        assert_eq!(p7.incidence_rate, Decimal::new(48, 1));
    }

    #[test]
    fn test_missing_field_reports_row() {
        let csv = "\
id,name,severity,duration_hours,unit_cost,requires_icu,incidence_rate
P1,Mastectomy,8.5,3.5,15000,1,3.62
P2,Prostatectomy,7.8,,18000,1,10.01
";
        let records = read_csv(csv.as_bytes()).unwrap();
        let err = Catalog::load(records).unwrap_err();

        assert_eq!(
            err,
            surgery_core::AllocError::Validation {
                row: 1,
                field: "duration_hours",
                value: String::new(),
                reason: "缺少必要欄位".to_string(),
            }
        );
    }

    #[test]
    fn test_read_json_accepts_numbers_and_booleans() {
        let json = r#"[
            {"id": "P1", "name": "Mastectomy", "severity": 8.5, "duration_hours": "3.5",
             "unit_cost": 15000, "requires_icu": true, "incidence_rate": 3.62}
        ]"#;
        let catalog = Catalog::load(read_json(json.as_bytes()).unwrap()).unwrap();

        let p1 = catalog.get("P1").unwrap();
        assert!(p1.requires_icu);
        assert_eq!(p1.unit_cost, Decimal::from(15000));
    }

    #[test]
    fn test_written_csv_loads_back() {
        let catalog = oncology_catalog().unwrap();
        let mut buffer = Vec::new();
        write_csv(&catalog, &mut buffer).unwrap();

        let reloaded = Catalog::load(read_csv(buffer.as_slice()).unwrap()).unwrap();
        assert_eq!(reloaded, catalog);
    }
}
