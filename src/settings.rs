//! 設定檔（TOML）

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surgery_core::reference::{default_budget_factors, reference_scenarios};
use surgery_core::{Scenario, SolveMethod, SolverConfig};

/// 預設設定檔名稱（目前目錄）
pub const DEFAULT_SETTINGS_FILE: &str = "surgery-alloc.toml";

/// 應用程式設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// 目錄檔路徑（未設定時使用內建參考目錄）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// 預設求解方法
    #[serde(default = "default_method")]
    pub method: SolveMethod,

    /// 敏感度分析的預算倍率
    #[serde(default = "default_budget_factors")]
    pub budget_factors: Vec<Decimal>,

    #[serde(default)]
    pub solver: SolverConfig,

    /// 情境列表（空白時使用三個參考情境）
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

fn default_method() -> SolveMethod {
    SolveMethod::Exact
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            method: default_method(),
            budget_factors: default_budget_factors(),
            solver: SolverConfig::default(),
            scenarios: Vec::new(),
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_SETTINGS_FILE)
    }

    /// 載入設定
    ///
    /// 明確指定的路徑必須存在；未指定時讀取預設檔，不存在則使用預設值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("找不到設定檔: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let data = fs::read_to_string(&path)
            .with_context(|| format!("無法讀取設定檔: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("無法解析 TOML 設定檔: {}", path.display()))?;
        tracing::debug!("載入設定檔 {}", path.display());
        Ok(parsed)
    }

    /// 生效的情境列表
    pub fn scenarios(&self) -> Result<Vec<Scenario>> {
        if self.scenarios.is_empty() {
            return Ok(reference_scenarios()?);
        }
        Ok(self.scenarios.clone())
    }

    /// 依名稱查找情境（不分大小寫），未指定時取第一個
    pub fn scenario(&self, name: Option<&str>) -> Result<Scenario> {
        let scenarios = self.scenarios()?;
        let found = match name {
            Some(name) => scenarios
                .into_iter()
                .find(|s| s.name.eq_ignore_ascii_case(name)),
            None => scenarios.into_iter().next(),
        };
        found.with_context(|| format!("找不到情境: {}", name.unwrap_or("<first>")))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 寫出設定檔範本；已存在時需 `force`
    pub fn write_template(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("設定檔已存在: {}（使用 --force 覆寫）", path.display());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("無法建立目錄: {}", parent.display()))?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("無法寫入設定檔範本: {}", path.display()))
    }

    pub fn default_template() -> String {
        r#"# surgery-alloc 設定檔

# 目錄檔（.csv 或 .json）；註解掉時使用內建的八種腫瘤手術
# catalog = "procedures.csv"

# 預設求解方法：exact / greedy / milp
method = "exact"

# 敏感度分析的預算倍率
budget_factors = ["0.8", "0.9", "1.0", "1.1", "1.2"]

[solver]
# max_nodes = 100000
# time_limit_ms = 5000
warm_start = true

# 各手術類型的數量上限
[solver.max_quantity]
# P5 = 4

[[scenarios]]
name = "REAL"
description = "Current capacity of the regional oncology centre"
budget = 500000
room_hours = 480
icu_beds = 15
criterion = "incidence"

[[scenarios]]
name = "OPTIMISTIC"
description = "Additional investment"
budget = 800000
room_hours = 720
icu_beds = 25
criterion = "severity"

[[scenarios]]
name = "PESSIMISTIC"
description = "Budget cut"
budget = 300000
room_hours = 320
icu_beds = 8
criterion = "severity"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surgery_core::ObjectiveCriterion;
    use tempfile::tempdir;

    #[test]
    fn test_template_matches_reference_scenarios() {
        let settings: Settings = toml::from_str(&Settings::default_template()).unwrap();

        assert_eq!(settings.method, SolveMethod::Exact);
        assert_eq!(settings.budget_factors, default_budget_factors());
        assert!(settings.solver.warm_start);
        assert!(settings.solver.max_quantity.is_empty());
        assert_eq!(settings.scenarios, reference_scenarios().unwrap());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(Settings::load(Some(missing.as_path())).is_err());
        assert_eq!(Settings::default().scenarios().unwrap().len(), 3);
    }

    #[test]
    fn test_negative_capacity_rejected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(
            &path,
            r#"
[[scenarios]]
name = "BROKEN"
budget = -1
room_hours = 10
icu_beds = 1
criterion = "severity"
"#,
        )
        .unwrap();

        let err = Settings::load(Some(path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("budget"));
    }

    #[test]
    fn test_write_template_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("surgery-alloc.toml");

        Settings::write_template(&path, false).unwrap();
        assert!(Settings::write_template(&path, false).is_err());
        Settings::write_template(&path, true).unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        let real = settings.scenario(Some("real")).unwrap();
        assert_eq!(real.criterion, ObjectiveCriterion::Incidence);
        assert_eq!(real.envelope.icu_beds(), 15);
    }

    #[test]
    fn test_toml_output_loads_back() {
        let mut settings = Settings::default();
        settings.scenarios = reference_scenarios().unwrap();
        settings.solver = SolverConfig::new().with_max_nodes(500).with_max_quantity("P5", 4);

        let reloaded: Settings = toml::from_str(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(reloaded, settings);
    }
}
