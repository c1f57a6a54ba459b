//! 集成測試

use std::fs;

use rstest::rstest;
use rust_decimal::Decimal;
use surgery_alloc::settings::Settings;
use surgery_alloc::{load_catalog, logging, write_csv};
use surgery_analysis::{budget_sensitivity, compare_methods, compare_scenarios, ScenarioRunner};
use surgery_core::reference::oncology_catalog;
use surgery_core::{ObjectiveCriterion, ResourceKind, SolveMethod, SolveStatus};
use surgery_optimizer::Allocator;
use tempfile::tempdir;

#[test]
fn test_csv_catalog_through_all_scenarios() {
    logging::init_test();

    // 1. 匯出參考目錄到 CSV 再讀回
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("procedures.csv");
    write_csv(&oncology_catalog().unwrap(), fs::File::create(&csv_path).unwrap()).unwrap();
    let catalog = load_catalog(&csv_path).unwrap();
    assert_eq!(catalog.len(), 8);

    // 2. 設定檔範本提供三個情境
    let settings_path = dir.path().join("surgery-alloc.toml");
    Settings::write_template(&settings_path, false).unwrap();
    let settings = Settings::load(Some(settings_path.as_path())).unwrap();
    let scenarios = settings.scenarios().unwrap();

    // 3. 平行求解
    let results = ScenarioRunner::new(Allocator::for_method(settings.method))
        .run_all(&catalog, &scenarios)
        .unwrap();
    let rows = compare_scenarios(&results);

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.status == SolveStatus::Optimal));
    // 樂觀情境資源較多，目標值高於悲觀情境（同為嚴重度準則）
    let optimistic = rows.iter().find(|r| r.scenario == "OPTIMISTIC").unwrap();
    let pessimistic = rows.iter().find(|r| r.scenario == "PESSIMISTIC").unwrap();
    assert!(optimistic.value.unwrap() > pessimistic.value.unwrap());
}

#[test]
fn test_json_catalog_with_icu_outage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("icu_only.json");
    fs::write(
        &path,
        r#"[
            {"id": "A", "name": "Alpha", "severity": 9, "duration_hours": 2,
             "unit_cost": 1000, "requires_icu": "sim", "incidence_rate": 1},
            {"id": "B", "name": "Beta", "severity": 7, "duration_hours": 1,
             "unit_cost": 500, "requires_icu": 1, "incidence_rate": 2}
        ]"#,
    )
    .unwrap();
    let catalog = load_catalog(&path).unwrap();

    let settings: Settings = toml::from_str(
        r#"
[[scenarios]]
name = "ICU_OUTAGE"
budget = 100000
room_hours = 100
icu_beds = 0
criterion = "gravidade"
"#,
    )
    .unwrap();
    let scenario = settings.scenario(Some("icu_outage")).unwrap();
    assert_eq!(scenario.criterion, ObjectiveCriterion::Severity);

    let outcome = Allocator::exact()
        .allocate(&catalog, &scenario.envelope, scenario.criterion)
        .unwrap();
    assert_eq!(outcome.status(), SolveStatus::Optimal);
    assert_eq!(outcome.objective_value(), Some(0.0));
    let allocation = outcome.allocation().unwrap();
    assert_eq!(allocation.utilization.get(ResourceKind::IcuBeds), None);
}

#[test]
fn test_unsupported_catalog_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("procedures.xlsx");
    fs::write(&path, "irrelevant").unwrap();

    let err = load_catalog(&path).unwrap_err();
    assert!(format!("{err:#}").contains(".xlsx"));
}

#[rstest]
#[case(ObjectiveCriterion::Severity)]
#[case(ObjectiveCriterion::Incidence)]
#[case(ObjectiveCriterion::CostEfficiency)]
fn test_methods_agree_for_every_criterion(#[case] criterion: ObjectiveCriterion) {
    let catalog = oncology_catalog().unwrap();
    let settings = Settings::default();
    let scenario = settings
        .scenario(Some("PESSIMISTIC"))
        .unwrap()
        .with_criterion(criterion);

    let comparison = compare_methods(&catalog, &scenario, &settings.solver).unwrap();
    assert!(comparison.gap.unwrap() >= -1e-9);

    let milp = Allocator::milp()
        .allocate(&catalog, &scenario.envelope, criterion)
        .unwrap();
    assert_eq!(milp.allocation().unwrap().method, SolveMethod::Milp);
    let exact = comparison.exact_value.unwrap();
    let backend = milp.objective_value().unwrap();
    assert!((exact - backend).abs() <= 1e-6 * exact.max(1.0));
}

#[test]
fn test_sensitivity_from_settings_factors() {
    let catalog = oncology_catalog().unwrap();
    let settings = Settings::default();
    let base = settings.scenario(None).unwrap();

    let points = budget_sensitivity(
        &Allocator::exact(),
        &catalog,
        &base,
        &settings.budget_factors,
    )
    .unwrap();

    assert_eq!(points.len(), settings.budget_factors.len());
    assert_eq!(points[4].budget, Decimal::from(600_000));
    assert!(points.iter().all(|p| p.status == SolveStatus::Optimal));
}
