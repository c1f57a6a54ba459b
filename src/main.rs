use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use surgery_alloc::report::{
    render_catalog, render_json, render_method_comparison, render_outcome,
    render_scenario_comparison, render_sensitivity,
};
use surgery_alloc::settings::Settings;
use surgery_alloc::{load_catalog, logging, write_csv};
use surgery_analysis::{budget_sensitivity, compare_methods, compare_scenarios, ScenarioRunner};
use surgery_core::reference::oncology_catalog;
use surgery_core::{Catalog, ObjectiveCriterion, SolveMethod, SolveStatus, SolverConfig};
use surgery_optimizer::Allocator;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Exact,
    Greedy,
    Milp,
}

impl From<MethodArg> for SolveMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Exact => SolveMethod::Exact,
            MethodArg::Greedy => SolveMethod::Greedy,
            MethodArg::Milp => SolveMethod::Milp,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "surgery-alloc",
    version,
    about = "Allocate surgical procedures against budget, operating-room hours and ICU beds"
)]
struct Cli {
    /// 目錄檔（.csv / .json），覆寫設定檔中的 catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// 設定檔（預設為目前目錄的 surgery-alloc.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

/// 分支定界的預算與暖啟動
#[derive(Debug, clap::Args, Clone, Default)]
struct SearchArgs {
    #[arg(long = "max-nodes")]
    max_nodes: Option<u64>,
    #[arg(long = "time-limit-ms")]
    time_limit_ms: Option<u64>,
    /// 不以貪婪解暖啟動分支定界
    #[arg(long = "no-warm-start")]
    no_warm_start: bool,
}

impl SearchArgs {
    /// 以命令列參數覆寫設定檔中的求解配置
    fn config(&self, settings: &Settings) -> SolverConfig {
        let mut config = settings.solver.clone();
        if let Some(max_nodes) = self.max_nodes {
            config = config.with_max_nodes(max_nodes);
        }
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        if self.no_warm_start {
            config = config.with_warm_start(false);
        }
        config
    }
}

#[derive(Debug, clap::Args, Clone, Default)]
struct SolverArgs {
    /// 求解方法（預設取設定檔）
    #[arg(long, value_enum)]
    method: Option<MethodArg>,
    #[command(flatten)]
    search: SearchArgs,
}

impl SolverArgs {
    fn apply(&self, settings: &Settings) -> Allocator {
        let method = self.method.map(SolveMethod::from).unwrap_or(settings.method);
        Allocator::for_method(method).with_config(self.search.config(settings))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 列出手術目錄
    Catalog {
        /// 另存為 CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// 求解單一情境
    Solve {
        /// 情境名稱（預設為第一個情境）
        #[arg(short, long)]
        scenario: Option<String>,
        #[arg(long)]
        budget: Option<Decimal>,
        #[arg(long = "room-hours")]
        room_hours: Option<Decimal>,
        #[arg(long = "icu-beds")]
        icu_beds: Option<u32>,
        /// severity / incidence / cost-efficiency
        #[arg(long)]
        criterion: Option<ObjectiveCriterion>,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// 平行求解所有情境並比較
    Scenarios {
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// 比較精確解與貪婪近似
    Compare {
        #[arg(short, long)]
        scenario: Option<String>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// 預算敏感度分析
    Sensitivity {
        #[arg(short, long)]
        scenario: Option<String>,
        /// 預算倍率（逗號分隔），預設取設定檔
        #[arg(long, value_delimiter = ',')]
        factors: Vec<Decimal>,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// 設定檔管理
    Config {
        /// 寫出設定檔範本
        #[arg(long)]
        init: bool,
        /// 覆寫既有設定檔
        #[arg(long)]
        force: bool,
        /// 顯示生效的設定
        #[arg(long)]
        show: bool,
    },
}

fn main() -> ExitCode {
    logging::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Config { init, force, show } => {
            if *init {
                let path = cli.config.clone().unwrap_or_else(Settings::default_path);
                Settings::write_template(&path, *force)?;
                info!("已寫出設定檔範本: {}", path.display());
            }
            if *show || !*init {
                print!("{}", settings.to_toml()?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Catalog { export } => {
            let catalog = resolve_catalog(&cli, &settings)?;
            if let Some(path) = export {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("無法建立檔案: {}", path.display()))?;
                write_csv(&catalog, file)?;
                info!("已匯出目錄: {}", path.display());
            }
            match cli.output {
                OutputFormat::Table => println!("{}", render_catalog(&catalog)),
                OutputFormat::Json => println!("{}", render_json(&catalog)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Solve {
            scenario,
            budget,
            room_hours,
            icu_beds,
            criterion,
            solver,
        } => {
            let catalog = resolve_catalog(&cli, &settings)?;
            let mut scenario = settings.scenario(scenario.as_deref())?;
            if let Some(budget) = budget {
                scenario.envelope = scenario.envelope.with_budget(*budget)?;
            }
            if let Some(room_hours) = room_hours {
                scenario.envelope = scenario.envelope.with_room_hours(*room_hours)?;
            }
            if let Some(icu_beds) = icu_beds {
                scenario.envelope = scenario.envelope.with_icu_beds(*icu_beds);
            }
            if let Some(criterion) = criterion {
                scenario = scenario.with_criterion(*criterion);
            }

            let allocator = solver.apply(&settings);
            let outcome = allocator.allocate(&catalog, &scenario.envelope, scenario.criterion)?;
            match cli.output {
                OutputFormat::Table => {
                    print!("{}", render_outcome(&scenario.name, &outcome, &scenario.envelope))
                }
                OutputFormat::Json => println!("{}", render_json(&outcome)?),
            }
            Ok(exit_code(outcome.status()))
        }
        Commands::Scenarios { solver } => {
            let catalog = resolve_catalog(&cli, &settings)?;
            let scenarios = settings.scenarios()?;
            let runner = ScenarioRunner::new(solver.apply(&settings));
            let results = runner.run_all(&catalog, &scenarios)?;

            match cli.output {
                OutputFormat::Table => {
                    for result in &results {
                        print!(
                            "{}",
                            render_outcome(
                                &result.scenario.name,
                                &result.outcome,
                                &result.scenario.envelope
                            )
                        );
                        println!();
                    }
                    println!("{}", render_scenario_comparison(&compare_scenarios(&results)));
                }
                OutputFormat::Json => println!("{}", render_json(&results)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare { scenario, search } => {
            let catalog = resolve_catalog(&cli, &settings)?;
            let scenario = settings.scenario(scenario.as_deref())?;
            let comparison = compare_methods(&catalog, &scenario, &search.config(&settings))?;

            match cli.output {
                OutputFormat::Table => print!("{}", render_method_comparison(&comparison)),
                OutputFormat::Json => println!("{}", render_json(&comparison)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sensitivity {
            scenario,
            factors,
            solver,
        } => {
            let catalog = resolve_catalog(&cli, &settings)?;
            let scenario = settings.scenario(scenario.as_deref())?;
            let factors = if factors.is_empty() {
                settings.budget_factors.clone()
            } else {
                factors.clone()
            };
            let points = budget_sensitivity(&solver.apply(&settings), &catalog, &scenario, &factors)?;

            match cli.output {
                OutputFormat::Table => {
                    println!("== {} ==", scenario.name);
                    println!("{}", render_sensitivity(&points));
                }
                OutputFormat::Json => println!("{}", render_json(&points)?),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 命令列 > 設定檔 > 內建參考目錄
fn resolve_catalog(cli: &Cli, settings: &Settings) -> Result<Catalog> {
    match cli.catalog.as_ref().or(settings.catalog.as_ref()) {
        Some(path) => load_catalog(path),
        None => Ok(oncology_catalog()?),
    }
}

fn exit_code(status: SolveStatus) -> ExitCode {
    match status {
        SolveStatus::Optimal | SolveStatus::Approximate => ExitCode::SUCCESS,
        SolveStatus::TimedOut => ExitCode::from(2),
        SolveStatus::Infeasible | SolveStatus::Unbounded => ExitCode::from(3),
    }
}
