//! 報表輸出（終端表格與 JSON）

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use surgery_analysis::{MethodComparison, ScenarioComparison, SensitivityPoint};
use surgery_core::{
    Allocation, Catalog, ResourceEnvelope, ResourceKind, SolveOutcome, SolveStatus,
};

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn status_cell(status: SolveStatus) -> Cell {
    let color = match status {
        SolveStatus::Optimal => Color::Green,
        SolveStatus::Approximate | SolveStatus::TimedOut => Color::Yellow,
        SolveStatus::Infeasible | SolveStatus::Unbounded => Color::Red,
    };
    Cell::new(status.to_string()).fg(color)
}

fn value_text(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "-".to_string())
}

fn pct_text(pct: Option<f64>) -> String {
    pct.map(|p| format!("{p:.1}%"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let mut table = new_table(vec![
        "ID",
        "Procedure",
        "Severity",
        "Hours",
        "Unit Cost",
        "ICU",
        "Incidence",
    ]);
    for p in catalog {
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(&p.name),
            right(p.severity),
            right(p.duration_hours),
            right(p.unit_cost),
            Cell::new(if p.requires_icu { "yes" } else { "no" }),
            right(p.incidence_rate),
        ]);
    }
    table.to_string()
}

/// 單一求解結果：明細表加上資源使用摘要
pub fn render_outcome(title: &str, outcome: &SolveOutcome, envelope: &ResourceEnvelope) -> String {
    let mut out = format!("== {title} [{}] ==\n", outcome.status());

    match outcome {
        SolveOutcome::Infeasible { message } | SolveOutcome::Unbounded { message } => {
            out.push_str(message);
            out.push('\n');
        }
        SolveOutcome::TimedOut {
            best_known,
            nodes_explored,
        } => {
            out.push_str(&format!("超出求解預算（已探索 {nodes_explored} 個節點）\n"));
            if let Some(allocation) = best_known {
                out.push_str("目前最佳的可行解（未證明最佳）:\n");
                out.push_str(&render_allocation(allocation, envelope));
            }
        }
        SolveOutcome::Optimal(allocation) | SolveOutcome::Approximate(allocation) => {
            out.push_str(&render_allocation(allocation, envelope));
        }
    }
    out
}

pub fn render_allocation(allocation: &Allocation, envelope: &ResourceEnvelope) -> String {
    let mut lines = new_table(vec![
        "ID", "Procedure", "Qty", "Weight", "Value", "Cost", "Hours", "ICU",
    ]);
    for line in allocation.nonzero_lines() {
        lines.add_row(vec![
            Cell::new(&line.procedure_id),
            Cell::new(&line.name),
            right(line.quantity),
            right(format!("{:.4}", line.unit_weight)),
            right(format!("{:.4}", line.value)),
            right(line.cost),
            right(line.hours),
            right(line.icu_units),
        ]);
    }

    let mut usage = new_table(vec!["Resource", "Used", "Capacity", "Utilization"]);
    for kind in ResourceKind::ALL {
        usage.add_row(vec![
            Cell::new(kind.as_str()),
            right(allocation.totals.usage(kind)),
            right(envelope.capacity(kind)),
            right(pct_text(allocation.utilization.get(kind))),
        ]);
    }

    format!(
        "{lines}\n{usage}\n準則: {}  方法: {}  手術總數: {}  目標值: {:.4}  節點: {}  耗時: {} ms\n",
        allocation.criterion,
        allocation.method,
        allocation.totals.total_procedures,
        allocation.totals.total_value,
        allocation.stats.nodes_explored,
        allocation.stats.elapsed_ms,
    )
}

pub fn render_scenario_comparison(rows: &[ScenarioComparison]) -> String {
    let mut table = new_table(vec![
        "Scenario",
        "Criterion",
        "Status",
        "Procedures",
        "Cost",
        "Hours",
        "ICU",
        "Value",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.scenario),
            Cell::new(row.criterion.to_string()),
            status_cell(row.status),
            right(row.procedures),
            right(row.cost),
            right(row.hours),
            right(row.icu_units),
            right(value_text(row.value)),
        ]);
    }
    table.to_string()
}

pub fn render_method_comparison(comparison: &MethodComparison) -> String {
    let mut table = new_table(vec!["Method", "Status", "Procedures", "Value"]);
    for outcome in [&comparison.exact, &comparison.greedy] {
        let allocation = outcome.allocation();
        table.add_row(vec![
            Cell::new(allocation.map_or("-".to_string(), |a| a.method.to_string())),
            status_cell(outcome.status()),
            right(allocation.map_or(0, |a| a.totals.total_procedures)),
            right(value_text(outcome.objective_value())),
        ]);
    }

    format!(
        "== {} ==\n{table}\n差距: {}  ({})\n",
        comparison.scenario,
        value_text(comparison.gap),
        pct_text(comparison.gap_pct),
    )
}

pub fn render_sensitivity(points: &[SensitivityPoint]) -> String {
    let mut table = new_table(vec!["Factor", "Budget", "Status", "Procedures", "Value"]);
    for point in points {
        table.add_row(vec![
            right(format!("{}×", point.factor)),
            right(point.budget),
            status_cell(point.status),
            right(point.procedures),
            right(value_text(point.value)),
        ]);
    }
    table.to_string()
}
