use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

use crate::optimize::{Optimization, ResourceReport};

/// Commitments print as given ("5", "1.5").
fn format_quantity(q: f64) -> String {
    q.to_string()
}

fn format_cost(cost: f64) -> String {
    format!("{:.2}", cost)
}

fn new_table(colors: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if !colors {
        table.force_no_tty();
    }
    table
}

fn report_table(report: &ResourceReport, colors: bool) -> Table {
    let mut table = new_table(colors);
    table.set_header(vec![Cell::new("QTY"), Cell::new(report.label)]);

    for (i, (commit, cost)) in report.candidates.iter().zip(&report.costs).enumerate() {
        let mut qty = Cell::new(format_quantity(*commit));
        let mut price = Cell::new(format_cost(*cost));
        if i == report.min_index {
            qty = qty.fg(Color::Green);
            price = price.fg(Color::Green);
        }
        table.add_row(vec![qty, price]);
    }

    table
}

pub fn print_table(result: &Optimization, colors: bool) {
    for report in &result.reports {
        println!("\n{}", report_table(report, colors));
    }

    let mut summary = new_table(colors);
    summary.set_header(vec!["Service", "Commit", "Total Cost ($)"]);
    for rec in result.recommendations() {
        summary.add_row(vec![
            rec.label.to_string(),
            format!("{:.0}", rec.commitment),
            format_cost(rec.total_cost),
        ]);
    }

    println!("\n{} ({} records)", result.period, result.records);
    println!("{summary}");
}

fn json_report(result: &Optimization) -> serde_json::Value {
    serde_json::json!({
        "period": result.period,
        "records": result.records,
        "first_timestamp": result.first_timestamp,
        "last_timestamp": result.last_timestamp,
        "scale": result.scale,
        "resources": result.reports,
        "summary": result.recommendations(),
    })
}

pub fn print_json(result: &Optimization) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&json_report(result))?);
    Ok(())
}
