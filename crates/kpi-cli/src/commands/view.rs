//! Read-only views: headline summary and the status matrix.

use anyhow::Result;
use kpi_model::MatrixRow;
use serde_json::json;

use crate::opts::{FilterArgs, KpiOpts};
use crate::output::print_success;
use crate::util::SessionCtx;

pub async fn cmd_summary(opts: &KpiOpts, args: &FilterArgs) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let summary = ctx.handle.summary(args.to_filter()).await?;
    let state = ctx.handle.state().await?;
    let notices = ctx.close().await?;

    let human = format!(
        "periods:        {}\nhospitals:      {}\ncontracts:      {}\nlate:           {}\nsent:           {}\nnot submitted:  {}\ncompliance:     {}%",
        state.db.period_count(),
        summary.hospitals,
        summary.contracts,
        summary.late,
        summary.sent,
        summary.not_submitted,
        summary.compliance_rate,
    );
    let mut data = serde_json::to_value(summary)?;
    data["periods"] = json!(state.db.period_count());
    data["initialized"] = json!(state.initialized);
    print_success(opts, data, Some(human), notices)
}

pub async fn cmd_matrix(opts: &KpiOpts, args: &FilterArgs) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let rows = ctx.handle.rows(args.to_filter()).await?;
    let state = ctx.handle.state().await?;
    let notices = ctx.close().await?;

    let human = render_matrix(&state.db.month_names, &rows);
    let data = json!({
        "periods": state.db.month_names,
        "rows": rows,
    });
    print_success(opts, data, Some(human), notices)
}

pub async fn cmd_filters(opts: &KpiOpts) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let options = ctx.handle.filter_options().await?;
    let notices = ctx.close().await?;

    let human = format!(
        "hospitals:   {}\ncontractors: {}",
        options.hospitals.iter().cloned().collect::<Vec<_>>().join(", "),
        options.contractors.iter().cloned().collect::<Vec<_>>().join(", "),
    );
    print_success(opts, serde_json::to_value(options)?, Some(human), notices)
}

fn render_matrix(periods: &[String], rows: &[MatrixRow]) -> String {
    let mut header = vec![
        "id".to_string(),
        "hospital".into(),
        "category".into(),
        "contractor".into(),
        "late".into(),
    ];
    header.extend(periods.iter().cloned());
    let mut lines = vec![header.join(" | ")];
    for row in rows {
        let mut cols = vec![
            row.id.clone(),
            row.hospital.clone(),
            row.category.to_string(),
            row.contractor.clone(),
            row.late.to_string(),
        ];
        cols.extend(row.cells.iter().map(|cell| cell.finance_status.to_string()));
        let mut line = cols.join(" | ");
        if !row.editable {
            line.push_str("  (read-only)");
        }
        lines.push(line);
    }
    lines.join("\n")
}
