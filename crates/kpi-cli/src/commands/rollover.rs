//! Month rollover (admin).

use anyhow::Result;
use clap::Args;
use kpi_session::{MonthNaming, RecomputeAlignment, RolloverPolicy, SessionConfig};
use serde_json::json;

use crate::opts::KpiOpts;
use crate::output::print_success;
use crate::util::{SessionCtx, applied};

#[derive(Args, Debug)]
pub struct RolloverArgs {
    /// prepend-one closes the previous month; recompute-from-epoch rebuilds the year to date
    #[arg(long)]
    pub policy: Option<RolloverPolicy>,

    /// Cell carry-over for recompute-from-epoch: positional or by-label
    #[arg(long)]
    pub alignment: Option<RecomputeAlignment>,

    /// Maximum number of tracked periods for prepend-one
    #[arg(long)]
    pub max_periods: Option<usize>,

    /// Period label language: arabic or english
    #[arg(long)]
    pub naming: Option<MonthNaming>,
}

pub async fn cmd_rollover(opts: &KpiOpts, args: &RolloverArgs) -> Result<()> {
    let mut config = SessionConfig::from_env();
    if let Some(policy) = args.policy {
        config.rollover.policy = policy;
    }
    if let Some(alignment) = args.alignment {
        config.rollover.alignment = alignment;
    }
    if let Some(max) = args.max_periods {
        config.rollover.max_periods = max.max(1);
    }
    if let Some(naming) = args.naming {
        config.rollover.naming = naming;
    }

    let ctx = SessionCtx::open_with(opts, config).await?;
    let outcome = ctx.handle.rollover().await?;
    let notices = ctx.close().await?;

    let Some(plan) = applied(outcome, "month rollover")? else {
        let human = Some("rollover cancelled".to_string());
        return print_success(opts, json!({"cancelled": true}), human, notices);
    };
    let added = plan.added_labels();
    let dropped = plan.dropped_labels();
    let human = format!(
        "{}: {} period(s), {} contract(s) resynchronised\nadded:   {}\ndropped: {}",
        plan.policy,
        plan.month_names.len(),
        plan.months.len(),
        added.join(", "),
        dropped.join(", "),
    );
    let data = json!({
        "policy": plan.policy.as_str(),
        "monthNames": &plan.month_names,
        "added": added,
        "dropped": dropped,
        "contracts": plan.months.len(),
    });
    print_success(opts, data, Some(human), notices)
}
