use anyhow::Result;
use clap::Args;
use kpi_model::{FinanceStatus, MonthRecord};
use serde_json::json;

use crate::opts::{KpiOpts, parse_status};
use crate::output::print_success;
use crate::util::{SessionCtx, applied};

#[derive(Args, Debug)]
pub struct CellArgs {
    /// Contract id
    #[arg(allow_hyphen_values = true)]
    pub contract: String,

    /// Period index, 0 being the most recent period
    pub index: usize,

    /// late, sent or returned
    #[arg(long, value_parser = parse_status)]
    pub status: FinanceStatus,

    #[arg(long, default_value = "")]
    pub claim: String,

    #[arg(long, default_value = "")]
    pub letter: String,

    /// Submission date
    #[arg(long, default_value = "")]
    pub date: String,

    /// Reason the claim was returned
    #[arg(long, default_value = "")]
    pub reason: String,
}

impl CellArgs {
    fn record(&self) -> MonthRecord {
        MonthRecord {
            finance_status: self.status,
            claim_num: self.claim.clone(),
            letter_num: self.letter.clone(),
            submission_date: self.date.clone(),
            return_notes: self.reason.clone(),
        }
    }
}

pub async fn cmd_cell(opts: &KpiOpts, args: &CellArgs) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let record = args.record();
    let outcome = ctx
        .handle
        .update_cell(args.contract.clone(), args.index, record.clone())
        .await?;
    applied(outcome, "update cell")?;
    let notices = ctx.close().await?;

    let human = format!("{} period {}: {}", args.contract, args.index, record.finance_status);
    let data = json!({
        "contract": args.contract,
        "index": args.index,
        "record": record,
    });
    print_success(opts, data, Some(human), notices)
}
