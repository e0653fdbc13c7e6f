//! Contract create/edit/delete and notes.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use kpi_model::{Contract, ContractCategory};
use kpi_session::ContractDraft;
use serde_json::json;

use crate::opts::{KpiOpts, parse_category};
use crate::output::print_success;
use crate::util::{SessionCtx, applied};

#[derive(Subcommand, Debug)]
pub enum ContractCommand {
    /// Create a contract; every tracked period starts late
    Add(ContractArgs),

    /// Change contract fields; omitted fields keep their value
    Edit {
        #[arg(allow_hyphen_values = true)]
        id: String,
        #[command(flatten)]
        fields: ContractArgs,
    },

    /// Delete a contract
    Delete {
        #[arg(allow_hyphen_values = true)]
        id: String,
    },

    /// Replace the contract notes
    Note {
        #[arg(allow_hyphen_values = true)]
        id: String,
        text: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ContractArgs {
    #[arg(long)]
    pub hospital: Option<String>,

    /// medical or non_medical
    #[arg(long, value_parser = parse_category)]
    pub category: Option<ContractCategory>,

    /// Contractor id
    #[arg(long)]
    pub contractor: Option<String>,

    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub end_date: Option<String>,

    #[arg(long)]
    pub value: Option<String>,

    #[arg(long)]
    pub number: Option<String>,
}

impl ContractArgs {
    /// Overlay the given fields on `base`.
    fn draft(&self, base: ContractDraft) -> ContractDraft {
        ContractDraft {
            hospital: self.hospital.clone().unwrap_or(base.hospital),
            category: self.category.unwrap_or(base.category),
            contractor_id: self.contractor.clone().unwrap_or(base.contractor_id),
            start_date: self.start_date.clone().unwrap_or(base.start_date),
            end_date: self.end_date.clone().unwrap_or(base.end_date),
            value: self.value.clone().unwrap_or(base.value),
            contract_number: self.number.clone().unwrap_or(base.contract_number),
        }
    }
}

fn draft_of(contract: &Contract) -> ContractDraft {
    ContractDraft {
        hospital: contract.hospital.clone(),
        category: contract.category,
        contractor_id: contract.contractor_id.clone(),
        start_date: contract.start_date.clone(),
        end_date: contract.end_date.clone(),
        value: contract.value.clone(),
        contract_number: contract.contract_number.clone(),
    }
}

pub async fn cmd_contract(opts: &KpiOpts, cmd: &ContractCommand) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let (data, human) = match cmd {
        ContractCommand::Add(fields) => {
            let outcome = ctx
                .handle
                .create_contract(fields.draft(ContractDraft::default()))
                .await?;
            let id = applied(outcome, "create contract")?;
            (json!({"id": id}), id.map(|id| format!("created contract {id}")))
        }
        ContractCommand::Edit { id, fields } => {
            let state = ctx.handle.state().await?;
            let current = state
                .db
                .contracts
                .get(id)
                .with_context(|| format!("contract '{id}' not found"))?;
            let outcome = ctx
                .handle
                .update_contract(id.clone(), fields.draft(draft_of(current)))
                .await?;
            applied(outcome, "edit contract")?;
            (json!({"id": id}), Some(format!("updated contract {id}")))
        }
        ContractCommand::Delete { id } => {
            applied(ctx.handle.delete_contract(id.clone()).await?, "delete contract")?;
            (json!({"id": id}), Some(format!("deleted contract {id}")))
        }
        ContractCommand::Note { id, text } => {
            let outcome = ctx.handle.edit_note(id.clone(), text.clone()).await?;
            applied(outcome, "edit note")?;
            (json!({"id": id, "notes": text}), Some(format!("saved note on {id}")))
        }
    };
    let notices = ctx.close().await?;
    print_success(opts, data, human, notices)
}
