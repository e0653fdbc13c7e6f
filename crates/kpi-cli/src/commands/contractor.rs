//! Contractor administration (super role).

use anyhow::Result;
use clap::Subcommand;
use serde_json::{Value, json};

use crate::opts::KpiOpts;
use crate::output::print_success;
use crate::util::{SessionCtx, applied};

#[derive(Subcommand, Debug)]
pub enum ContractorCommand {
    /// List contractors and how many contracts reference each
    List,

    /// Add a contractor
    Add { name: String },

    /// Rename a contractor
    Rename {
        #[arg(allow_hyphen_values = true)]
        id: String,
        name: String,
    },

    /// Delete a contractor no contract references
    Delete {
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
}

pub async fn cmd_contractor(opts: &KpiOpts, cmd: &ContractorCommand) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let (data, human) = match cmd {
        ContractorCommand::List => {
            let state = ctx.handle.state().await?;
            let db = &state.db;
            let mut lines = Vec::new();
            let list: Vec<Value> = db
                .contractors
                .iter()
                .map(|(id, contractor)| {
                    let used = db.contracts_referencing(id).count();
                    lines.push(format!("{id}  {}  ({used} contract(s))", contractor.name));
                    json!({"id": id, "name": contractor.name, "contracts": used})
                })
                .collect();
            (Value::Array(list), Some(lines.join("\n")))
        }
        ContractorCommand::Add { name } => {
            let id = applied(ctx.handle.add_contractor(name.clone()).await?, "add contractor")?;
            let human = id.as_ref().map(|id| format!("added contractor {id}"));
            (json!({"id": id, "name": name}), human)
        }
        ContractorCommand::Rename { id, name } => {
            let outcome = ctx.handle.rename_contractor(id.clone(), name.clone()).await?;
            applied(outcome, "rename contractor")?;
            (json!({"id": id, "name": name}), Some(format!("renamed contractor {id}")))
        }
        ContractorCommand::Delete { id } => {
            let outcome = ctx.handle.delete_contractor(id.clone()).await?;
            applied(outcome, "delete contractor")?;
            (json!({"id": id}), Some(format!("deleted contractor {id}")))
        }
    };
    let notices = ctx.close().await?;
    print_success(opts, data, human, notices)
}
