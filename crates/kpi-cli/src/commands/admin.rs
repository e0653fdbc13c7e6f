//! Credential change and system reset (super role).

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::opts::KpiOpts;
use crate::output::print_success;
use crate::util::{SessionCtx, applied};

/// New role passwords; omitted roles keep their current password.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[arg(long = "super")]
    pub super_admin: Option<String>,

    #[arg(long)]
    pub medical: Option<String>,

    #[arg(long)]
    pub non_medical: Option<String>,

    /// Read-only viewer password
    #[arg(long)]
    pub viewer: Option<String>,
}

pub async fn cmd_passwords(opts: &KpiOpts, args: &PasswordArgs) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let mut passwords = ctx.handle.state().await?.passwords;
    if let Some(value) = &args.super_admin {
        passwords.super_admin = value.clone();
    }
    if let Some(value) = &args.medical {
        passwords.medical = value.clone();
    }
    if let Some(value) = &args.non_medical {
        passwords.non_medical = value.clone();
    }
    if let Some(value) = &args.viewer {
        passwords.viewer = Some(value.clone());
    }
    applied(ctx.handle.change_passwords(passwords).await?, "change passwords")?;
    let notices = ctx.close().await?;
    print_success(opts, json!({"saved": true}), Some("passwords saved".into()), notices)
}

pub async fn cmd_reset(opts: &KpiOpts) -> Result<()> {
    let ctx = SessionCtx::open(opts).await?;
    let done = applied(ctx.handle.reset_system().await?, "system reset")?.is_some();
    let notices = ctx.close().await?;
    let human = if done { "system reset" } else { "reset cancelled" };
    print_success(opts, json!({"reset": done}), Some(human.into()), notices)
}
