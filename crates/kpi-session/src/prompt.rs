use async_trait::async_trait;

use crate::config::RolloverPolicy;

/// Description of a destructive operation awaiting operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Rollover {
        policy: RolloverPolicy,
        added: Vec<String>,
        dropped: Vec<String>,
        period_count: usize,
        contracts: usize,
    },
    SystemReset {
        contracts: usize,
        contractors: usize,
    },
}

impl Prompt {
    pub fn title(&self) -> String {
        match self {
            Prompt::Rollover {
                policy,
                added,
                dropped,
                period_count,
                contracts,
            } => {
                let mut title = format!(
                    "{policy}: {contracts} contract(s) resynchronised to {period_count} period(s)"
                );
                if !added.is_empty() {
                    title.push_str(&format!("; adds {}", added.join(", ")));
                }
                if !dropped.is_empty() {
                    title.push_str(&format!("; drops {}", dropped.join(", ")));
                }
                title
            }
            Prompt::SystemReset {
                contracts,
                contractors,
            } => format!("erase {contracts} contract(s) and {contractors} contractor(s)"),
        }
    }
}

/// Operator checkpoint before a rollover or reset is written.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &Prompt) -> bool;
}

/// Answers every prompt the same way. Used for scripted runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        tracing::info!(prompt = %prompt.title(), answer = self.0, "confirmation");
        self.0
    }
}
