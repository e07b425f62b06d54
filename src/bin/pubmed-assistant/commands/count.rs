use anyhow::{Result, bail};
use clap::Args;

use super::output::emit_notices;
use super::search::FilterArgs;
use super::{create_pubmed_client, spinner};
use crate::Cli;

#[derive(Args, Debug)]
pub struct Count {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Fail on network errors instead of reporting a count of 0
    #[arg(long)]
    pub strict: bool,
}

impl Count {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let query = self.filters.to_filters().build();
        if query.is_empty() {
            bail!("Please enter at least keywords or a disease to search");
        }

        let client = create_pubmed_client(cli)?;
        tracing::info!(query = %query, "Counting PubMed results");

        let pb = spinner("Querying PubMed...")?;
        let count = if self.strict {
            let count = client.fetch_count(&query).await;
            pb.finish_and_clear();
            count?
        } else {
            let outcome = client.result_count(&query).await;
            pb.finish_and_clear();
            emit_notices(&outcome.notices);
            outcome.count
        };

        println!("{count}");
        Ok(())
    }
}
