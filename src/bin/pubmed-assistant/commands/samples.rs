use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use clap::Args;
use pubmed_assistant::{SAMPLE_SEARCHES, SessionState};

use super::output::print_search_report;
use super::{create_assistant, spinner};
use crate::Cli;

#[derive(Args, Debug)]
pub struct Samples {
    /// Run the preset with this number instead of listing them
    #[arg(short, long)]
    pub run: Option<usize>,
}

impl Samples {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let Some(number) = self.run else {
            list_samples();
            return Ok(());
        };

        let Some(sample) = number.checked_sub(1).and_then(|i| SAMPLE_SEARCHES.get(i)) else {
            bail!(
                "No sample search {number}; choose 1 to {}",
                SAMPLE_SEARCHES.len()
            );
        };

        let assistant = create_assistant(cli)?;
        tracing::info!(sample = sample.title, "Running sample search");

        let pb = spinner("Searching PubMed...")?;
        let (state, report) = assistant.search(SessionState::new(), sample.request()).await;
        pb.finish_and_clear();

        print_search_report(&report?, &state)
    }
}

pub fn list_samples() {
    let current_year = Local::now().year();
    for (i, sample) in SAMPLE_SEARCHES.iter().enumerate() {
        println!("{}. {}", i + 1, sample.title);
        println!("   Keywords: {}", sample.keywords);
        println!("   Disease: {}", sample.disease);
        println!("   Years: {}-{}", sample.start_year, current_year);
    }
}
