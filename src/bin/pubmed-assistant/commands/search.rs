use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use clap::Args;
use pubmed_assistant::{ExportFormat, JoinOperator, SearchFilters, SearchRequest, SessionState};

use super::output::{print_analysis, print_search_report, write_export};
use super::{create_assistant, spinner};
use crate::Cli;

/// Earliest year accepted for a year filter
const MIN_YEAR: i32 = 1900;

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keywords, comma separated (e.g. "treatment, therapy")
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Disease or condition (matched as MeSH term and free text)
    #[arg(short, long)]
    pub disease: Option<String>,

    /// Filter articles published from this year onwards
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Filter articles published up to this year (default: current year)
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Filter by author name (e.g. "Smith AB")
    #[arg(long)]
    pub author: Option<String>,

    /// Filter by journal name
    #[arg(long)]
    pub journal: Option<String>,

    /// How clauses are combined
    #[arg(long, value_enum, default_value = "and")]
    pub operator: OperatorArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub enum OperatorArg {
    #[default]
    And,
    Or,
}

impl From<OperatorArg> for JoinOperator {
    fn from(arg: OperatorArg) -> Self {
        match arg {
            OperatorArg::And => JoinOperator::And,
            OperatorArg::Or => JoinOperator::Or,
        }
    }
}

impl FilterArgs {
    pub fn to_filters(&self) -> SearchFilters {
        self.to_filters_for_year(Local::now().year())
    }

    fn to_filters_for_year(&self, current_year: i32) -> SearchFilters {
        let mut filters = SearchFilters::new().operator(self.operator.into());

        if let Some(ref keywords) = self.keywords {
            filters = filters.keyword_list(keywords);
        }
        if let Some(ref disease) = self.disease {
            filters = filters.disease(disease);
        }
        match (self.from_year, self.to_year) {
            (Some(from), to) => filters = filters.years(from, to.unwrap_or(current_year)),
            (None, Some(to)) => filters = filters.years(MIN_YEAR, to),
            (None, None) => {}
        }
        if let Some(ref author) = self.author {
            filters = filters.author(author);
        }
        if let Some(ref journal) = self.journal {
            filters = filters.journal(journal);
        }
        filters
    }
}

pub fn parse_export_format(value: &str) -> std::result::Result<ExportFormat, String> {
    value.parse::<ExportFormat>().map_err(|e| e.to_string())
}

#[derive(Args, Debug)]
pub struct Search {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Maximum number of articles to fetch
    #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=20))]
    pub max_results: u16,

    /// Return an empty list instead of demonstration data when nothing is found
    #[arg(long)]
    pub no_demo: bool,

    /// Summarize every article
    #[arg(long)]
    pub summarize: bool,

    /// Extract key findings, research gaps and clinical recommendations
    #[arg(long)]
    pub analyze: bool,

    /// Ask a question about the retrieved articles
    #[arg(short, long)]
    pub question: Option<String>,

    /// Export format (csv, json, bibliography, bibtex, text, pdf)
    #[arg(short, long, value_parser = parse_export_format)]
    pub export: Option<ExportFormat>,

    /// Export file (default depends on the format)
    #[arg(short, long, requires = "export")]
    pub output: Option<PathBuf>,
}

impl Search {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let assistant = create_assistant(cli)?;

        let request = SearchRequest::new(self.filters.to_filters())
            .max_results(self.max_results as usize)
            .use_demo_data(!self.no_demo);

        tracing::info!(max_results = self.max_results, "Searching PubMed");
        let pb = spinner("Searching PubMed...")?;
        let (state, report) = assistant.search(SessionState::new(), request).await;
        pb.finish_and_clear();
        let report = report?;

        let state = if self.summarize {
            let pb = spinner("Generating summaries...")?;
            let (state, _) = assistant.summarize_all(state).await;
            pb.finish_and_clear();
            state
        } else {
            state
        };

        print_search_report(&report, &state)?;

        let state = if self.analyze {
            let pb = spinner("Analyzing articles...")?;
            let (state, analysis) = assistant.analyze(state).await;
            pb.finish_and_clear();
            match analysis {
                Ok(output) => print_analysis(&output.analysis)?,
                Err(e) => tracing::warn!("{e}"),
            }
            state
        } else {
            state
        };

        let state = if let Some(ref question) = self.question {
            let pb = spinner("Answering question...")?;
            let (state, answer) = assistant.ask(state, question).await;
            pb.finish_and_clear();
            match answer {
                Ok(answer) => println!("Q: {question}\nA: {answer}\n"),
                Err(e) => tracing::warn!("{e}"),
            }
            state
        } else {
            state
        };

        if let Some(format) = self.export {
            if !state.has_results() {
                bail!("No articles to export");
            }
            write_export(&state, format, self.output.as_deref())?;
        }

        Ok(())
    }
}
