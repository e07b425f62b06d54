use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pubmed_assistant::session::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
use pubmed_assistant::{
    ExportFormat, ResearchAssistant, SAMPLE_SEARCHES, SearchRequest, SessionState,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::output::{
    print_analysis, print_article, print_citation, print_search_report, write_export,
};
use super::samples::list_samples;
use super::search::{FilterArgs, parse_export_format};
use super::{create_assistant, spinner};
use crate::Cli;

/// Recent history entries shown by `history`
const HISTORY_DISPLAY: usize = 5;

#[derive(Args, Debug)]
pub struct Shell {
    /// Maximum number of articles fetched by `search` and `rerun`
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
}

/// One line typed at the prompt; the first word names the command
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Search PubMed (same filters as the `search` subcommand)
    Search(ShellSearch),
    /// Run preset search N (see `samples`)
    Sample { number: usize },
    /// List preset searches
    Samples,
    /// List recent queries
    History,
    /// Re-run history entry N without demonstration data
    Rerun { number: usize },
    /// Show current articles
    List,
    /// Show result metrics
    Metrics,
    /// Summarize one article, or every article with `all` or no argument
    Summarize { pmid: Option<String> },
    /// Key findings, research gaps and clinical recommendations
    Analyze,
    /// Answer a question from the current articles
    Ask {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },
    /// Print a citation line
    Cite { pmid: String },
    /// Write the current results to a file
    Export {
        #[arg(value_parser = parse_export_format)]
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Args, Debug)]
struct ShellSearch {
    #[command(flatten)]
    filters: FilterArgs,

    /// Maximum number of articles to fetch (default: the shell's `--max-results`)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u16).range(1..=MAX_RESULTS_LIMIT as i64))]
    max_results: Option<u16>,
}

impl Shell {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let assistant = create_assistant(cli)?;
        let mut state = SessionState::new();

        println!("PubMed research assistant. Type `help` for commands.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    // Also covers `help`, which clap reports as an error kind
                    e.print()?;
                    continue;
                }
            };
            if matches!(command, ShellCommand::Quit) {
                break;
            }

            state = run_command(&assistant, state, command, self.max_results).await?;
        }

        Ok(())
    }
}

async fn run_command(
    assistant: &ResearchAssistant,
    state: SessionState,
    command: ShellCommand,
    max_results: usize,
) -> Result<SessionState> {
    let state = match command {
        ShellCommand::Search(args) => {
            let request = SearchRequest::new(args.filters.to_filters())
                .max_results(args.max_results.map_or(max_results, usize::from));
            let pb = spinner("Searching PubMed...")?;
            let (state, report) = assistant.search(state, request).await;
            pb.finish_and_clear();
            match report {
                Ok(report) => print_search_report(&report, &state)?,
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::Sample { number } => {
            let Some(sample) = number.checked_sub(1).and_then(|i| SAMPLE_SEARCHES.get(i)) else {
                tracing::warn!("No sample search {number}");
                return Ok(state);
            };
            let pb = spinner("Searching PubMed...")?;
            let (state, report) = assistant.search(state, sample.request()).await;
            pb.finish_and_clear();
            match report {
                Ok(report) => print_search_report(&report, &state)?,
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::Samples => {
            list_samples();
            state
        }
        ShellCommand::History => {
            let skip = state.search_history.len().saturating_sub(HISTORY_DISPLAY);
            if state.search_history.is_empty() {
                println!("No searches yet.");
            }
            for (i, query) in state.search_history.iter().enumerate().skip(skip) {
                println!("{}. {query}", i + 1);
            }
            state
        }
        ShellCommand::Rerun { number } => {
            let Some(index) = number.checked_sub(1) else {
                tracing::warn!("History entries start at 1");
                return Ok(state);
            };
            let pb = spinner("Searching PubMed...")?;
            let (state, report) = assistant.rerun(state, index, max_results).await;
            pb.finish_and_clear();
            match report {
                Ok(report) => print_search_report(&report, &state)?,
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::List => {
            let mut out = std::io::stdout().lock();
            for (i, article) in state.articles.iter().enumerate() {
                print_article(&mut out, i + 1, article, state.summaries.get(&article.pmid))?;
            }
            state
        }
        ShellCommand::Metrics => {
            let metrics = state.metrics();
            println!("Total articles: {}", metrics.total_results);
            match metrics.most_recent_year {
                Some(year) => println!("Most recent year: {year}"),
                None => println!("Most recent year: -"),
            }
            println!("Avg. authors per study: {:.1}", metrics.average_authors);
            state
        }
        ShellCommand::Summarize { pmid: Some(pmid) } if pmid != "all" => {
            let pb = spinner("Generating summary...")?;
            let (state, summary) = assistant.summarize(state, &pmid).await;
            pb.finish_and_clear();
            match summary {
                Ok(output) => println!("{}: {}", output.pmid, output.summary),
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::Summarize { .. } => {
            let pb = spinner("Generating summaries...")?;
            let (state, outputs) = assistant.summarize_all(state).await;
            pb.finish_and_clear();
            for output in outputs {
                println!("{}: {}\n", output.pmid, output.summary);
            }
            state
        }
        ShellCommand::Analyze => {
            let pb = spinner("Analyzing articles...")?;
            let (state, analysis) = assistant.analyze(state).await;
            pb.finish_and_clear();
            match analysis {
                Ok(output) => print_analysis(&output.analysis)?,
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::Ask { question } => {
            let question = question.join(" ");
            let pb = spinner("Answering question...")?;
            let (state, answer) = assistant.ask(state, &question).await;
            pb.finish_and_clear();
            match answer {
                Ok(answer) => println!("{answer}\n"),
                Err(e) => tracing::warn!("{e}"),
            }
            state
        }
        ShellCommand::Cite { pmid } => {
            match state.article(&pmid) {
                Some(article) => print_citation(article)?,
                None => tracing::warn!("Article not found: PMID {pmid}"),
            }
            state
        }
        ShellCommand::Export { format, path } => {
            if !state.has_results() {
                tracing::warn!("Nothing to export; run a search first");
            } else if let Err(e) = write_export(&state, format, path.as_deref()) {
                tracing::error!("{e:#}");
            }
            state
        }
        ShellCommand::Quit => state,
    };
    Ok(state)
}

fn parse_command(line: &str) -> std::result::Result<ShellCommand, clap::Error> {
    ShellLine::try_parse_from(split_line(line)).map(|parsed| parsed.command)
}

/// Whitespace-separated words; double quotes group words into one value
fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
