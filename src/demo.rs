//! Fixed demonstration articles shown when a search finds nothing or fails

use crate::pubmed::models::ArticleRecord;
use chrono::{Datelike, Local};

/// Number of demonstration articles
pub const DEMONSTRATION_ARTICLE_COUNT: usize = 5;

struct DemoArticle {
    pmid: &'static str,
    title: &'static str,
    abstract_text: &'static str,
    authors: &'static [&'static str],
    month: &'static str,
    years_ago: i32,
    journal: &'static str,
    keywords: &'static [&'static str],
}

const DEMO_ARTICLES: [DemoArticle; DEMONSTRATION_ARTICLE_COUNT] = [
    DemoArticle {
        pmid: "sample1",
        title: "Recent Advances in Treatment Approaches for Autoimmune Disorders",
        abstract_text: "This comprehensive review examines the latest therapeutic approaches for autoimmune disorders, focusing on targeted immunomodulators and personalized medicine strategies. We analyze clinical trials data from the past five years and discuss emerging treatment paradigms.",
        authors: &["Sarah J. Wilson", "Michael Chang", "Priya Patel"],
        month: "January",
        years_ago: 0,
        journal: "Journal of Clinical Immunology",
        keywords: &["autoimmune disorders", "immunomodulators", "personalized medicine"],
    },
    DemoArticle {
        pmid: "sample2",
        title: "Machine Learning Applications in Early Disease Detection",
        abstract_text: "This study evaluates the efficacy of various machine learning algorithms in predicting disease onset from biomarker data. Using a dataset of 10,000 patients across multiple centers, we demonstrate significant improvements in early detection rates for several chronic conditions.",
        authors: &["David A. Roberts", "Emma L. Thompson"],
        month: "March",
        years_ago: 0,
        journal: "Digital Health Research",
        keywords: &["machine learning", "disease prediction", "biomarkers"],
    },
    DemoArticle {
        pmid: "sample3",
        title: "Comparative Effectiveness of Novel Anticoagulants in Preventing Stroke",
        abstract_text: "This meta-analysis compares outcomes of direct oral anticoagulants versus traditional therapy in stroke prevention. Results indicate superior efficacy profiles for newer agents with reduced bleeding risks in specific patient populations.",
        authors: &["Jennifer M. Lopez", "Robert K. Chen", "Thomas Wilson"],
        month: "June",
        years_ago: 1,
        journal: "Stroke Prevention Research",
        keywords: &["anticoagulants", "stroke prevention", "meta-analysis"],
    },
    DemoArticle {
        pmid: "sample4",
        title: "Genetic Markers for Treatment Response in Major Depressive Disorder",
        abstract_text: "This research identifies specific genetic polymorphisms associated with differential responses to antidepressant medications. The findings suggest potential for genotype-guided treatment selection to improve outcomes in depression management.",
        authors: &["Natasha Singh", "Carlos Rodriguez"],
        month: "October",
        years_ago: 1,
        journal: "Journal of Psychiatric Genetics",
        keywords: &["depression", "pharmacogenomics", "personalized psychiatry"],
    },
    DemoArticle {
        pmid: "sample5",
        title: "Microbiome Alterations Associated with Inflammatory Bowel Disease Progression",
        abstract_text: "This longitudinal study tracks changes in gut microbiota composition during inflammatory bowel disease progression. We identify specific bacterial signatures that precede clinical flares and may serve as early warning biomarkers.",
        authors: &["Ahmed Hassan", "Julia Chen", "Marcus Williams"],
        month: "April",
        years_ago: 1,
        journal: "Gastroenterology Research",
        keywords: &["microbiome", "inflammatory bowel disease", "biomarkers"],
    },
];

/// The demonstration articles dated relative to the current year
pub fn demonstration_articles() -> Vec<ArticleRecord> {
    demonstration_articles_for_year(Local::now().year())
}

/// The demonstration articles dated relative to `current_year`
pub fn demonstration_articles_for_year(current_year: i32) -> Vec<ArticleRecord> {
    DEMO_ARTICLES
        .iter()
        .map(|demo| ArticleRecord {
            pmid: demo.pmid.to_string(),
            title: demo.title.to_string(),
            abstract_text: demo.abstract_text.to_string(),
            authors: demo.authors.iter().map(|a| a.to_string()).collect(),
            publication_date: format!("{} {}", demo.month, current_year - demo.years_ago),
            journal: demo.journal.to_string(),
            keywords: demo.keywords.iter().map(|k| k.to_string()).collect(),
            article_url: ArticleRecord::url_for(demo.pmid),
        })
        .collect()
}
