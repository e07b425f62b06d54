//! Preset searches offered before the first query

use crate::pubmed::SearchFilters;
use crate::session::{DEFAULT_MAX_RESULTS, SearchRequest};
use chrono::{Datelike, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSearch {
    pub title: &'static str,
    /// Comma-separated, as typed into the keyword field
    pub keywords: &'static str,
    pub disease: &'static str,
    pub start_year: i32,
}

pub const SAMPLE_SEARCHES: [SampleSearch; 4] = [
    SampleSearch {
        title: "Recent COVID-19 Treatments",
        keywords: "covid-19, treatment, therapy",
        disease: "COVID-19",
        start_year: 2020,
    },
    SampleSearch {
        title: "Diabetes Management Advances",
        keywords: "management, therapy, intervention",
        disease: "diabetes mellitus type 2",
        start_year: 2018,
    },
    SampleSearch {
        title: "Cancer Immunotherapy Research",
        keywords: "immunotherapy, checkpoint inhibitors",
        disease: "cancer",
        start_year: 2019,
    },
    SampleSearch {
        title: "Heart Failure Guidelines",
        keywords: "guidelines, management, therapy",
        disease: "heart failure",
        start_year: 2017,
    },
];

impl SampleSearch {
    /// Filters spanning `start_year` through `end_year`
    pub fn filters(&self, end_year: i32) -> SearchFilters {
        SearchFilters::new()
            .keyword_list(self.keywords)
            .disease(self.disease)
            .years(self.start_year, end_year)
    }

    /// Search request up to the current year, with demonstration data enabled
    pub fn request(&self) -> SearchRequest {
        SearchRequest::new(self.filters(Local::now().year())).max_results(DEFAULT_MAX_RESULTS)
    }
}
