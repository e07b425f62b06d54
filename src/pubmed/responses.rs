use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchData {
    /// String-encoded integer
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
}
