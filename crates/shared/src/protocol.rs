use serde::{Deserialize, Serialize};

use crate::domain::{header, Section, SECTIONS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub timestamp: String,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub sections: &'static [Section],
    pub header: Vec<&'static str>,
}

impl CatalogResponse {
    pub fn current() -> Self {
        Self {
            sections: SECTIONS,
            header: header(),
        }
    }
}
