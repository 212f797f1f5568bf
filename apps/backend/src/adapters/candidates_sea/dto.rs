//! DTOs for candidates_sea adapter.

/// One pool entry as supplied at session creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCreate {
    pub candidate_id: String,
    pub name: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub address: Option<String>,
}
