//! DTOs for sessions_sea adapter.

/// DTO for creating a session row.
#[derive(Debug, Clone)]
pub struct SessionCreate {
    pub id: String,
    pub code: String,
    pub created_by: String,
}

impl SessionCreate {
    pub fn new(id: impl Into<String>, code: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            created_by: created_by.into(),
        }
    }
}
