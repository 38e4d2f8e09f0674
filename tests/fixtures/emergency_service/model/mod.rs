pub mod audit;

pub struct DeletionRequest {
    /// @tag validate:"required"
    pub targets: Vec<String>,
    pub audit: Vec<audit::AuditEntry>,
}
