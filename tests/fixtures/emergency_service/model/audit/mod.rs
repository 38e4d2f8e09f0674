pub mod archive;

pub struct AuditEntry {
    pub operator: String,
    pub at: u64,
    pub previous: Option<Box<AuditEntry>>,
    pub archived: Option<archive::Archived>,
}
