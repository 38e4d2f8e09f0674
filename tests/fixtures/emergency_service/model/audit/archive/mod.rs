/// Three levels below the root: outside the default depth.
pub struct Archived {
    pub location: String,
}
