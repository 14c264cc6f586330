use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    // Dot-files
    pub hidden: bool,
    // No system flag exists here, always false
    pub system: bool,
    pub read_only: bool,
    pub mode: u32,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}
