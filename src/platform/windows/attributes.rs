use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub hidden: bool,
    pub system: bool,
    pub read_only: bool,
    // Raw FILE_ATTRIBUTE_* bits
    pub attributes: u32,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}
