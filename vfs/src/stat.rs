use crate::DirEntryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Inode number
    pub inode: u32,
    pub kind: StatKind,
    /// File size
    pub size: u64,
    /// Optimal I/O block size
    pub block_size: u64,
    /// 承载数据的块数
    pub data_blocks: u64,
    /// 数据块加上间接索引块
    pub blocks: u64,
}

/// 文件类型，取值即 `st_mode` 中的类型位
#[allow(clippy::upper_case_acronyms)]
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatKind {
    DIR = 0o040000,
    #[default]
    FILE = 0o100000,
}

impl From<DirEntryType> for StatKind {
    #[inline]
    fn from(ty: DirEntryType) -> Self {
        match ty {
            DirEntryType::Directory => Self::DIR,
            DirEntryType::Regular => Self::FILE,
        }
    }
}
