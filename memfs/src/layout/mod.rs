//! # 磁盘数据结构层
//!
//! memfs 的磁盘布局见 [`crate::config`]：
//! 超级块 | 索引节点表 | 数据块位图 | 数据块区域

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod location;
pub use location::{BlockId, IndirectBlock, Location, LocationIndex};
pub(crate) use location::{indirect_entry, replace_indirect_entry};

mod inode;
pub use inode::{DiskInode, DiskInodeKind};

mod inode_table;
pub use inode_table::InodeTable;

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;
