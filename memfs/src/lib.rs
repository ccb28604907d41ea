#![no_std]

extern crate alloc;

/* memfs 的整体架构，自上而下 */

// 文件系统门面：创建、删除、读写等对外操作
mod ops;

// 目录层：路径解析与目录项查找
mod dir;
mod path;

// 索引节点读写层：按字节区间读写、扩张与收缩
mod inode;

// 磁盘块管理器层：布局、索引节点表与数据块的分配
mod fs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 块视图层：把块内字节视作磁盘数据结构
mod block_view;

pub mod config;

pub use self::{
    dir::DirEntries,
    fs::FileSystem,
    layout::{BlockId, DirEntry, DiskInode, DiskInodeKind, Location, LocationIndex, SuperBlock},
    ops::SharedFileSystem,
    path::parse_path,
};
pub use block_dev::{BlockDevice, RamDisk};
pub use vfs::{DirEntryType, Error, Result, Stat, StatKind};

pub const MAGIC: u32 = 0x6d656d66;

type DataBlock = [u8; config::BLOCK_SIZE];
