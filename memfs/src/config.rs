//! 编译期确定的磁盘布局
//!
//! 超级块 | 索引节点表 | 数据块位图 | 数据块区域
//!
//! 各区域的边界都由块大小、索引节点大小与磁盘大小推得，运行时不再计算。

use core::mem;

/// 块大小，所有分配都以块为粒度
pub const BLOCK_SIZE: usize = 256;
pub const BLOCK_BITS: usize = BLOCK_SIZE * 8;
/// 磁盘上每个索引节点占据的字节数
pub const INODE_SIZE: usize = 64;
/// 整个虚拟磁盘的字节数：2048 KiB
pub const DISK_SIZE: usize = 2048 * 1024;
pub const TOTAL_BLOCKS: usize = DISK_SIZE / BLOCK_SIZE;

pub const INODE_COUNT: usize = 1024;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
/// 根目录的索引节点号
pub const ROOT_INODE: u32 = 0;

pub const SUPER_BLOCK_ID: usize = 0;
pub const INODE_AREA_START: usize = SUPER_BLOCK_ID + 1;
pub const INODE_AREA_BLOCKS: usize = INODE_COUNT / INODES_PER_BLOCK;
pub const BITMAP_START: usize = INODE_AREA_START + INODE_AREA_BLOCKS;
/// 剩余的块中，每 `BLOCK_BITS + 1` 块就需要一块位图
pub const BITMAP_BLOCKS: usize = (TOTAL_BLOCKS - BITMAP_START).div_ceil(BLOCK_BITS + 1);
pub const DATA_AREA_START: usize = BITMAP_START + BITMAP_BLOCKS;
pub const DATA_BLOCKS: usize = TOTAL_BLOCKS - DATA_AREA_START;

/// 文件名的最大长度（字节）
pub const NAME_MAX_LEN: usize = 13;
/// 完整路径的最大长度（字节）
pub const PATH_MAX_LEN: usize = 256;
pub const PATH_DELIMITER: char = '/';

/// 间接索引块的编号容量，按块号的宽度而非宿主指针宽度计算
pub const INDIRECT_COUNT: usize = BLOCK_SIZE / mem::size_of::<u32>();

/// 直接索引的个数
pub const DIRECT_COUNT: usize = 8;
/// 一级索引块的个数
pub const INDIRECT1_COUNT: usize = 1;
/// 二级索引块的个数
pub const INDIRECT2_COUNT: usize = 1;

/// 直接索引时的编号容量
pub const DIRECT_CAP: usize = DIRECT_COUNT;
/// 用上一级索引时的编号容量
pub const INDIRECT1_CAP: usize = DIRECT_CAP + INDIRECT1_COUNT * INDIRECT_COUNT;
/// 用上二级索引时的编号容量
pub const INDIRECT2_CAP: usize = INDIRECT1_CAP + INDIRECT2_COUNT * INDIRECT_COUNT.pow(2);

/// 文件的最大字节数，即二级索引的容量上限
pub const MAX_FILE_SIZE: usize = INDIRECT2_CAP * BLOCK_SIZE;
