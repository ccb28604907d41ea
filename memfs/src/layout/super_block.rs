use block_dev::BlockDevice;

use crate::MAGIC;
use crate::block_view;
use crate::config::*;

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位其它连续区域；
/// - 记录空闲索引节点与空闲数据块的数量
#[derive(Debug)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    pub inode_count: u32,
    pub data_blocks: u32,
    pub inode_area_start: u32,
    pub bitmap_start: u32,
    pub data_area_start: u32,
    /// 以下计数只由位图与索引节点表在分配、回收时修改
    free_inodes: u32,
    free_blocks: u32,
}

impl SuperBlock {
    #[inline]
    pub fn init(&mut self) {
        *self = Self {
            magic: MAGIC,
            total_blocks: TOTAL_BLOCKS as u32,
            inode_count: INODE_COUNT as u32,
            data_blocks: DATA_BLOCKS as u32,
            inode_area_start: INODE_AREA_START as u32,
            bitmap_start: BITMAP_START as u32,
            data_area_start: DATA_AREA_START as u32,
            free_inodes: INODE_COUNT as u32,
            free_blocks: DATA_BLOCKS as u32,
        };
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    #[inline]
    pub fn free_inodes(&self) -> u32 {
        self.free_inodes
    }

    #[inline]
    pub fn free_blocks(&self) -> u32 {
        self.free_blocks
    }

    #[inline]
    pub fn on_disk(block_device: &dyn BlockDevice) -> &Self {
        block_view::get(block_device, SUPER_BLOCK_ID, 0)
    }

    #[inline]
    pub fn on_disk_mut(block_device: &mut dyn BlockDevice) -> &mut Self {
        block_view::get_mut(block_device, SUPER_BLOCK_ID, 0)
    }
}

impl SuperBlock {
    pub(super) fn take_inode(&mut self) {
        self.free_inodes -= 1;
    }

    pub(super) fn put_inode(&mut self) {
        debug_assert!((self.free_inodes as usize) < INODE_COUNT);
        self.free_inodes += 1;
    }

    pub(super) fn take_block(&mut self) {
        self.free_blocks -= 1;
    }

    pub(super) fn put_block(&mut self) {
        debug_assert!((self.free_blocks as usize) < DATA_BLOCKS);
        self.free_blocks += 1;
    }
}
