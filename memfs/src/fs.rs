//! # 磁盘块管理器层
//!
//! 构建出磁盘的布局并使用：文件系统独占底层块设备，
//! 索引节点与数据块的分配、回收都经由此处。

use alloc::boxed::Box;

use block_dev::{BlockDevice, RamDisk};
use vfs::{Error, Result};

use crate::config::*;
use crate::layout::*;

#[derive(Debug)]
pub struct FileSystem {
    pub(crate) block_device: Box<dyn BlockDevice>,
    inode_table: InodeTable,
    data_bitmap: Bitmap,
}

impl FileSystem {
    /// 在一块全新的内存盘上格式化出文件系统
    pub fn new() -> Self {
        Self::format(Box::new(RamDisk::new(BLOCK_SIZE, TOTAL_BLOCKS)))
    }

    /// 清空设备并写入布局，格式化后只有根目录存在
    pub fn format(mut block_device: Box<dyn BlockDevice>) -> Self {
        assert_eq!(block_device.block_size(), BLOCK_SIZE);
        assert_eq!(block_device.block_count(), TOTAL_BLOCKS);

        for block_id in 0..TOTAL_BLOCKS {
            block_device.locate_mut(block_id).fill(0);
        }

        let mut fs = Self {
            block_device,
            inode_table: InodeTable::new(INODE_AREA_START, INODE_COUNT),
            data_bitmap: Bitmap::new(BITMAP_START, BITMAP_BLOCKS, DATA_BLOCKS),
        };

        SuperBlock::on_disk_mut(fs.block_device.as_mut()).init();
        fs.data_bitmap.clear_all(fs.block_device.as_mut());
        fs.inode_table.init_root(fs.block_device.as_mut());

        log::info!(
            "formatted: {} inodes, {} data blocks starting at block {}",
            INODE_COUNT,
            DATA_BLOCKS,
            DATA_AREA_START
        );

        fs
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        SuperBlock::on_disk(self.block_device.as_ref())
    }

    #[inline]
    pub fn free_inodes(&self) -> u32 {
        self.super_block().free_inodes()
    }

    #[inline]
    pub fn free_blocks(&self) -> u32 {
        self.super_block().free_blocks()
    }

    #[inline]
    pub fn block_device(&self) -> &dyn BlockDevice {
        self.block_device.as_ref()
    }

    /// 数据块当前是否已分配
    pub fn is_allocated(&self, block_id: BlockId) -> bool {
        self.data_bitmap
            .test(self.block_device.as_ref(), Self::data_bit(block_id))
    }

    /// 校验超级块中的计数与位图、索引节点表的实际情况一致。
    ///
    /// 二者不一致是程序错误，而不是可以恢复的运行时状态。
    pub fn check(&self) {
        let block_device = self.block_device.as_ref();
        assert_eq!(
            self.data_bitmap.count_free(block_device),
            self.free_blocks() as usize,
            "free block counter disagrees with the bitmap"
        );
        assert_eq!(
            self.inode_table.count_free(block_device),
            self.free_inodes() as usize,
            "free inode counter disagrees with the inode table"
        );
    }

    #[inline]
    pub(crate) fn debug_check(&self) {
        if cfg!(debug_assertions) {
            self.check();
        }
    }
}

impl FileSystem {
    /// 在磁盘上分配新的 inode 并返回其ID
    pub(crate) fn alloc_inode(&mut self, kind: DiskInodeKind) -> Result<u32> {
        let inode_id = self.inode_table.alloc(self.block_device.as_mut(), kind)?;
        log::debug!("alloc inode {inode_id} ({kind:?})");
        Ok(inode_id)
    }

    pub(crate) fn free_inode(&mut self, inode_id: u32) {
        self.inode_table.free(self.block_device.as_mut(), inode_id);
        log::debug!("free inode {inode_id}");
    }

    /// 在磁盘上分配新的数据块并返回其块号，新块的内容全为零
    pub(crate) fn alloc_data(&mut self) -> Result<BlockId> {
        let bit = self.data_bitmap.alloc(self.block_device.as_mut())?;
        let block_id = BlockId::from((DATA_AREA_START + bit) as u32);
        log::trace!("alloc block {block_id}");
        Ok(block_id)
    }

    pub(crate) fn dealloc_data(&mut self, block_id: BlockId) {
        self.block_device.locate_mut(block_id.into()).fill(0);
        self.data_bitmap
            .dealloc(self.block_device.as_mut(), Self::data_bit(block_id));
        log::trace!("dealloc block {block_id}");
    }

    /// 取出在用的索引节点，不存在的一律视为找不到
    pub(crate) fn inode(&self, inode_id: u32) -> Result<DiskInode> {
        if inode_id as usize >= self.inode_table.count() {
            return Err(Error::NotFound);
        }

        let disk_inode = self.inode_table.get(self.block_device.as_ref(), inode_id);
        if !disk_inode.is_in_use() {
            return Err(Error::NotFound);
        }

        Ok(disk_inode)
    }

    #[inline]
    pub(crate) fn store_inode(&mut self, inode_id: u32, disk_inode: &DiskInode) {
        self.inode_table
            .store(self.block_device.as_mut(), inode_id, disk_inode);
    }

    /// 数据块在位图中的位号
    fn data_bit(block_id: BlockId) -> usize {
        let block_id = usize::from(block_id);
        assert!(
            (DATA_AREA_START..TOTAL_BLOCKS).contains(&block_id),
            "block {block_id} is outside the data area"
        );
        block_id - DATA_AREA_START
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
