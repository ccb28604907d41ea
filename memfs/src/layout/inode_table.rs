use block_dev::BlockDevice;
use vfs::{Error, Result};

use crate::block_view;
use crate::config::{INODE_SIZE, INODES_PER_BLOCK, ROOT_INODE};
use crate::layout::{DiskInode, DiskInodeKind, SuperBlock};

/// 索引节点表：定长的索引节点数组，以下标作为索引节点号
#[derive(Debug)]
pub struct InodeTable {
    /// 表的起始块
    start_block_id: usize,
    /// 索引节点个数
    count: usize,
}

impl InodeTable {
    #[inline]
    pub fn new(start_block_id: usize, count: usize) -> Self {
        Self {
            start_block_id,
            count,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// 根目录占据0号，格式化后始终在用
    pub fn init_root(&self, block_device: &mut dyn BlockDevice) {
        let (block_id, offset) = self.disk_inode_pos(ROOT_INODE);
        block_view::map_mut(block_device, block_id, offset, |root: &mut DiskInode| {
            root.init(DiskInodeKind::Directory)
        });
        SuperBlock::on_disk_mut(block_device).take_inode();
    }

    /// 拷贝出指定的索引节点
    pub fn get(&self, block_device: &dyn BlockDevice, inode_id: u32) -> DiskInode {
        let (block_id, offset) = self.disk_inode_pos(inode_id);
        *block_view::get(block_device, block_id, offset)
    }

    pub fn store(&self, block_device: &mut dyn BlockDevice, inode_id: u32, disk_inode: &DiskInode) {
        let (block_id, offset) = self.disk_inode_pos(inode_id);
        *block_view::get_mut(block_device, block_id, offset) = *disk_inode;
    }

    /// 线性扫描，取第一个空闲的索引节点并标记为在用
    pub fn alloc(&self, block_device: &mut dyn BlockDevice, kind: DiskInodeKind) -> Result<u32> {
        if SuperBlock::on_disk(block_device).free_inodes() == 0 {
            return Err(Error::NoSpace);
        }

        let inode_id = (ROOT_INODE + 1..self.count as u32)
            .find(|&id| !self.get(&*block_device, id).is_in_use())
            .ok_or(Error::NoSpace)?;

        let (block_id, offset) = self.disk_inode_pos(inode_id);
        block_view::map_mut(block_device, block_id, offset, |disk_inode: &mut DiskInode| {
            disk_inode.init(kind)
        });
        SuperBlock::on_disk_mut(block_device).take_inode();

        Ok(inode_id)
    }

    /// 调用者须先回收索引节点的全部数据块
    pub fn free(&self, block_device: &mut dyn BlockDevice, inode_id: u32) {
        assert_ne!(inode_id, ROOT_INODE, "the root directory cannot be freed");

        let (block_id, offset) = self.disk_inode_pos(inode_id);
        block_view::map_mut(block_device, block_id, offset, |disk_inode: &mut DiskInode| {
            assert!(disk_inode.is_in_use());
            debug_assert!(disk_inode.size == 0 && disk_inode.location.is_empty());
            *disk_inode = DiskInode::default();
        });
        SuperBlock::on_disk_mut(block_device).put_inode();
    }

    pub fn count_free(&self, block_device: &dyn BlockDevice) -> usize {
        (0..self.count as u32)
            .filter(|&id| !self.get(block_device, id).is_in_use())
            .count()
    }

    /// 通过ID获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    pub fn disk_inode_pos(&self, inode_id: u32) -> (usize, usize) {
        let inode_id = inode_id as usize;
        assert!(inode_id < self.count);

        let block_id = self.start_block_id + inode_id / INODES_PER_BLOCK;
        let block_offset = inode_id % INODES_PER_BLOCK * INODE_SIZE;

        (block_id, block_offset)
    }
}
