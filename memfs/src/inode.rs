//! # 索引节点读写层
//!
//! 对单个索引节点按字节区间读写，并在需要时扩张或收缩其索引树。
//! 索引节点先拷贝出来修改，全部块就位后才连同新大小一并写回，
//! 因此失败的调用不会留下改了一半的大小字段。

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::mem;

use vfs::{Error, Result};

use crate::FileSystem;
use crate::block_view;
use crate::config::*;
use crate::layout::{BlockId, IndirectBlock, Location, LocationIndex};
use crate::layout::{indirect_entry, replace_indirect_entry};

impl FileSystem {
    /// 从`offset`处读取，至多读满`buf`；读到文件末尾即止，越过末尾读出0字节
    pub fn read_inode(&self, inode_id: u32, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let disk_inode = self.inode(inode_id)?;
        Ok(disk_inode.read_at(offset, buf, self.block_device.as_ref()))
    }

    /// 在`offset`处写入`buf`，超出文件末尾时先扩张
    pub fn write_inode(&mut self, inode_id: u32, offset: usize, buf: &[u8]) -> Result<usize> {
        let end = offset
            .checked_add(buf.len())
            .filter(|&end| end <= MAX_FILE_SIZE)
            .ok_or(Error::FileTooLarge)?;

        let mut disk_inode = self.inode(inode_id)?;
        if end > disk_inode.size() {
            self.expand(inode_id, end)?;
            disk_inode = self.inode(inode_id)?;
        }

        Ok(disk_inode.write_at(offset, buf, self.block_device.as_mut()))
    }

    /// 追加到文件末尾，之后的大小恰好增加写入的字节数
    pub fn append_inode(&mut self, inode_id: u32, buf: &[u8]) -> Result<usize> {
        let size = self.inode(inode_id)?.size();
        let written = self.write_inode(inode_id, size, buf)?;
        debug_assert_eq!(self.inode(inode_id)?.size(), size + written);
        Ok(written)
    }

    /// 按新大小分派到扩张或收缩
    pub fn resize(&mut self, inode_id: u32, new_size: usize) -> Result<()> {
        if new_size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        match new_size.cmp(&self.inode(inode_id)?.size()) {
            Ordering::Greater => self.expand(inode_id, new_size),
            Ordering::Less => self.shrink(inode_id, new_size),
            Ordering::Equal => Ok(()),
        }
    }

    /// 把文件扩张到`new_size`字节，逐个补齐缺失的数据块。
    ///
    /// 先确认空闲块足够再动手，空间不足时不分配任何块。
    pub fn expand(&mut self, inode_id: u32, new_size: usize) -> Result<()> {
        if new_size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let mut disk_inode = self.inode(inode_id)?;
        let old_size = disk_inode.size();
        if new_size <= old_size {
            return Ok(());
        }

        let new_blocks = Location::total_blocks(new_size) - Location::total_blocks(old_size);
        if new_blocks > self.free_blocks() as usize {
            log::debug!(
                "inode {inode_id}: expand to {new_size} needs {new_blocks} blocks, {} free",
                self.free_blocks()
            );
            return Err(Error::NoSpace);
        }

        for block_index in Location::data_blocks(old_size)..Location::data_blocks(new_size) {
            self.install(&mut disk_inode.location, LocationIndex::of_block(block_index))?;
        }

        disk_inode.size = new_size as u32;
        self.store_inode(inode_id, &disk_inode);

        Ok(())
    }

    /// 把文件收缩到`new_size`字节，回收其后的全部数据块，
    /// 以及不再有后代的索引块。
    pub fn shrink(&mut self, inode_id: u32, new_size: usize) -> Result<()> {
        let mut disk_inode = self.inode(inode_id)?;
        let old_size = disk_inode.size();
        if new_size >= old_size {
            return Ok(());
        }

        let kept_blocks = Location::data_blocks(new_size);
        for block_index in kept_blocks..Location::data_blocks(old_size) {
            self.release(&mut disk_inode.location, LocationIndex::of_block(block_index));
        }
        self.release_indirect(&mut disk_inode.location, kept_blocks);

        // 末块中新末尾之后的字节清零，再次扩张时才读得到零
        if new_size % BLOCK_SIZE != 0 {
            if let Some(block_id) = disk_inode
                .location
                .locate(self.block_device.as_ref(), new_size)
            {
                self.block_device.locate_mut(block_id.into())[new_size % BLOCK_SIZE..].fill(0);
            }
        }

        disk_inode.size = new_size as u32;
        self.store_inode(inode_id, &disk_inode);

        Ok(())
    }

    /// 索引节点引用的全部块：数据块与索引块
    pub fn referenced_blocks(&self, inode_id: u32) -> Result<Vec<BlockId>> {
        let location = self.inode(inode_id)?.location;
        let block_device = self.block_device.as_ref();
        let mut blocks = Vec::new();

        blocks.extend(location.direct.iter().filter_map(|id| id.allocated()));

        let pointers = |block: BlockId| {
            block_view::map(block_device, block.into(), 0, |indirect: &IndirectBlock| {
                *indirect
            })
            .into_iter()
            .filter_map(BlockId::allocated)
        };

        for indirect1 in location.indirect1.iter().filter_map(|id| id.allocated()) {
            blocks.push(indirect1);
            blocks.extend(pointers(indirect1));
        }

        for indirect2 in location.indirect2.iter().filter_map(|id| id.allocated()) {
            blocks.push(indirect2);
            for indirect1 in pointers(indirect2) {
                blocks.push(indirect1);
                blocks.extend(pointers(indirect1));
            }
        }

        Ok(blocks)
    }
}

impl FileSystem {
    /// 确保逻辑块所在路径上的每一项都已分配，先索引块后数据块
    fn install(&mut self, location: &mut Location, index: LocationIndex) -> Result<BlockId> {
        match index {
            LocationIndex::Direct(l1) => self.ensure(&mut location.direct[l1]),
            LocationIndex::Indirect1(l1, l2) => {
                let indirect1 = self.ensure(&mut location.indirect1[l1])?;
                self.ensure_entry(indirect1, l2)
            }
            LocationIndex::Indirect2(l1, l2, l3) => {
                let indirect2 = self.ensure(&mut location.indirect2[l1])?;
                let indirect1 = self.ensure_entry(indirect2, l2)?;
                self.ensure_entry(indirect1, l3)
            }
        }
    }

    fn ensure(&mut self, slot: &mut BlockId) -> Result<BlockId> {
        if slot.is_none() {
            *slot = self.alloc_data()?;
        }
        Ok(*slot)
    }

    fn ensure_entry(&mut self, block: BlockId, index: usize) -> Result<BlockId> {
        let id = indirect_entry(self.block_device.as_ref(), block, index);
        if let Some(id) = id.allocated() {
            return Ok(id);
        }

        let id = self.alloc_data()?;
        replace_indirect_entry(self.block_device.as_mut(), block, index, id);
        Ok(id)
    }

    /// 回收逻辑块对应的数据块并清空其索引项
    fn release(&mut self, location: &mut Location, index: LocationIndex) {
        let block_id = match index {
            LocationIndex::Direct(l1) => mem::take(&mut location.direct[l1]),
            LocationIndex::Indirect1(l1, l2) => self.take_entry(location.indirect1[l1], l2),
            LocationIndex::Indirect2(l1, l2, l3) => {
                let indirect1 = location.indirect2[l1]
                    .allocated()
                    .map_or(BlockId::NONE, |indirect2| {
                        indirect_entry(self.block_device.as_ref(), indirect2, l2)
                    });
                self.take_entry(indirect1, l3)
            }
        };

        if let Some(block_id) = block_id.allocated() {
            self.dealloc_data(block_id);
        }
    }

    /// 回收所有后代都已不在前`kept_blocks`个数据块之内的索引块
    fn release_indirect(&mut self, location: &mut Location, kept_blocks: usize) {
        for (i, slot) in location.indirect1.iter_mut().enumerate() {
            let first_block = DIRECT_CAP + i * INDIRECT_COUNT;
            if kept_blocks <= first_block {
                if let Some(indirect1) = mem::take(slot).allocated() {
                    self.dealloc_data(indirect1);
                }
            }
        }

        for (i, slot) in location.indirect2.iter_mut().enumerate() {
            let Some(indirect2) = slot.allocated() else {
                continue;
            };

            let first_block = INDIRECT1_CAP + i * INDIRECT_COUNT.pow(2);
            for j in 0..INDIRECT_COUNT {
                if kept_blocks <= first_block + j * INDIRECT_COUNT {
                    if let Some(indirect1) = self.take_entry(indirect2, j).allocated() {
                        self.dealloc_data(indirect1);
                    }
                }
            }

            if kept_blocks <= first_block {
                *slot = BlockId::NONE;
                self.dealloc_data(indirect2);
            }
        }
    }

    /// 取出索引块内的一项并将其清空；索引块未分配时返回空
    fn take_entry(&mut self, block: BlockId, index: usize) -> BlockId {
        match block.allocated() {
            Some(block) => replace_indirect_entry(
                self.block_device.as_mut(),
                block,
                index,
                BlockId::NONE,
            ),
            None => BlockId::NONE,
        }
    }
}
