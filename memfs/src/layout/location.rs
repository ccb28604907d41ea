//! 块号索引树
//!
//! - 直接索引：inode 内直接存储**块编号**，每个编号指向一个**数据块**
//! - 一级索引：整个块连续存储**块编号**，每个编号都指向一个**数据块**
//! - 二级索引：整个块连续存储**块编号**，每个编号都指向一个一级索引块
//!
//! 索引树按需生长：某一项只在首次写到其覆盖范围时才分配。
//! 大小为 `n` 的文件恰好拥有前 `ceil(n / BLOCK_SIZE)` 个数据块，
//! 以及到达它们所需的索引块，此外什么都没有。

use block_dev::BlockDevice;
use derive_more::{Display, From, Into};
use vfs::{Error, Result};

use crate::block_view;
use crate::config::*;

/// 绝对块号。
///
/// 0 号块是超级块，永远不会分给文件，因此 [`BlockId::NONE`] 表示未分配。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Display)]
#[repr(transparent)]
pub struct BlockId(u32);

/// 间接索引块
pub type IndirectBlock = [BlockId; INDIRECT_COUNT];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Location {
    /// 直接索引，存储容量：DIRECT_CAP * BLOCK_SIZE 字节
    pub direct: [BlockId; DIRECT_COUNT],
    /// 各自指向一个一级索引块
    pub indirect1: [BlockId; INDIRECT1_COUNT],
    /// 各自指向一个二级索引块
    pub indirect2: [BlockId; INDIRECT2_COUNT],
}

/// 某个数据块在索引树中的路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationIndex {
    Direct(usize),
    /// (一级索引块, 块内项)
    Indirect1(usize, usize),
    /// (二级索引块, 二级索引块内项, 一级索引块内项)
    Indirect2(usize, usize, usize),
}

impl BlockId {
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// 已分配时返回自身
    #[inline]
    pub fn allocated(self) -> Option<Self> {
        (!self.is_none()).then_some(self)
    }
}

impl From<BlockId> for usize {
    #[inline]
    fn from(id: BlockId) -> Self {
        id.0 as usize
    }
}

impl LocationIndex {
    /// 字节偏移所在块的路径
    pub fn of(offset: usize) -> Result<Self> {
        if offset >= MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }
        Ok(Self::of_block(offset / BLOCK_SIZE))
    }

    /// 逻辑块索引的路径，逻辑索引即文件内第几个数据块
    pub fn of_block(block_index: usize) -> Self {
        debug_assert!(block_index < INDIRECT2_CAP);

        if block_index < DIRECT_CAP {
            Self::Direct(block_index)
        } else if block_index < INDIRECT1_CAP {
            // 剔去直接索引的部分
            let index = block_index - DIRECT_CAP;
            Self::Indirect1(index / INDIRECT_COUNT, index % INDIRECT_COUNT)
        } else {
            // 剔去使用了一级索引的部分
            let index = block_index - INDIRECT1_CAP;
            Self::Indirect2(
                index / INDIRECT_COUNT.pow(2),
                index / INDIRECT_COUNT % INDIRECT_COUNT,
                index % INDIRECT_COUNT,
            )
        }
    }
}

impl Location {
    /// 找到字节偏移所在的数据块；途经任何未分配的项都返回空，
    /// 这是按需分配的信号而非错误。
    pub fn locate(&self, block_device: &dyn BlockDevice, offset: usize) -> Option<BlockId> {
        let index = LocationIndex::of(offset).ok()?;
        self.block_id(block_device, index)
    }

    pub fn block_id(&self, block_device: &dyn BlockDevice, index: LocationIndex) -> Option<BlockId> {
        match index {
            LocationIndex::Direct(l1) => self.direct[l1].allocated(),
            LocationIndex::Indirect1(l1, l2) => {
                let indirect1 = self.indirect1[l1].allocated()?;
                indirect_entry(block_device, indirect1, l2).allocated()
            }
            LocationIndex::Indirect2(l1, l2, l3) => {
                let indirect2 = self.indirect2[l1].allocated()?;
                let indirect1 = indirect_entry(block_device, indirect2, l2).allocated()?;
                indirect_entry(block_device, indirect1, l3).allocated()
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 计算容纳指定数据量需要多少个**数据块**
    #[inline]
    pub fn data_blocks(size: usize) -> usize {
        size.div_ceil(BLOCK_SIZE)
    }

    /// 计算容纳指定数据量需要多少个 **数据块** 和 **索引块**(`IndirectBlock`)
    pub fn total_blocks(size: usize) -> usize {
        let data_blocks = Self::data_blocks(size);
        let mut total = data_blocks;

        // 超出直接索引，使用一级索引块
        if data_blocks > DIRECT_CAP {
            total += (data_blocks.min(INDIRECT1_CAP) - DIRECT_CAP).div_ceil(INDIRECT_COUNT);
        }

        // 超出一级索引，使用二级索引块及其下的一级索引块
        if data_blocks > INDIRECT1_CAP {
            let rest = data_blocks - INDIRECT1_CAP;
            total += rest.div_ceil(INDIRECT_COUNT.pow(2)) + rest.div_ceil(INDIRECT_COUNT);
        }

        total
    }
}

/// 读取索引块内的第`index`项
pub fn indirect_entry(block_device: &dyn BlockDevice, block: BlockId, index: usize) -> BlockId {
    block_view::map(block_device, block.into(), 0, |indirect: &IndirectBlock| {
        indirect[index]
    })
}

/// 改写索引块内的第`index`项，返回旧值
pub fn replace_indirect_entry(
    block_device: &mut dyn BlockDevice,
    block: BlockId,
    index: usize,
    id: BlockId,
) -> BlockId {
    block_view::map_mut(block_device, block.into(), 0, |indirect: &mut IndirectBlock| {
        core::mem::replace(&mut indirect[index], id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_tier_boundaries() {
        use LocationIndex::*;

        assert_eq!(LocationIndex::of(0), Ok(Direct(0)));
        assert_eq!(LocationIndex::of(BLOCK_SIZE - 1), Ok(Direct(0)));
        assert_eq!(LocationIndex::of(2047), Ok(Direct(7)));
        assert_eq!(LocationIndex::of(2048), Ok(Indirect1(0, 0)));
        assert_eq!(LocationIndex::of(2048 + 63 * BLOCK_SIZE), Ok(Indirect1(0, 63)));
        assert_eq!(LocationIndex::of(18432), Ok(Indirect2(0, 0, 0)));
        assert_eq!(LocationIndex::of(18432 + 65 * BLOCK_SIZE), Ok(Indirect2(0, 1, 1)));
        assert_eq!(LocationIndex::of(MAX_FILE_SIZE - 1), Ok(Indirect2(0, 63, 63)));
        assert_eq!(LocationIndex::of(MAX_FILE_SIZE), Err(Error::FileTooLarge));
    }

    #[test]
    fn total_blocks_counts_pointer_blocks() {
        assert_eq!(Location::total_blocks(0), 0);
        assert_eq!(Location::total_blocks(1), 1);
        assert_eq!(Location::total_blocks(DIRECT_CAP * BLOCK_SIZE), 8);
        assert_eq!(Location::total_blocks(DIRECT_CAP * BLOCK_SIZE + 1), 10);
        assert_eq!(Location::total_blocks(INDIRECT1_CAP * BLOCK_SIZE), 73);
        assert_eq!(Location::total_blocks(INDIRECT1_CAP * BLOCK_SIZE + 1), 76);
        assert_eq!(Location::total_blocks(MAX_FILE_SIZE), 4168 + 66);
    }

    #[test]
    fn block_id_sentinel() {
        assert!(BlockId::default().is_none());
        assert_eq!(BlockId::NONE.allocated(), None);
        assert_eq!(BlockId::from(300).allocated(), Some(BlockId::from(300)));
    }
}
