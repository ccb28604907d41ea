use block_dev::BlockDevice;
use vfs::{Error, Result};

use crate::block_view;
use crate::config::BLOCK_BITS;
use crate::layout::SuperBlock;

/// 位图区域内块的结构
type BitmapBlock = [u64; BLOCK_BITS / 64];

/// 位图区域，记录数据块区域的分配情况：置位表示已分配。
///
/// 位号是相对数据块区域起始处的编号。
#[derive(Debug)]
pub struct Bitmap {
    /// 位图的起始块
    start_block_id: usize,
    /// 位图占用块数
    blocks: usize,
    /// 有效位数，即所指示区域的块数
    capacity: usize,
}

/// 位图内某一位的位置
struct BitPos(usize);

impl Bitmap {
    #[inline]
    pub fn new(start_block_id: usize, blocks: usize, capacity: usize) -> Self {
        assert!(capacity <= blocks * BLOCK_BITS);
        Self {
            start_block_id,
            blocks,
            capacity,
        }
    }

    pub fn test(&self, block_device: &dyn BlockDevice, bit: usize) -> bool {
        let (block_index, group_index, ingroup_index) = self.decode(bit);
        block_view::map(
            block_device,
            self.start_block_id + block_index,
            0,
            |bitmap_block: &BitmapBlock| bitmap_block[group_index] & (1 << ingroup_index) != 0,
        )
    }

    /// 置位，返回此前的状态
    pub fn set(&self, block_device: &mut dyn BlockDevice, bit: usize) -> bool {
        let (block_index, group_index, ingroup_index) = self.decode(bit);
        block_view::map_mut(
            block_device,
            self.start_block_id + block_index,
            0,
            |bitmap_block: &mut BitmapBlock| {
                let old = bitmap_block[group_index] & (1 << ingroup_index) != 0;
                bitmap_block[group_index] |= 1 << ingroup_index;
                old
            },
        )
    }

    /// 清位，返回此前的状态
    pub fn clear(&self, block_device: &mut dyn BlockDevice, bit: usize) -> bool {
        let (block_index, group_index, ingroup_index) = self.decode(bit);
        block_view::map_mut(
            block_device,
            self.start_block_id + block_index,
            0,
            |bitmap_block: &mut BitmapBlock| {
                let old = bitmap_block[group_index] & (1 << ingroup_index) != 0;
                bitmap_block[group_index] &= !(1 << ingroup_index);
                old
            },
        )
    }

    pub fn clear_all(&self, block_device: &mut dyn BlockDevice) {
        for block_index in 0..self.blocks {
            block_device
                .locate_mut(self.start_block_id + block_index)
                .fill(0);
        }
    }

    /// 从第0位起线性扫描，返回第一个空闲位
    pub fn first_free(&self, block_device: &dyn BlockDevice) -> Option<usize> {
        // 遍历位图区域内所有的块，寻找块内还有剩余空间的bit组(即还有0)
        for block_index in 0..self.blocks {
            let Some((group_index, ingroup_index)) = block_view::map(
                block_device,
                self.start_block_id + block_index,
                0,
                |bitmap_block: &BitmapBlock| {
                    bitmap_block
                        .iter()
                        .enumerate()
                        .find_map(|(group_index, &bits)| {
                            (bits != u64::MAX).then_some((group_index, bits.trailing_ones()))
                        })
                },
            ) else {
                continue;
            };

            let bit = BitPos::encode(block_index, group_index, ingroup_index as usize).0;
            // 末尾多出的位永远不分配，扫到它们说明区域已满
            return (bit < self.capacity).then_some(bit);
        }

        None
    }

    /// 分配一个空闲块并返回其位号，同时维护超级块中的空闲块计数
    pub fn alloc(&self, block_device: &mut dyn BlockDevice) -> Result<usize> {
        let bit = self.first_free(block_device).ok_or(Error::NoSpace)?;
        self.set(block_device, bit);
        SuperBlock::on_disk_mut(block_device).take_block();

        Ok(bit)
    }

    pub fn dealloc(&self, block_device: &mut dyn BlockDevice, bit: usize) {
        // 编号一定得有对应的位
        let was_set = self.clear(block_device, bit);
        assert!(was_set, "block {bit} is not allocated");
        SuperBlock::on_disk_mut(block_device).put_block();
    }

    /// 统计空闲位的个数
    pub fn count_free(&self, block_device: &dyn BlockDevice) -> usize {
        let allocated: usize = (0..self.blocks)
            .map(|block_index| {
                block_view::map(
                    block_device,
                    self.start_block_id + block_index,
                    0,
                    |bitmap_block: &BitmapBlock| {
                        bitmap_block
                            .iter()
                            .map(|bits| bits.count_ones() as usize)
                            .sum::<usize>()
                    },
                )
            })
            .sum();

        self.capacity - allocated
    }
}

impl Bitmap {
    fn decode(&self, bit: usize) -> (usize, usize, usize) {
        assert!(
            bit < self.capacity,
            "bit {bit} is beyond the bitmap ({})",
            self.capacity
        );
        BitPos(bit).decode()
    }
}

impl BitPos {
    /// 线性映射编码得到位号
    #[inline]
    fn encode(block_index: usize, group_index: usize, ingroup_index: usize) -> Self {
        Self(block_index * BLOCK_BITS + group_index * 64 + ingroup_index)
    }

    fn decode(self) -> (usize, usize, usize) {
        let mut bit = self.0;

        let block_index = bit / BLOCK_BITS;
        bit %= BLOCK_BITS;
        (block_index, bit / 64, bit % 64)
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;
    use crate::config::*;

    fn setup() -> (RamDisk, Bitmap) {
        let mut disk = RamDisk::new(BLOCK_SIZE, TOTAL_BLOCKS);
        SuperBlock::on_disk_mut(&mut disk).init();
        (disk, Bitmap::new(BITMAP_START, BITMAP_BLOCKS, DATA_BLOCKS))
    }

    #[test]
    fn set_and_clear_report_previous_state() {
        let (mut disk, bitmap) = setup();

        assert!(!bitmap.test(&disk, 70));
        assert!(!bitmap.set(&mut disk, 70));
        assert!(bitmap.set(&mut disk, 70));
        assert!(bitmap.test(&disk, 70));
        assert!(bitmap.clear(&mut disk, 70));
        assert!(!bitmap.clear(&mut disk, 70));
        assert!(!bitmap.test(&disk, 70));
    }

    #[test]
    fn first_free_is_lowest_zero_bit() {
        let (mut disk, bitmap) = setup();

        for bit in 0..130 {
            bitmap.set(&mut disk, bit);
        }
        assert_eq!(bitmap.first_free(&disk), Some(130));

        bitmap.clear(&mut disk, 3);
        assert_eq!(bitmap.first_free(&disk), Some(3));

        bitmap.clear_all(&mut disk);
        assert_eq!(bitmap.first_free(&disk), Some(0));
    }

    #[test]
    fn alloc_until_exhausted() {
        let (mut disk, bitmap) = setup();

        for expected in 0..DATA_BLOCKS {
            assert_eq!(bitmap.alloc(&mut disk), Ok(expected));
        }
        assert_eq!(bitmap.first_free(&disk), None);
        assert_eq!(bitmap.alloc(&mut disk), Err(Error::NoSpace));
        assert_eq!(SuperBlock::on_disk(&disk).free_blocks(), 0);
        assert_eq!(bitmap.count_free(&disk), 0);

        bitmap.dealloc(&mut disk, 4000);
        assert_eq!(SuperBlock::on_disk(&disk).free_blocks(), 1);
        assert_eq!(bitmap.count_free(&disk), 1);
        assert_eq!(bitmap.alloc(&mut disk), Ok(4000));
    }

    #[test]
    #[should_panic]
    fn double_free() {
        let (mut disk, bitmap) = setup();
        bitmap.dealloc(&mut disk, 5);
    }
}
