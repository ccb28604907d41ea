use alloc::vec;
use alloc::vec::Vec;
use core::{fmt, slice};

use crate::BlockDevice;

/// 内存盘：一整段易失的内存，按固定大小切分成块。
///
/// 底层以`u64`为单元存储，保证每个块都按8字节对齐，
/// 文件系统因此可以直接把块内数据视作磁盘上的结构体。
pub struct RamDisk {
    words: Vec<u64>,
    block_size: usize,
    block_count: usize,
}

impl RamDisk {
    const ALIGN: usize = core::mem::size_of::<u64>();

    /// 创建全零的内存盘
    pub fn new(block_size: usize, block_count: usize) -> Self {
        assert!(
            block_size > 0 && block_size % Self::ALIGN == 0,
            "block size must be a non-zero multiple of {}",
            Self::ALIGN
        );

        Self {
            words: vec![0; block_size / Self::ALIGN * block_count],
            block_size,
            block_count,
        }
    }

    /// 整个设备的字节视图
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // u64 切片的内存可以安全地按字节读取
        unsafe { slice::from_raw_parts(self.words.as_ptr().cast(), self.capacity()) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.capacity();
        unsafe { slice::from_raw_parts_mut(self.words.as_mut_ptr().cast(), len) }
    }

    /// 块在设备内的字节范围
    fn span(&self, block_id: usize) -> core::ops::Range<usize> {
        assert!(
            block_id < self.block_count,
            "block {block_id} is beyond the device ({} blocks)",
            self.block_count
        );
        let start = block_id * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for RamDisk {
    #[inline]
    fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    fn block_count(&self) -> usize {
        self.block_count
    }

    fn locate(&self, block_id: usize) -> &[u8] {
        let span = self.span(block_id);
        &self.as_bytes()[span]
    }

    fn locate_mut(&mut self, block_id: usize) -> &mut [u8] {
        let span = self.span(block_id);
        &mut self.as_bytes_mut()[span]
    }
}

impl fmt::Debug for RamDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamDisk")
            .field("block_size", &self.block_size)
            .field("block_count", &self.block_count)
            .finish_non_exhaustive()
    }
}
