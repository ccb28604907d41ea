//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备；
//! [`BlockDevice`] 就是对块设备寻址的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块号向驱动索取块的字节区间，不关心其背后的存储。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;
use core::fmt::Debug;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
pub trait BlockDevice: Debug + Send + Sync + Any {
    /// 每块的字节数
    fn block_size(&self) -> usize;

    /// 设备的总块数
    fn block_count(&self) -> usize;

    /// 获取绝对块号`block_id`所对应的字节区间。
    ///
    /// 除了不能越过设备末尾，此处不做任何检查，
    /// 调用者须自行保证只访问属于自己的区域。
    fn locate(&self, block_id: usize) -> &[u8];

    fn locate_mut(&mut self, block_id: usize) -> &mut [u8];

    /// 设备的总字节数
    #[inline]
    fn capacity(&self) -> usize {
        self.block_size() * self.block_count()
    }
}
