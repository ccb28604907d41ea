//! # 块视图层
//!
//! 内存盘本身就是全部数据，不再需要块缓存；
//! 此处只负责把某个块内某个偏移处的字节视作磁盘数据结构。
//!
//! `T` 只能是 `layout` 中的 `#[repr(C)]` 结构或由整数构成的数组，
//! 它们的每个字段都只由本文件系统写入。

use core::mem;

use block_dev::BlockDevice;

pub fn get<T: Sized>(block_device: &dyn BlockDevice, block_id: usize, offset: usize) -> &T {
    let block = block_device.locate(block_id);
    check::<T>(block, offset);
    unsafe { &*block.as_ptr().add(offset).cast() }
}

pub fn get_mut<T: Sized>(
    block_device: &mut dyn BlockDevice,
    block_id: usize,
    offset: usize,
) -> &mut T {
    let block = block_device.locate_mut(block_id);
    check::<T>(block, offset);
    unsafe { &mut *block.as_mut_ptr().add(offset).cast() }
}

#[inline]
pub fn map<T: Sized, V>(
    block_device: &dyn BlockDevice,
    block_id: usize,
    offset: usize,
    f: impl FnOnce(&T) -> V,
) -> V {
    f(get(block_device, block_id, offset))
}

#[inline]
pub fn map_mut<T: Sized, V>(
    block_device: &mut dyn BlockDevice,
    block_id: usize,
    offset: usize,
    f: impl FnOnce(&mut T) -> V,
) -> V {
    f(get_mut(block_device, block_id, offset))
}

/// 结构不能越过块尾，也不能落在未对齐的地址上
fn check<T>(block: &[u8], offset: usize) {
    let type_size = mem::size_of::<T>();
    assert!(type_size + offset <= block.len());
    assert_eq!(
        (block.as_ptr() as usize + offset) % mem::align_of::<T>(),
        0,
        "misaligned on-disk structure"
    );
}
