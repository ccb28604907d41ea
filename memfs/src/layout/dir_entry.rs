use core::{ptr, slice};

use crate::config::NAME_MAX_LEN;

/// 名字字段的容量，末尾至少留一字节给 \0
const NAME_CAP: usize = 16;

/// 目录项：目录文件的内容就是一串首尾相接的目录项
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DirEntry {
    name: [u8; NAME_CAP],
    inode_id: u32,
}

impl DirEntry {
    /// 目录项大小恒为20字节
    pub const SIZE: usize = 20;

    /// 调用者须保证`name`不超过 [`NAME_MAX_LEN`] 字节
    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        let bytes = name.as_bytes();
        debug_assert!(bytes.len() <= NAME_MAX_LEN);
        let mut name = [0; NAME_CAP];
        name[..bytes.len()].copy_from_slice(bytes);

        Self { name, inode_id }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(NAME_CAP);
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}
