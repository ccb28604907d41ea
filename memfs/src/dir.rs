//! # 目录层
//!
//! 目录就是内容为一串定长目录项的普通文件，
//! 与普通文件走同一条索引节点读写路径。

use vfs::{Error, Result};

use crate::FileSystem;
use crate::config::ROOT_INODE;
use crate::layout::DirEntry;
use crate::path::parse_path;

/// 按需逐项读出目录内容的迭代器
pub struct DirEntries<'a> {
    fs: &'a FileSystem,
    dir: u32,
    offset: usize,
    size: usize,
}

impl Iterator for DirEntries<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        if self.offset + DirEntry::SIZE > self.size {
            return None;
        }

        let mut dir_entry = DirEntry::default();
        let read = self
            .fs
            .read_inode(self.dir, self.offset, dir_entry.as_bytes_mut())
            .ok()?;
        debug_assert_eq!(read, DirEntry::SIZE);
        self.offset += DirEntry::SIZE;

        Some(dir_entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = (self.size - self.offset) / DirEntry::SIZE;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for DirEntries<'_> {}

impl FileSystem {
    /// 目录下的全部目录项
    pub fn entries(&self, dir: u32) -> Result<DirEntries<'_>> {
        let disk_inode = self.inode(dir)?;
        if !disk_inode.is_dir() {
            return Err(Error::NotADirectory);
        }

        Ok(DirEntries {
            fs: self,
            dir,
            offset: 0,
            size: disk_inode.size(),
        })
    }

    /// 在目录`parent`下按名字查找，返回子项的索引节点号
    pub fn lookup_child(&self, parent: u32, name: &str) -> Result<u32> {
        self.find_entry(parent, name)
            .map(|(_, dir_entry)| dir_entry.inode_id())
    }

    /// 解析完整路径，`/`即根目录
    pub fn lookup_full(&self, path: &str) -> Result<u32> {
        let cmps = parse_path(path)?;
        self.walk(&cmps)
    }

    /// 解析路径去掉最后一个分量后的部分，结果必须是目录
    pub fn lookup_parent(&self, path: &str) -> Result<u32> {
        let cmps = parse_path(path)?;
        let dirs = cmps.split_last().map_or(&[][..], |(_, dirs)| dirs);
        self.walk_dir(dirs)
    }

    /// 在目录末尾追加一个目录项
    pub fn insert_entry(&mut self, parent: u32, name: &str, child: u32) -> Result<()> {
        if !self.inode(parent)?.is_dir() {
            return Err(Error::NotADirectory);
        }

        let dir_entry = DirEntry::new(name, child);
        self.append_inode(parent, dir_entry.as_bytes())?;
        Ok(())
    }

    /// 删除第`index`个目录项：其后各项依次前移一格以保持顺序，再收缩一项的宽度
    pub fn remove_entry(&mut self, parent: u32, index: usize) -> Result<()> {
        let count = self.entries(parent)?.len();
        if index >= count {
            return Err(Error::NotFound);
        }

        let mut dir_entry = DirEntry::default();
        for next in index + 1..count {
            self.read_inode(parent, next * DirEntry::SIZE, dir_entry.as_bytes_mut())?;
            self.write_inode(parent, (next - 1) * DirEntry::SIZE, dir_entry.as_bytes())?;
        }

        self.shrink(parent, (count - 1) * DirEntry::SIZE)
    }
}

impl FileSystem {
    /// 在目录下按名字查找，返回目录项的序号与目录项
    pub(crate) fn find_entry(&self, parent: u32, name: &str) -> Result<(usize, DirEntry)> {
        self.entries(parent)?
            .enumerate()
            .find(|(_, dir_entry)| dir_entry.name() == name)
            .ok_or(Error::NotFound)
    }

    /// 从根目录起逐个分量向下解析
    pub(crate) fn walk(&self, cmps: &[&str]) -> Result<u32> {
        cmps.iter()
            .try_fold(ROOT_INODE, |inode_id, cmp| self.lookup_child(inode_id, cmp))
    }

    /// 同 [`Self::walk`]，但结果必须是目录
    pub(crate) fn walk_dir(&self, cmps: &[&str]) -> Result<u32> {
        let inode_id = self.walk(cmps)?;
        if !self.inode(inode_id)?.is_dir() {
            return Err(Error::NotADirectory);
        }
        Ok(inode_id)
    }
}
