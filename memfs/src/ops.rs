//! # 文件系统门面
//!
//! 对外的创建、删除、读写操作。每个操作先检查全部前提，
//! 检查通过后才修改文件系统；失败时不留下任何改动。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;
use vfs::{DirEntryType, Error, Result, Stat};

use crate::FileSystem;
use crate::config::BLOCK_SIZE;
use crate::layout::{DirEntry, DiskInode, Location};
use crate::path::parse_path;

/// 多个调用者共享时，以一把全局锁包住整个文件系统
pub type SharedFileSystem = Arc<Mutex<FileSystem>>;

impl FileSystem {
    /// 在`path`处创建文件或目录，返回其索引节点号
    pub fn make(&mut self, path: &str, ty: DirEntryType) -> Result<u32> {
        let cmps = parse_path(path)?;
        // 根目录总是存在
        let Some((&name, dirs)) = cmps.split_last() else {
            return Err(Error::AlreadyExists);
        };

        let parent = self.walk_dir(dirs)?;
        match self.lookup_child(parent, name) {
            Ok(_) => return Err(Error::AlreadyExists),
            Err(Error::NotFound) => (),
            Err(e) => return Err(e),
        }

        if self.free_inodes() == 0 || self.free_blocks() == 0 {
            return Err(Error::NoSpace);
        }
        let parent_size = self.inode(parent)?.size();
        let new_blocks = Location::total_blocks(parent_size + DirEntry::SIZE)
            - Location::total_blocks(parent_size);
        if new_blocks > self.free_blocks() as usize {
            return Err(Error::NoSpace);
        }

        let child = self.alloc_inode(ty.into())?;
        if let Err(e) = self.insert_entry(parent, name, child) {
            self.free_inode(child);
            return Err(e);
        }

        log::debug!("make {path:?} ({ty:?}) -> inode {child}");
        self.debug_check();
        Ok(child)
    }

    /// 删除`path`处的文件或空目录，并回收其全部块与索引节点
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let cmps = parse_path(path)?;
        let Some((&name, dirs)) = cmps.split_last() else {
            return Err(Error::InvalidPath);
        };

        let parent = self.walk_dir(dirs)?;
        let (index, dir_entry) = self.find_entry(parent, name)?;
        let child = dir_entry.inode_id();

        let disk_inode = self.inode(child)?;
        if disk_inode.is_dir() && disk_inode.size() > 0 {
            return Err(Error::DirectoryNotEmpty);
        }

        self.remove_entry(parent, index)?;
        self.shrink(child, 0)?;
        self.free_inode(child);

        log::debug!("remove {path:?} (inode {child})");
        self.debug_check();
        Ok(())
    }

    /// 解析路径，返回索引节点号
    #[inline]
    pub fn lookup(&self, path: &str) -> Result<u32> {
        self.lookup_full(path)
    }

    pub fn read(&self, inode_id: u32, offset: usize, buf: &mut [u8]) -> Result<usize> {
        self.read_inode(inode_id, offset, buf)
    }

    /// 只能写普通文件，目录的内容由目录层维护
    pub fn write(&mut self, inode_id: u32, offset: usize, buf: &[u8]) -> Result<usize> {
        self.regular_file(inode_id)?;
        let written = self.write_inode(inode_id, offset, buf)?;
        self.debug_check();
        Ok(written)
    }

    pub fn append(&mut self, inode_id: u32, buf: &[u8]) -> Result<usize> {
        self.regular_file(inode_id)?;
        let written = self.append_inode(inode_id, buf)?;
        self.debug_check();
        Ok(written)
    }

    /// 把普通文件截断或延长到`size`字节，延长部分读出为零
    pub fn truncate(&mut self, inode_id: u32, size: usize) -> Result<()> {
        self.regular_file(inode_id)?;
        self.resize(inode_id, size)?;
        self.debug_check();
        Ok(())
    }

    pub fn stat(&self, inode_id: u32) -> Result<Stat> {
        let disk_inode = self.inode(inode_id)?;
        let ty = DirEntryType::from(disk_inode.kind);

        Ok(Stat {
            inode: inode_id,
            kind: ty.into(),
            size: disk_inode.size as u64,
            block_size: BLOCK_SIZE as u64,
            data_blocks: Location::data_blocks(disk_inode.size()) as u64,
            blocks: Location::total_blocks(disk_inode.size()) as u64,
        })
    }

    /// 列出目录下的各项
    pub fn list(&self, path: &str) -> Result<Vec<vfs::DirEntry>> {
        let dir = self.lookup_full(path)?;
        self.entries(dir)?
            .map(|dir_entry| {
                let ty = self.inode(dir_entry.inode_id())?.kind.into();
                Ok(vfs::DirEntry {
                    inode: dir_entry.inode_id(),
                    ty,
                    name: String::from(dir_entry.name()),
                })
            })
            .collect()
    }

    pub fn into_shared(self) -> SharedFileSystem {
        Arc::new(Mutex::new(self))
    }
}

impl FileSystem {
    fn regular_file(&self, inode_id: u32) -> Result<DiskInode> {
        let disk_inode = self.inode(inode_id)?;
        if disk_inode.is_dir() {
            return Err(Error::NotAFile);
        }
        Ok(disk_inode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROOT_INODE;

    #[test]
    fn root_cannot_be_made_or_removed() {
        let mut fs = FileSystem::new();
        assert_eq!(fs.make("/", DirEntryType::Directory), Err(Error::AlreadyExists));
        assert_eq!(fs.remove("/"), Err(Error::InvalidPath));
        assert_eq!(fs.lookup("/"), Ok(ROOT_INODE));
    }

    #[test]
    fn directories_reject_byte_writes() {
        let mut fs = FileSystem::new();
        let dir = fs.make("/d", DirEntryType::Directory).unwrap();

        assert_eq!(fs.write(dir, 0, b"x"), Err(Error::NotAFile));
        assert_eq!(fs.append(dir, b"x"), Err(Error::NotAFile));
        assert_eq!(fs.truncate(dir, 10), Err(Error::NotAFile));
        assert_eq!(fs.write(ROOT_INODE, 0, b"x"), Err(Error::NotAFile));
    }

    #[test]
    fn stale_inode_is_not_found() {
        let mut fs = FileSystem::new();
        let file = fs.make("/f", DirEntryType::Regular).unwrap();
        fs.remove("/f").unwrap();

        let mut buf = [0; 4];
        assert_eq!(fs.read(file, 0, &mut buf), Err(Error::NotFound));
        assert_eq!(fs.write(file, 0, b"x"), Err(Error::NotFound));
        assert_eq!(fs.stat(file), Err(Error::NotFound));
        assert_eq!(fs.read(u32::MAX, 0, &mut buf), Err(Error::NotFound));
    }

    #[test]
    fn list_and_stat() {
        let mut fs = FileSystem::new();
        let dir = fs.make("/d", DirEntryType::Directory).unwrap();
        let file = fs.make("/d/f", DirEntryType::Regular).unwrap();
        fs.write(file, 0, &[7; 300]).unwrap();

        let listing = fs.list("/d").unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "f");
        assert_eq!(listing[0].inode, file);
        assert_eq!(listing[0].ty, DirEntryType::Regular);
        assert_eq!(fs.list("/").unwrap()[0].ty, DirEntryType::Directory);
        assert_eq!(fs.list("/d/f"), Err(Error::NotADirectory));

        let stat = fs.stat(file).unwrap();
        assert_eq!(stat.size, 300);
        assert_eq!(stat.data_blocks, 2);
        assert_eq!(stat.blocks, 2);
        assert_eq!(stat.kind, vfs::StatKind::FILE);
        assert_eq!(fs.stat(dir).unwrap().kind, vfs::StatKind::DIR);
        assert_eq!(stat.kind as u32, 0o100000);
    }
}
