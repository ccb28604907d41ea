use block_dev::BlockDevice;
use vfs::DirEntryType;

use crate::DataBlock;
use crate::block_view;
use crate::config::BLOCK_SIZE;
use crate::layout::Location;

#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
pub struct DiskInode {
    in_use: bool,
    /// 类型
    pub kind: DiskInodeKind,
    _pad: [u8; 2],
    // 不用usize是为了严控布局
    pub size: u32,
    /// 块号索引树
    pub location: Location,
    _reserved: [u8; 16],
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum DiskInodeKind {
    #[default]
    File,
    Directory,
}

impl DiskInode {
    #[inline]
    pub fn init(&mut self, kind: DiskInodeKind) {
        *self = Self {
            in_use: true,
            kind,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == DiskInodeKind::Directory
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// 从指定位置(字节偏移)读出数据填充`buf`，读到文件末尾为止
    pub fn read_at(&self, offset: usize, buf: &mut [u8], block_device: &dyn BlockDevice) -> usize {
        let mut start = offset;
        let end = start.saturating_add(buf.len()).min(self.size());

        if start >= end {
            return 0;
        }

        // 已读取多少字节
        let mut read_size = 0;
        loop {
            // 当前块的末地址(字节)
            let current_block_end = (start / BLOCK_SIZE + 1) * BLOCK_SIZE;
            let current_block_end = current_block_end.min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            let block_id = self
                .location
                .locate(block_device, start)
                .expect("data block below file size is not allocated");
            block_view::map(block_device, block_id.into(), 0, |data_block: &DataBlock| {
                // 绝对地址 % 块大小 = 块内偏移
                let src = &data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
                dest.copy_from_slice(src);
            });

            read_size += block_read_size;

            if current_block_end == end {
                break;
            }

            start = current_block_end;
        }

        read_size
    }

    /// 写入前须保证`offset + buf.len()`不超过文件大小
    pub fn write_at(
        &self,
        offset: usize,
        buf: &[u8],
        block_device: &mut dyn BlockDevice,
    ) -> usize {
        let mut start = offset;
        let end = start + buf.len();

        assert!(end <= self.size());
        if start == end {
            return 0;
        }

        let mut written_size = 0;
        loop {
            let current_block_end = ((start / BLOCK_SIZE + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            let block_id = self
                .location
                .locate(block_device, start)
                .expect("data block below file size is not allocated");
            block_view::map_mut(
                block_device,
                block_id.into(),
                0,
                |data_block: &mut DataBlock| {
                    let src = &buf[written_size..written_size + block_write_size];
                    let dest =
                        &mut data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size];
                    dest.copy_from_slice(src);
                },
            );

            written_size += block_write_size;

            if current_block_end == end {
                break;
            }

            start = current_block_end;
        }

        written_size
    }
}

impl From<DiskInodeKind> for DirEntryType {
    #[inline]
    fn from(kind: DiskInodeKind) -> Self {
        match kind {
            DiskInodeKind::Directory => Self::Directory,
            DiskInodeKind::File => Self::Regular,
        }
    }
}

impl From<DirEntryType> for DiskInodeKind {
    #[inline]
    fn from(ty: DirEntryType) -> Self {
        match ty {
            DirEntryType::Directory => Self::Directory,
            DirEntryType::Regular => Self::File,
        }
    }
}
