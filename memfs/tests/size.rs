use std::mem;

use memfs::config::{BLOCK_SIZE, INODE_SIZE};
use memfs::{DirEntry, DiskInode, Location, SuperBlock};

#[test]
fn layout() {
    assert_eq!(INODE_SIZE, mem::size_of::<DiskInode>());
    assert_eq!(40, mem::size_of::<Location>());
    assert_eq!(DirEntry::SIZE, mem::size_of::<DirEntry>());
    assert!(mem::size_of::<SuperBlock>() <= BLOCK_SIZE);
    assert_eq!(0, BLOCK_SIZE % INODE_SIZE);
}
