use std::collections::HashSet;
use std::thread;

use memfs::config::*;
use memfs::{DirEntryType, Error, FileSystem};

#[test]
fn hello() {
    let mut fs = FileSystem::new();
    fs.make("/hello", DirEntryType::Regular).unwrap();

    let index = fs.lookup("/hello").unwrap();
    assert_eq!(fs.write(index, 0, b"HHH\0"), Ok(4));

    let mut buf = [0; 4];
    assert_eq!(fs.read(index, 0, &mut buf), Ok(4));
    assert_eq!(&buf, b"HHH\0");
    assert_eq!(fs.stat(index).unwrap().size, 4);
    assert_eq!(fs.read(index, usize::MAX, &mut buf), Ok(0));
}

#[test]
fn names_with_nul_are_rejected() {
    let mut fs = FileSystem::new();
    assert_eq!(fs.make("/a\0", DirEntryType::Regular), Err(Error::InvalidPath));
    assert_eq!(fs.make("/d\0x/f", DirEntryType::Regular), Err(Error::InvalidPath));
    assert!(fs.list("/").unwrap().is_empty());

    fs.make("/a", DirEntryType::Regular).unwrap();
    assert_eq!(fs.lookup("/a\0"), Err(Error::InvalidPath));
    assert_eq!(fs.remove("/a\0"), Err(Error::InvalidPath));
    assert_eq!(fs.list("/").unwrap().len(), 1);
}

#[test]
fn remove_non_empty_directory() {
    let mut fs = FileSystem::new();
    fs.make("/a", DirEntryType::Directory).unwrap();
    fs.make("/a/b", DirEntryType::Regular).unwrap();

    assert_eq!(fs.remove("/a"), Err(Error::DirectoryNotEmpty));
    assert!(fs.lookup("/a/b").is_ok());

    fs.remove("/a/b").unwrap();
    fs.remove("/a").unwrap();
    assert_eq!(fs.lookup("/a"), Err(Error::NotFound));
    assert!(fs.list("/").unwrap().is_empty());
}

#[test]
fn make_preconditions() {
    let mut fs = FileSystem::new();
    fs.make("/a", DirEntryType::Directory).unwrap();
    fs.make("/f", DirEntryType::Regular).unwrap();

    assert_eq!(fs.make("/a", DirEntryType::Regular), Err(Error::AlreadyExists));
    assert_eq!(fs.make("/x/y", DirEntryType::Regular), Err(Error::NotFound));
    assert_eq!(fs.make("/f/y", DirEntryType::Regular), Err(Error::NotADirectory));
    assert_eq!(fs.make("a/b", DirEntryType::Regular), Err(Error::InvalidPath));
    assert_eq!(
        fs.make("/a/abcdefghijklmn", DirEntryType::Regular),
        Err(Error::InvalidPath)
    );
    assert_eq!(fs.remove("/a/nothing"), Err(Error::NotFound));
    assert_eq!(fs.remove("/f/nothing"), Err(Error::NotADirectory));
}

#[test]
fn make_then_remove_restores_counters() {
    let mut fs = FileSystem::new();
    fs.make("/keep", DirEntryType::Regular).unwrap();
    let (inodes, blocks) = (fs.free_inodes(), fs.free_blocks());

    let inode_id = fs.make("/tmp", DirEntryType::Regular).unwrap();
    fs.write(inode_id, 0, &[5; 30_000]).unwrap();
    fs.remove("/tmp").unwrap();

    assert_eq!(fs.lookup("/tmp"), Err(Error::NotFound));
    assert_eq!((fs.free_inodes(), fs.free_blocks()), (inodes, blocks));
    fs.check();
}

#[test]
fn lookup_is_pure() {
    let mut fs = FileSystem::new();
    fs.make("/a", DirEntryType::Directory).unwrap();
    fs.make("/a/b", DirEntryType::Directory).unwrap();
    let c = fs.make("/a/b/c", DirEntryType::Regular).unwrap();

    for _ in 0..3 {
        assert_eq!(fs.lookup("/a/b/c"), Ok(c));
        assert_eq!(fs.lookup("/a/b/c/"), Ok(c));
        assert_eq!(fs.lookup("/a/c"), Err(Error::NotFound));
    }
}

#[test]
fn max_size_file() {
    let mut fs = FileSystem::new();
    let inode_id = fs.make("/big", DirEntryType::Regular).unwrap();
    let before = fs.free_blocks() as usize;

    let data: Vec<u8> = (0..MAX_FILE_SIZE).map(|i| (i % 253) as u8).collect();
    assert_eq!(fs.write(inode_id, 0, &data), Ok(MAX_FILE_SIZE));

    let data_blocks = MAX_FILE_SIZE.div_ceil(BLOCK_SIZE);
    let pointer_blocks = INDIRECT1_COUNT + INDIRECT2_COUNT + INDIRECT_COUNT;
    assert_eq!(before - fs.free_blocks() as usize, data_blocks + pointer_blocks);
    assert_eq!(fs.stat(inode_id).unwrap().blocks as usize, data_blocks + pointer_blocks);

    let mut buf = vec![0; MAX_FILE_SIZE];
    assert_eq!(fs.read(inode_id, 0, &mut buf), Ok(MAX_FILE_SIZE));
    assert!(buf == data);

    assert_eq!(fs.append(inode_id, b"x"), Err(Error::FileTooLarge));

    fs.truncate(inode_id, 0).unwrap();
    assert_eq!(fs.free_blocks() as usize, before);
    assert!(fs.referenced_blocks(inode_id).unwrap().is_empty());
}

#[test]
fn blocks_are_never_shared() {
    let mut fs = FileSystem::new();
    let mut inodes = vec![0];
    for (i, size) in [0, 1, 300, 2048, 2049, 18432, 18433, 40_000].into_iter().enumerate() {
        let path = format!("/f{i}");
        let inode_id = fs.make(&path, DirEntryType::Regular).unwrap();
        fs.write(inode_id, 0, &vec![i as u8; size]).unwrap();
        inodes.push(inode_id);
    }
    fs.remove("/f3").unwrap();
    fs.truncate(inodes[7], 5000).unwrap();
    inodes.remove(4);

    let mut seen = HashSet::new();
    for &inode_id in &inodes {
        for block in fs.referenced_blocks(inode_id).unwrap() {
            assert!(fs.is_allocated(block));
            assert!(seen.insert(block), "block {block} referenced twice");
        }
    }
    assert_eq!(seen.len(), DATA_BLOCKS - fs.free_blocks() as usize);
}

#[test]
fn inode_exhaustion() {
    let mut fs = FileSystem::new();
    for i in 1..INODE_COUNT {
        fs.make(&format!("/{i}"), DirEntryType::Regular).unwrap();
    }
    assert_eq!(fs.free_inodes(), 0);

    let blocks = fs.free_blocks();
    assert_eq!(fs.make("/one-more", DirEntryType::Regular), Err(Error::NoSpace));
    assert_eq!(fs.lookup("/one-more"), Err(Error::NotFound));
    assert_eq!(fs.free_blocks(), blocks);

    fs.remove("/7").unwrap();
    assert!(fs.make("/one-more", DirEntryType::Regular).is_ok());
}

#[test]
fn block_exhaustion() {
    let mut fs = FileSystem::new();
    let big = fs.make("/big", DirEntryType::Regular).unwrap();
    let fill = fs.make("/fill", DirEntryType::Regular).unwrap();
    fs.write(big, 0, &vec![1; MAX_FILE_SIZE]).unwrap();

    for chunk in [INDIRECT_COUNT * BLOCK_SIZE, BLOCK_SIZE] {
        while fs.append(fill, &vec![2; chunk]).is_ok() {}
    }
    assert_eq!(fs.append(fill, &[2; BLOCK_SIZE]), Err(Error::NoSpace));

    // 剩下的零星空闲块交给只需一个数据块的小文件
    let mut n = 0;
    while fs.free_blocks() > 0 {
        let small = fs.make(&format!("/s{n}"), DirEntryType::Regular).unwrap();
        fs.write(small, 0, b"s").unwrap();
        n += 1;
    }

    let inodes = fs.free_inodes();
    assert_eq!(fs.make("/late", DirEntryType::Regular), Err(Error::NoSpace));
    assert_eq!(fs.free_inodes(), inodes);
    assert_eq!(fs.lookup("/late"), Err(Error::NotFound));

    fs.remove("/fill").unwrap();
    assert!(fs.free_blocks() > 0);
    assert!(fs.make("/late", DirEntryType::Regular).is_ok());
    fs.check();
}

#[test]
fn shared_between_threads() {
    let fs = FileSystem::new().into_shared();

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let fs = fs.clone();
            thread::spawn(move || {
                let path = format!("/t{t}");
                let inode_id = fs.lock().make(&path, DirEntryType::Regular).unwrap();
                for _ in 0..50 {
                    fs.lock().append(inode_id, &[t; 100]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let fs = fs.lock();
    assert_eq!(fs.list("/").unwrap().len(), 4);
    for t in 0..4u8 {
        let inode_id = fs.lookup(&format!("/t{t}")).unwrap();
        let mut buf = vec![0; 5000];
        assert_eq!(fs.read(inode_id, 0, &mut buf), Ok(5000));
        assert!(buf.iter().all(|&b| b == t));
    }
}
