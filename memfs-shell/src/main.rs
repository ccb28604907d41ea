mod cli;

use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Write};

use clap::Parser;
use cli::Cli;
use memfs::{DirEntryType, FileSystem, StatKind};

/// 一条命令的执行结果：文件系统错误只报告，不终止脚本
enum Outcome {
    Done,
    Failed(String),
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let script: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut fs = FileSystem::new();
    let mut out = io::stdout().lock();

    for (lineno, line) in script.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        log::debug!("{}: {line}", lineno + 1);
        if let Outcome::Failed(msg) = run(&mut fs, line, &mut out)? {
            eprintln!("{}: {msg}", lineno + 1);
        }
        if cli.verbose {
            writeln!(
                out,
                "  [free inodes={} blocks={}]",
                fs.free_inodes(),
                fs.free_blocks()
            )?;
        }
    }

    Ok(())
}

fn run(fs: &mut FileSystem, line: &str, out: &mut impl Write) -> io::Result<Outcome> {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim_start();
    // 带正文的命令只切出第一个参数，其余原样作为正文
    let (arg, text) = rest.split_once(' ').unwrap_or((rest, ""));

    macro_rules! tri {
        ($e:expr) => {
            match $e {
                Ok(v) => v,
                Err(e) => return Ok(Outcome::Failed(e.to_string())),
            }
        };
    }

    match cmd {
        "mkdir" => {
            tri!(fs.make(arg, DirEntryType::Directory));
        }
        "touch" => {
            tri!(fs.make(arg, DirEntryType::Regular));
        }
        "write" => {
            let inode_id = tri!(fs.lookup(arg));
            tri!(fs.truncate(inode_id, 0));
            tri!(fs.write(inode_id, 0, text.as_bytes()));
        }
        "append" => {
            let inode_id = tri!(fs.lookup(arg));
            tri!(fs.append(inode_id, text.as_bytes()));
        }
        "cat" => {
            let inode_id = tri!(fs.lookup(arg));
            let size = tri!(fs.stat(inode_id)).size as usize;
            let mut buf = vec![0; size];
            let read = tri!(fs.read(inode_id, 0, &mut buf));
            out.write_all(&buf[..read])?;
            writeln!(out)?;
        }
        "truncate" => {
            let Ok(size) = text.trim().parse::<usize>() else {
                return Ok(Outcome::Failed(format!("bad size {text:?}")));
            };
            let inode_id = tri!(fs.lookup(arg));
            tri!(fs.truncate(inode_id, size));
        }
        "rm" => {
            tri!(fs.remove(arg));
        }
        "ls" => {
            let path = if arg.is_empty() { "/" } else { arg };
            for dirent in tri!(fs.list(path)) {
                let suffix = match dirent.ty {
                    DirEntryType::Directory => "/",
                    DirEntryType::Regular => "",
                };
                writeln!(out, "{:>5} {}{suffix}", dirent.inode, dirent.name)?;
            }
        }
        "stat" => {
            let inode_id = tri!(fs.lookup(arg));
            let stat = tri!(fs.stat(inode_id));
            let kind = if stat.kind == StatKind::DIR { "directory" } else { "file" };
            writeln!(
                out,
                "inode={} kind={kind} size={} data_blocks={} blocks={}",
                stat.inode, stat.size, stat.data_blocks, stat.blocks
            )?;
        }
        "import" => {
            let target = text.trim();
            let data = match std::fs::read(arg) {
                Ok(data) => data,
                Err(e) => return Ok(Outcome::Failed(format!("{arg}: {e}"))),
            };
            let inode_id = match fs.lookup(target) {
                Ok(inode_id) => inode_id,
                Err(_) => tri!(fs.make(target, DirEntryType::Regular)),
            };
            tri!(fs.truncate(inode_id, 0));
            let written = tri!(fs.write(inode_id, 0, &data));
            writeln!(out, "{arg} -> {target}: {written} bytes")?;
        }
        "df" => {
            let sb = fs.super_block();
            writeln!(
                out,
                "inodes: {}/{} free, blocks: {}/{} free",
                sb.free_inodes(),
                sb.inode_count,
                sb.free_blocks(),
                sb.data_blocks
            )?;
        }
        _ => return Ok(Outcome::Failed(format!("unknown command {cmd:?}"))),
    }

    Ok(Outcome::Done)
}
