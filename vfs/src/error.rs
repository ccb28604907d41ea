use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    AlreadyExists,
    NotFound,
    NotADirectory,
    NotAFile,
    DirectoryNotEmpty,
    /// 索引节点表或数据块位图已耗尽
    NoSpace,
    /// 缺少开头的`/`、出现空分量或超出长度限制
    InvalidPath,
    FileTooLarge,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AlreadyExists => "file exists",
            Self::NotFound => "no such file or directory",
            Self::NotADirectory => "not a directory",
            Self::NotAFile => "is a directory",
            Self::DirectoryNotEmpty => "directory not empty",
            Self::NoSpace => "no space left on device",
            Self::InvalidPath => "invalid path",
            Self::FileTooLarge => "file too large",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}
