use alloc::vec::Vec;

use vfs::{Error, Result};

use crate::config::{NAME_MAX_LEN, PATH_DELIMITER, PATH_MAX_LEN};

/// 把绝对路径拆成有序的分量。
///
/// 路径必须以`/`开头；末尾的`/`不产生空分量，`/`本身没有分量。
/// 中间出现空分量、分量含 NUL、路径过长或分量过长都视为非法路径。
pub fn parse_path(path: &str) -> Result<Vec<&str>> {
    if path.len() > PATH_MAX_LEN {
        return Err(Error::InvalidPath);
    }

    let relative = path.strip_prefix(PATH_DELIMITER).ok_or(Error::InvalidPath)?;
    let relative = relative.strip_suffix(PATH_DELIMITER).unwrap_or(relative);
    if relative.is_empty() {
        return Ok(Vec::new());
    }

    relative
        .split(PATH_DELIMITER)
        .map(|cmp| {
            if cmp.is_empty() || cmp.len() > NAME_MAX_LEN || cmp.contains('\0') {
                Err(Error::InvalidPath)
            } else {
                Ok(cmp)
            }
        })
        .collect()
}
