//! 包装脚本：解析被包装程序的位置
use std::path::{Path, PathBuf};

/// 在 PATH 中查找被包装的程序；带路径分隔符的名称按原样使用
pub(crate) fn resolve_program(program: &str) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    which::which(program).ok()
}
