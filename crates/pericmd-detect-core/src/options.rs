//! 批量扫描选项与统计信息（模块）

/// 批量扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 目录是否递归遍历（否则只看第一层）
    pub recursive: bool,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 是否也检查没有可执行位的文件
    pub include_noexec: bool,
    /// 是否识别包装脚本
    pub detect_wrapper: bool,
    /// 线程数：None 表示自动（rayon 默认）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            max_file_size: None,
            include_noexec: true,
            detect_wrapper: false,
            threads: None,
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub matches: usize,
}
