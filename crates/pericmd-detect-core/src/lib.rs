//! 命令行框架脚本检测库
//!
//! 判断一个文件（或内存缓冲）是否为基于某个 CLI 框架家族（默认 Perl 的 `Perinci::CmdLine`）
//! 编写的命令行脚本，并给出可读的原因。
//!
//! 检查顺序（第一个失败的检查决定否定判定）：
//! - 路径模式：是否普通文件 → 可执行位（可选）→ 能否读取
//! - shebang（`#!`）→ 解释器 → 排除指令 `# NO_<FRAMEWORK>_SCRIPT` → use/require 语句
//!
//! 请求错误（路径与内容都给或都不给）通过 `RequestError` / 状态码 400 返回，不与否定判定混淆。

mod options;
mod types;
mod verdict;
mod profile;
mod detectors;
mod wrapper;
mod engine;
mod scan;

pub use options::{ScanOptions, ScanStats};
pub use types::{DetectionRequest, DetectionResult, RequestError, STATUS_BAD_REQUEST, STATUS_INTERNAL, STATUS_OK};
pub use verdict::{Reason, Verdict};
pub use profile::{load_profile, parse_profile, FrameworkProfile, ProfileError};
pub use engine::{detect, Detector};
pub use scan::{collect_files, scan_paths, write_report, ScanEntry};
