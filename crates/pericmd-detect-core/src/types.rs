//! 公共类型（对外暴露）
use serde::Serialize;
use std::path::PathBuf;

use crate::verdict::Verdict;

/// HTTP 风格状态码：已完成判定
pub const STATUS_OK: u16 = 200;
/// 调用方请求错误（路径与内容二选一）
pub const STATUS_BAD_REQUEST: u16 = 400;
/// 检测器本身无法构建（例如描述文件非法）
pub const STATUS_INTERNAL: u16 = 500;

/// 检测请求：`file_path` 与 `content` 必须且只能提供一个
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub file_path: Option<PathBuf>,
    pub content: Option<Vec<u8>>,
    /// 是否也检查没有可执行位的文件（默认 true）
    pub include_noexec: bool,
    /// 是否识别包装脚本（旧功能，默认关闭）
    pub detect_wrapper: bool,
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self { file_path: None, content: None, include_noexec: true, detect_wrapper: false }
    }
}

impl DetectionRequest {
    /// 路径模式请求
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self { file_path: Some(path.into()), ..Self::default() }
    }

    /// 内存缓冲模式请求
    pub fn content(content: impl Into<Vec<u8>>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn include_noexec(mut self, yes: bool) -> Self {
        self.include_noexec = yes;
        self
    }

    pub fn detect_wrapper(mut self, yes: bool) -> Self {
        self.detect_wrapper = yes;
        self
    }

    /// 校验输入模式，返回借用的输入源
    pub(crate) fn source(&self) -> Result<Source<'_>, RequestError> {
        match (&self.file_path, &self.content) {
            (Some(p), None) => Ok(Source::Path(p)),
            (None, Some(c)) => Ok(Source::Content(c)),
            (Some(_), Some(_)) => Err(RequestError::Ambiguous),
            (None, None) => Err(RequestError::Missing),
        }
    }
}

/// 已校验的输入源
#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    Path(&'a PathBuf),
    Content(&'a [u8]),
}

/// 请求错误（不是否定判定）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("please specify either file_path or content, not both")]
    Ambiguous,

    #[error("please specify either file_path or content")]
    Missing,
}

impl RequestError {
    pub fn status(&self) -> u16 {
        STATUS_BAD_REQUEST
    }
}

/// 检测结果（对应 JSON 输出的单个对象）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub status: u16,
    pub message: String,
    pub is_match: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_program: Option<PathBuf>,
}

impl DetectionResult {
    /// 是否为请求错误
    pub fn is_request_error(&self) -> bool {
        self.status == STATUS_BAD_REQUEST
    }

    pub(crate) fn error(status: u16, message: String) -> Self {
        Self { status, reason: message.clone(), message, is_match: false, module: None, wrapped_program: None }
    }
}

impl From<Verdict> for DetectionResult {
    fn from(v: Verdict) -> Self {
        Self {
            status: STATUS_OK,
            message: "OK".to_string(),
            is_match: v.is_match,
            reason: v.reason.to_string(),
            module: v.module,
            wrapped_program: v.wrapped_program,
        }
    }
}

impl From<RequestError> for DetectionResult {
    fn from(e: RequestError) -> Self {
        Self::error(e.status(), e.to_string())
    }
}
