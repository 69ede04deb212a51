//! 判定结果与原因
use std::fmt;
use std::path::PathBuf;

/// 判定原因（每个检查步骤对应一个否定原因，另有一个肯定原因）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    NotAFile,
    NotExecutable,
    CannotRead,
    NoShebang,
    InterpreterMismatch { interpreter: String },
    Suppressed { directive: String },
    NoSignature { module: String },
    WrappedNotFound { program: String },
    /// 包装脚本：`inner` 为被包装程序的判定原因
    Wraps { target: PathBuf, inner: Box<Reason> },
    Signature { module: String },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NotAFile => f.write_str("not a file"),
            Reason::NotExecutable => f.write_str("not executable"),
            Reason::CannotRead => f.write_str("cannot be read"),
            Reason::NoShebang => f.write_str("does not start with a shebang sequence"),
            Reason::InterpreterMismatch { interpreter } => {
                write!(f, "shebang line does not name the expected interpreter ({interpreter})")
            }
            Reason::Suppressed { .. } => f.write_str("explicitly marked as excluded via directive"),
            Reason::NoSignature { .. } => f.write_str("no statement invoking the expected framework found"),
            Reason::WrappedNotFound { program } => write!(f, "wrapped program '{program}' not found in PATH"),
            Reason::Wraps { target, inner } => write!(f, "wraps {}: {inner}", target.display()),
            Reason::Signature { module } => write!(f, "found statement invoking {module}"),
        }
    }
}

/// 单次检测的判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_match: bool,
    pub reason: Reason,
    /// 命中的框架模块（仅肯定判定）
    pub module: Option<String>,
    /// 跟随包装指令解析到的程序路径
    pub wrapped_program: Option<PathBuf>,
}

impl Verdict {
    pub(crate) fn reject(reason: Reason) -> Self {
        Self { is_match: false, reason, module: None, wrapped_program: None }
    }

    pub(crate) fn accept(module: String) -> Self {
        Self {
            is_match: true,
            reason: Reason::Signature { module: module.clone() },
            module: Some(module),
            wrapped_program: None,
        }
    }

    /// 将被包装程序的判定提升为外层判定
    pub(crate) fn wrapping(target: PathBuf, inner: Verdict) -> Self {
        Self {
            is_match: inner.is_match,
            reason: Reason::Wraps { target: target.clone(), inner: Box::new(inner.reason) },
            module: inner.module,
            wrapped_program: Some(target),
        }
    }
}
