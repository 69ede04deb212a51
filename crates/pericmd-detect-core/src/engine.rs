//! 检测引擎：按顺序执行各项检查，第一个失败的检查决定否定判定
use anyhow::Result;
use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

use crate::detectors::DetectorSet;
use crate::profile::FrameworkProfile;
use crate::types::{DetectionRequest, DetectionResult, RequestError, Source, STATUS_INTERNAL};
use crate::verdict::{Reason, Verdict};
use crate::wrapper::resolve_program;

/// shebang 字节序列
const SHEBANG: &[u8] = b"#!";

/// 框架脚本检测器（无内部可变状态，可跨线程共享）
#[derive(Debug, Clone)]
pub struct Detector {
    profile: FrameworkProfile,
    set: DetectorSet,
}

impl Detector {
    /// 由框架描述构建检测器
    pub fn new(profile: FrameworkProfile) -> Result<Self> {
        let set = DetectorSet::from_profile(&profile)?;
        Ok(Self { profile, set })
    }

    pub fn profile(&self) -> &FrameworkProfile {
        &self.profile
    }

    /// 执行检测；请求错误以 `Err` 返回，所有检查失败均为 `Ok` 的否定判定
    pub fn detect(&self, req: &DetectionRequest) -> Result<Verdict, RequestError> {
        let verdict = match req.source()? {
            Source::Path(path) => self.detect_path(path, req.include_noexec, req.detect_wrapper),
            Source::Content(content) => self.detect_content(content, req.include_noexec, req.detect_wrapper),
        };
        Ok(verdict)
    }

    /// 与 `detect` 相同，但将结果折叠为带状态码的 `DetectionResult`
    pub fn run(&self, req: &DetectionRequest) -> DetectionResult {
        match self.detect(req) {
            Ok(v) => v.into(),
            Err(e) => {
                debug!(error = %e, "invalid detection request");
                e.into()
            }
        }
    }

    fn detect_path(&self, path: &Path, include_noexec: bool, detect_wrapper: bool) -> Verdict {
        let md = match std::fs::metadata(path) {
            Ok(md) if md.is_file() => md,
            _ => return reject(path, Reason::NotAFile),
        };
        if !include_noexec && !is_executable(&md) {
            return reject(path, Reason::NotExecutable);
        }
        self.check_read(path, read_script(path), include_noexec, detect_wrapper)
    }

    /// 打开或读取失败一律视为 "cannot be read"
    fn check_read(
        &self,
        path: &Path,
        read: io::Result<Option<Vec<u8>>>,
        include_noexec: bool,
        detect_wrapper: bool,
    ) -> Verdict {
        match read {
            Ok(Some(content)) => self.check_content(&content, include_noexec, detect_wrapper),
            Ok(None) => reject(path, Reason::NoShebang),
            Err(e) => {
                debug!(?path, error = %e, "read failed");
                reject(path, Reason::CannotRead)
            }
        }
    }

    fn detect_content(&self, content: &[u8], include_noexec: bool, detect_wrapper: bool) -> Verdict {
        self.check_content(content, include_noexec, detect_wrapper)
    }

    /// 内容级检查（路径与缓冲两种模式共用）
    fn check_content(&self, content: &[u8], include_noexec: bool, detect_wrapper: bool) -> Verdict {
        if !content.starts_with(SHEBANG) {
            return Verdict::reject(Reason::NoShebang);
        }

        if detect_wrapper {
            if let Some(program) = self.set.find_wrapped_program(content) {
                return self.follow_wrapper(&program, include_noexec);
            }
        }

        let line = shebang_line(content);
        if !contains(line, &self.set.interpreter) {
            return Verdict::reject(Reason::InterpreterMismatch { interpreter: self.profile.interpreter.clone() });
        }
        trace!("shebang names the expected interpreter");

        if self.set.is_suppressed(content) {
            return Verdict::reject(Reason::Suppressed { directive: self.profile.directive_name() });
        }

        match self.set.find_signature(content) {
            Some(module) => {
                trace!(%module, "signature found");
                Verdict::accept(module)
            }
            None => Verdict::reject(Reason::NoSignature { module: self.profile.module.clone() }),
        }
    }

    /// 跟随包装指令：被包装程序只检测一层，不再识别包装
    fn follow_wrapper(&self, program: &str, include_noexec: bool) -> Verdict {
        let Some(target) = resolve_program(program) else {
            debug!(program, "wrapped program not found");
            return Verdict::reject(Reason::WrappedNotFound { program: program.to_string() });
        };
        debug!(program, target = ?target, "following wrapper");
        let inner = self.detect_path(&target, include_noexec, false);
        Verdict::wrapping(target, inner)
    }
}

/// 使用默认框架描述（Perinci::CmdLine）执行一次检测
pub fn detect(req: &DetectionRequest) -> DetectionResult {
    match Detector::new(FrameworkProfile::default()) {
        Ok(detector) => detector.run(req),
        Err(e) => DetectionResult::error(STATUS_INTERNAL, format!("{e:#}")),
    }
}

fn reject(path: &Path, reason: Reason) -> Verdict {
    debug!(?path, %reason, "not a framework script");
    Verdict::reject(reason)
}

fn read_script(path: &Path) -> io::Result<Option<Vec<u8>>> {
    read_script_from(File::open(path)?)
}

/// 先读 2 字节判断 shebang，通过后回到开头整读。非 shebang 返回 None。
fn read_script_from<R: Read + Seek>(mut reader: R) -> io::Result<Option<Vec<u8>>> {
    let mut prefix = Vec::with_capacity(SHEBANG.len());
    (&mut reader).take(SHEBANG.len() as u64).read_to_end(&mut prefix)?;
    if prefix != SHEBANG {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

/// shebang 行（`#!` 之后到第一个换行）
fn shebang_line(content: &[u8]) -> &[u8] {
    let rest = &content[SHEBANG.len()..];
    let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
    &rest[..end]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(unix)]
fn is_executable(md: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_md: &Metadata) -> bool {
    true
}
