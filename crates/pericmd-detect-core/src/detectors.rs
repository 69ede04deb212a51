//! 检测器集合（基于 `regex::bytes`，与文件编码无关）
use anyhow::{Context, Result};
use regex::bytes::Regex;

use crate::profile::FrameworkProfile;

/// 由框架描述编译出的行级匹配器
#[derive(Debug, Clone)]
pub(crate) struct DetectorSet {
    /// shebang 行需包含的解释器子串
    pub(crate) interpreter: Vec<u8>,
    /// 排除指令：整行仅包含 `# NO_<FRAMEWORK>_SCRIPT`
    pub(crate) suppress: Regex,
    /// 包装脚本指令：`# WRAPPED_<FRAMEWORK>_SCRIPT: <program>`，第1个捕获组为程序名
    pub(crate) wrapper: Regex,
    /// use/require 语句，第1个捕获组为命中的模块名
    pub(crate) signature: Regex,
}

impl DetectorSet {
    /// 从框架描述构建检测器集合（所有字面量均经过转义）
    pub(crate) fn from_profile(profile: &FrameworkProfile) -> Result<Self> {
        profile.validate()?;

        let suppress = format!(r"(?m)^[ \t]*#[ \t]*{}[ \t]*\r?$", regex::escape(&profile.directive_name()));
        let wrapper = format!(
            r"(?m)^[ \t]*#[ \t]*{}[ \t]*:[ \t]*(\S+)[ \t]*\r?$",
            regex::escape(&profile.wrapper_directive_name())
        );

        // 变体为固定集合：完整名称按长度降序排列，模块名之后必须是空白、`;`、`(` 或行尾
        let mut names = profile.module_names();
        names.sort_by(|a, b| b.len().cmp(&a.len()));
        let module = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");
        let signature = format!(r"(?m)^[ \t]*(?:use|require)[ \t]+({module})(?:[ \t;(]|\r?$)");

        Ok(Self {
            interpreter: profile.interpreter.trim().as_bytes().to_vec(),
            suppress: Regex::new(&suppress).context("compile suppression directive pattern")?,
            wrapper: Regex::new(&wrapper).context("compile wrapper directive pattern")?,
            signature: Regex::new(&signature).context("compile signature pattern")?,
        })
    }

    /// 查找第一条框架引用语句，返回模块名
    pub(crate) fn find_signature(&self, content: &[u8]) -> Option<String> {
        self.signature
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
    }

    /// 是否存在排除指令
    pub(crate) fn is_suppressed(&self, content: &[u8]) -> bool {
        self.suppress.is_match(content)
    }

    /// 查找包装脚本指令中的程序名
    pub(crate) fn find_wrapped_program(&self, content: &[u8]) -> Option<String> {
        self.wrapper
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
    }
}
