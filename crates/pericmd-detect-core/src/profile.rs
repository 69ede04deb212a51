//! 框架描述文件加载（TOML）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 默认目标框架：Perl 的 Perinci::CmdLine 家族
pub const DEFAULT_MODULE: &str = "Perinci::CmdLine";
/// 默认识别的子命名空间后缀（固定集合，不是通配）
pub const DEFAULT_VARIANTS: &[&str] = &["Any", "Lite"];
/// 默认解释器标识（shebang 行中需包含的子串）
pub const DEFAULT_INTERPRETER: &str = "perl";

/// 描述文件校验错误
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("invalid module name '{0}': expected identifiers separated by '::'")]
    InvalidModule(String),

    #[error("invalid variant suffix '{0}': expected a single identifier")]
    InvalidVariant(String),

    #[error("interpreter must not be empty")]
    EmptyInterpreter,

    #[error("invalid directive name '{0}': expected [A-Za-z0-9_]+")]
    InvalidDirective(String),
}

/// 目标框架描述（可由 TOML 文件提供）
///
/// ```toml
/// module = "Perinci::CmdLine"
/// variants = ["Any", "Lite"]
/// interpreter = "perl"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameworkProfile {
    /// 框架基础模块名（命名空间以 `::` 分隔）
    pub module: String,
    /// 允许的变体后缀，例如 `Lite` 对应 `Perinci::CmdLine::Lite`
    #[serde(default)]
    pub variants: Vec<String>,
    /// shebang 行需要包含的解释器名
    pub interpreter: String,
    /// 排除指令名；为空时由模块名推导（`NO_<FRAMEWORK>_SCRIPT`）
    #[serde(default)]
    pub directive: Option<String>,
    /// 包装脚本指令名；为空时由模块名推导（`WRAPPED_<FRAMEWORK>_SCRIPT`）
    #[serde(default)]
    pub wrapper_directive: Option<String>,
}

impl Default for FrameworkProfile {
    fn default() -> Self {
        Self {
            module: DEFAULT_MODULE.to_string(),
            variants: DEFAULT_VARIANTS.iter().map(|s| s.to_string()).collect(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            directive: None,
            wrapper_directive: None,
        }
    }
}

impl FrameworkProfile {
    /// 以模块名和解释器构建描述（无变体）
    pub fn new(module: impl Into<String>, interpreter: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            variants: Vec::new(),
            interpreter: interpreter.into(),
            directive: None,
            wrapper_directive: None,
        }
    }

    /// 追加变体后缀
    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants.extend(variants.into_iter().map(Into::into));
        self
    }

    /// 框架的大写下划线形式：`Perinci::CmdLine` → `PERINCI_CMDLINE`
    pub fn framework_tag(&self) -> String {
        self.module.split("::").collect::<Vec<_>>().join("_").to_ascii_uppercase()
    }

    /// 排除指令名（不含 `#`）
    pub fn directive_name(&self) -> String {
        match &self.directive {
            Some(d) => d.clone(),
            None => format!("NO_{}_SCRIPT", self.framework_tag()),
        }
    }

    /// 包装脚本指令名（不含 `#` 与 `:`）
    pub fn wrapper_directive_name(&self) -> String {
        match &self.wrapper_directive {
            Some(d) => d.clone(),
            None => format!("WRAPPED_{}_SCRIPT", self.framework_tag()),
        }
    }

    /// 基础模块与全部变体的完整名称（基础名在前）
    pub fn module_names(&self) -> Vec<String> {
        let mut out = vec![self.module.clone()];
        out.extend(self.variants.iter().map(|v| format!("{}::{}", self.module, v)));
        out
    }

    /// 校验字段合法性
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.module.is_empty() || !self.module.split("::").all(is_ident) {
            return Err(ProfileError::InvalidModule(self.module.clone()));
        }
        if let Some(v) = self.variants.iter().find(|v| !is_ident(v)) {
            return Err(ProfileError::InvalidVariant(v.clone()));
        }
        if self.interpreter.trim().is_empty() {
            return Err(ProfileError::EmptyInterpreter);
        }
        for name in [self.directive_name(), self.wrapper_directive_name()] {
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(ProfileError::InvalidDirective(name));
            }
        }
        Ok(())
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// 解析 TOML 文本为描述并校验
pub fn parse_profile(txt: &str) -> Result<FrameworkProfile> {
    let profile: FrameworkProfile = toml::from_str(txt).context("parse framework profile")?;
    profile.validate()?;
    Ok(profile)
}

/// 从 TOML 文件加载框架描述
pub fn load_profile(path: &Path) -> Result<FrameworkProfile> {
    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("read profile {}", path.display()))?;
    parse_profile(&txt)
}
