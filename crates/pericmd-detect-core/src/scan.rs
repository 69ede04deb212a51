//! 批量扫描主流程与并行调度
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::engine::Detector;
use crate::options::{ScanOptions, ScanStats};
use crate::types::{DetectionRequest, DetectionResult};

/// 单个文件的扫描结果（对应报告中的一个元素）
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: DetectionResult,
}

/// 展开输入：文件直接保留，目录按选项遍历；同一输入内按路径排序
/// 目录中的符号链接会被跟随（与单文件检测一致），悬空链接保留以便报告 "not a file"
pub fn collect_files(inputs: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            // 非目录（包括不存在的路径）交给检测器给出 "not a file"
            files.push(input.clone());
            continue;
        }
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input).follow_links(true).min_depth(1).max_depth(max_depth) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "walk error");
                    if let Some(p) = e.path().filter(|p| p.is_symlink() && !p.exists()) {
                        found.push(p.to_path_buf());
                    }
                    continue;
                }
            };
            if entry.file_type().is_file() {
                found.push(entry.into_path());
            }
        }
        // 按路径排序，确保输出顺序稳定
        found.sort();
        files.extend(found);
    }
    files
}

/// 扫描多个输入，结果顺序与 `collect_files` 一致
/// 超过 `max_file_size` 的文件不进入结果，只计入 `files_skipped`
pub fn scan_paths(detector: &Detector, inputs: &[PathBuf], opts: &ScanOptions) -> Result<(Vec<ScanEntry>, ScanStats)> {
    let files = collect_files(inputs, opts.recursive);
    info!(files = files.len(), "collected scan targets");

    let run_one = |path: &PathBuf| -> Option<ScanEntry> {
        if too_large(path, opts.max_file_size) {
            debug!(?path, "skipped: exceeds max file size");
            return None;
        }
        let req = DetectionRequest::path(path.clone())
            .include_noexec(opts.include_noexec)
            .detect_wrapper(opts.detect_wrapper);
        Some(ScanEntry { path: path.clone(), result: detector.run(&req) })
    };

    // 决策：线程数为 1 时串行，否则使用 rayon 线程池（collect 保持输入顺序）
    let results: Vec<Option<ScanEntry>> = match opts.threads {
        Some(1) => files.iter().map(run_one).collect(),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("build rayon pool")?;
            pool.install(|| files.par_iter().map(run_one).collect())
        }
        None => files.par_iter().map(run_one).collect(),
    };

    let mut stats = ScanStats::default();
    let mut entries = Vec::with_capacity(results.len());
    for r in results {
        match r {
            Some(entry) => {
                stats.files_scanned += 1;
                if entry.result.is_match {
                    stats.matches += 1;
                }
                entries.push(entry);
            }
            None => stats.files_skipped += 1,
        }
    }
    Ok((entries, stats))
}

/// 将扫描结果以 JSON 数组流式写入 `out`
pub fn write_report(entries: &[ScanEntry], out: &mut dyn Write) -> Result<usize> {
    write!(out, "[")?;
    let mut written = 0;
    for entry in entries {
        if written > 0 {
            write!(out, ",")?;
        }
        serde_json::to_writer(&mut *out, entry)?;
        written += 1;
    }
    write!(out, "]")?;
    Ok(written)
}

fn too_large(path: &Path, max: Option<u64>) -> bool {
    match (max, std::fs::metadata(path)) {
        (Some(max), Ok(md)) => md.len() > max,
        _ => false,
    }
}
