use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pericmd_detect_core::{
    load_profile, scan_paths, write_report, DetectionRequest, DetectionResult, Detector, FrameworkProfile, ScanOptions,
};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "detect-pericmd-script", version, about = "Detect whether a file is a Perinci::CmdLine-based CLI script")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检测单个文件（或标准输入）
    Detect {
        /// 待检测文件
        #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
        path: Option<PathBuf>,

        /// 从标准输入读取脚本内容
        #[arg(long)]
        stdin: bool,

        /// 不检查没有可执行位的文件
        #[arg(long)]
        no_include_noexec: bool,

        /// 识别包装脚本（旧功能）
        #[arg(long)]
        detect_wrapper: bool,

        /// 框架描述文件（TOML），默认 Perinci::CmdLine
        #[arg(long)]
        profile: Option<PathBuf>,

        /// 以 JSON 输出完整结果
        #[arg(long)]
        json: bool,
    },
    /// 批量扫描文件与目录，输出 JSON 数组
    Scan {
        /// 输入文件或目录
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 递归遍历目录
        #[arg(long, short = 'r')]
        recursive: bool,

        /// 线程数（"auto"=rayon 默认）
        #[arg(long, default_value = "auto", value_parser = parse_threads)]
        threads: Threads,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 不检查没有可执行位的文件
        #[arg(long)]
        no_include_noexec: bool,

        /// 识别包装脚本（旧功能）
        #[arg(long)]
        detect_wrapper: bool,

        /// 框架描述文件（TOML）
        #[arg(long)]
        profile: Option<PathBuf>,

        /// 输出文件（默认标准输出）
        #[arg(long)]
        output: Option<PathBuf>,

        /// 只输出命中的文件
        #[arg(long)]
        matches_only: bool,
    },
}

fn main() -> Result<ExitCode> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { path, stdin, no_include_noexec, detect_wrapper, profile, json } => {
            let detector = build_detector(profile.as_deref())?;
            let req = match path {
                Some(path) => DetectionRequest::path(path),
                None if stdin => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf).context("read stdin")?;
                    DetectionRequest::content(buf)
                }
                None => DetectionRequest::default(),
            }
            .include_noexec(!no_include_noexec)
            .detect_wrapper(detect_wrapper);

            let result = detector.run(&req);
            print_result(&result, json)?;
            Ok(ExitCode::from(exit_status(&result)))
        }
        Commands::Scan {
            inputs,
            recursive,
            threads,
            max_file_size,
            no_include_noexec,
            detect_wrapper,
            profile,
            output,
            matches_only,
        } => {
            let detector = build_detector(profile.as_deref())?;
            let opts = ScanOptions {
                recursive,
                max_file_size,
                include_noexec: !no_include_noexec,
                detect_wrapper,
                threads: threads.count(),
            };
            info!(?inputs, ?output, "starting scan");

            let (mut entries, stats) = scan_paths(&detector, &inputs, &opts).context("scan failed")?;
            if matches_only {
                entries.retain(|e| e.result.is_match);
            }

            // 以缓冲方式打开输出，按 JSON 数组流式写入
            let mut out: BufWriter<Box<dyn Write>> = match &output {
                Some(p) => BufWriter::new(Box::new(File::create(p).context("create output file")?)),
                None => BufWriter::new(Box::new(io::stdout().lock())),
            };
            write_report(&entries, &mut out).context("write report")?;
            if output.is_none() {
                writeln!(out)?;
            }
            out.flush().context("flush output")?;

            info!(
                files_scanned = stats.files_scanned,
                files_skipped = stats.files_skipped,
                matches = stats.matches,
                "scan finished"
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 日志：RUST_LOG 控制等级（默认 info），输出到 stderr，stdout 只留给检测结果
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// 加载框架描述并构建检测器
fn build_detector(profile: Option<&Path>) -> Result<Detector> {
    let profile = match profile {
        Some(p) => load_profile(p)?,
        None => FrameworkProfile::default(),
    };
    let detector = Detector::new(profile).context("build detector")?;
    let profile = detector.profile();
    debug!(
        module = %profile.module,
        interpreter = %profile.interpreter,
        directive = %profile.directive_name(),
        "detector ready"
    );
    Ok(detector)
}

fn print_result(result: &DetectionResult, json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, result)?;
        writeln!(out)?;
    } else if result.is_request_error() {
        eprintln!("error: {}", result.message);
    } else {
        writeln!(out, "{}", result.reason)?;
    }
    Ok(())
}

/// 退出码：0 命中，1 未命中，2 请求错误
fn exit_status(result: &DetectionResult) -> u8 {
    if result.is_request_error() {
        2
    } else if result.is_match {
        0
    } else {
        1
    }
}

/// `--threads` 取值："auto" 或正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Threads {
    Auto,
    Fixed(usize),
}

impl Threads {
    fn count(self) -> Option<usize> {
        match self {
            Threads::Auto => None,
            Threads::Fixed(n) => Some(n),
        }
    }
}

fn parse_threads(s: &str) -> Result<Threads, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(Threads::Auto);
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Threads::Fixed(n)),
        _ => Err(format!("expected 'auto' or a positive integer, got '{s}'")),
    }
}
