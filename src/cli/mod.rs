//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: 把计算程序输出转换为 Gaussian 格式日志
//! - `check`: 检查生成的日志是否完整
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, check

pub mod check;
pub mod convert;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FakeG - 把量子化学程序输出伪装成 Gaussian 日志
#[derive(Parser)]
#[command(name = "fakeg")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Convert AMESP, BDF, xtb and XYZ trajectory output into Gaussian-style log files",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug diagnostics
    #[arg(long, global = true, env = "FAKEG_DEBUG", default_value_t = false)]
    pub debug: bool,

    /// Suppress diagnostics and progress output
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Also write diagnostics to this file
    #[arg(long, global = true, env = "FAKEG_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a quantum chemistry output file into a Gaussian-style log
    Convert(convert::ConvertArgs),

    /// Check that a generated log file is complete
    Check(check::CheckArgs),
}
