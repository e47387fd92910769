//! # convert 子命令 CLI 定义
//!
//! 把一个计算程序输出文件转换为 Gaussian 格式日志。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use crate::parsers::Dialect;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 支持的源程序格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SourceFormat {
    /// AMESP output (.aop)
    Amesp,
    /// BDF output, including UniMoVib frequency analysis
    Bdf,
    /// xtb Gaussian-format output (g98.out, Gaussian External logs)
    Xtb,
    /// Multi-frame XYZ trajectory
    Xyz,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Amesp => write!(f, "amesp"),
            SourceFormat::Bdf => write!(f, "bdf"),
            SourceFormat::Xtb => write!(f, "xtb"),
            SourceFormat::Xyz => write!(f, "xyz"),
        }
    }
}

impl From<SourceFormat> for Dialect {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Amesp => Dialect::Amesp,
            SourceFormat::Bdf => Dialect::Bdf,
            SourceFormat::Xtb => Dialect::Xtb,
            SourceFormat::Xyz => Dialect::Xyz,
        }
    }
}

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Program that produced the input file
    #[arg(short, long, value_enum)]
    pub from: SourceFormat,

    /// Input file
    pub input: PathBuf,

    /// Output file (default: <input stem>_fake.<ext> next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Vibrational modes per frequency block (1-5, default depends on the source program)
    #[arg(long)]
    pub block_width: Option<usize>,

    /// Write per-step energies and convergence to a CSV file
    #[arg(long)]
    pub energy_csv: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
