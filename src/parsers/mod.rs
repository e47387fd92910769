//! # 解析器模块
//!
//! 把各量子化学程序的输出日志解析为统一的 `ComputationRecord`。
//!
//! ## 支持的程序
//! - AMESP (`.aop`)
//! - BDF (`.out`，含 UniMoVib 频率分析)
//! - xtb / Gaussian 风格日志 (`g98.out`、External 调用日志)
//! - XYZ 多帧轨迹（注释行中可含能量）
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `render/` 的测试使用
//! - 使用 `models/` 数据模型
//! - 子模块: cursor, amesp, bdf, xtb, xyz

pub mod amesp;
pub mod bdf;
pub mod cursor;
pub mod xtb;
pub mod xyz;

pub use cursor::{LineCursor, TextSource};

use crate::error::{FakegError, Result};
use crate::models::ComputationRecord;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 源程序类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Amesp,
    Bdf,
    Xtb,
    Xyz,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Amesp => write!(f, "AMESP"),
            Dialect::Bdf => write!(f, "BDF"),
            Dialect::Xtb => write!(f, "xtb"),
            Dialect::Xyz => write!(f, "XYZ"),
        }
    }
}

/// 解析器（封闭集合，按源程序分派）
#[derive(Debug)]
pub enum SourceParser {
    Amesp(amesp::AmespParser),
    Bdf(bdf::BdfParser),
    Xtb(xtb::XtbParser),
    Xyz(xyz::XyzParser),
}

impl SourceParser {
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Amesp => SourceParser::Amesp(amesp::AmespParser::new()),
            Dialect::Bdf => SourceParser::Bdf(bdf::BdfParser::new()),
            Dialect::Xtb => SourceParser::Xtb(xtb::XtbParser::new()),
            Dialect::Xyz => SourceParser::Xyz(xyz::XyzParser::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            SourceParser::Amesp(_) => Dialect::Amesp,
            SourceParser::Bdf(_) => Dialect::Bdf,
            SourceParser::Xtb(_) => Dialect::Xtb,
            SourceParser::Xyz(_) => Dialect::Xyz,
        }
    }

    /// 解析整个文件；没有任何含原子的步骤时返回错误
    pub fn parse(&mut self, source: &TextSource) -> Result<ComputationRecord> {
        debug!(
            "Parsing {} with {} parser ({} lines)",
            source.path().display(),
            self.name(),
            source.lines().len()
        );

        let record = match self {
            SourceParser::Amesp(p) => p.parse(source),
            SourceParser::Bdf(p) => p.parse(source),
            SourceParser::Xtb(p) => p.parse(source),
            SourceParser::Xyz(p) => p.parse(source),
        };

        if !record.is_usable() {
            return Err(FakegError::NoGeometry {
                parser: self.name().to_string(),
                path: source.path().display().to_string(),
            });
        }

        Ok(record)
    }

    /// 仅检查文件能否打开，不检查内容
    pub fn validate(&self, path: &Path) -> bool {
        File::open(path).is_ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceParser::Amesp(_) => "AMESP",
            SourceParser::Bdf(_) => "BDF",
            SourceParser::Xtb(_) => "xtb",
            SourceParser::Xyz(_) => "XYZ",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            SourceParser::Amesp(_) => "2.1",
            SourceParser::Bdf(_) => "2023",
            SourceParser::Xtb(_) => "6.7",
            SourceParser::Xyz(_) => "1.0",
        }
    }

    /// 该解析器识别的关键标记
    pub fn supported_keywords(&self) -> &'static [&'static str] {
        match self {
            SourceParser::Amesp(_) => amesp::KEYWORDS,
            SourceParser::Bdf(_) => bdf::KEYWORDS,
            SourceParser::Xtb(_) => xtb::KEYWORDS,
            SourceParser::Xyz(_) => xyz::KEYWORDS,
        }
    }

    /// 输出振动模式时每块的列数
    pub fn preferred_block_width(&self) -> usize {
        match self {
            SourceParser::Amesp(_) => 5,
            _ => 3,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 各解析器共用的行内提取函数
// ─────────────────────────────────────────────────────────────

/// 提取 `=` 之后的第一个数字
pub(crate) fn extract_value_after_eq(s: &str) -> Option<f64> {
    extract_number_after(s, "=")
}

/// 提取指定标记之后的第一个数字
pub(crate) fn extract_number_after(s: &str, marker: &str) -> Option<f64> {
    let pos = s.find(marker)?;
    let after = &s[pos + marker.len()..];
    parse_fortran_float(after.split_whitespace().next()?)
}

/// 提取一行中所有可解析的数字
pub(crate) fn numbers_in(s: &str) -> Vec<f64> {
    s.split_whitespace().filter_map(parse_fortran_float).collect()
}

/// 解析浮点数，兼容 Fortran 的 `D` 指数
pub(crate) fn parse_fortran_float(token: &str) -> Option<f64> {
    let token = token.trim_end_matches([',', ';']);
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "E").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// 形如 `-------` 的分隔线
pub(crate) fn is_dash_line(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 3 && t.chars().all(|c| c == '-')
}
