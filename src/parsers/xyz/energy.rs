//! # XYZ 注释行能量提取
//!
//! 不同程序在 XYZ 轨迹注释行里写能量的方式不同：
//! - ORCA: `Coordinates from ORCA-job water E -76.328924`
//! - molclus: `Energy =   -147.48410656 a.u.  #Cluster:    1`
//! - xtb: `energy: -149.706157544781 gnorm: 0.000492`
//!
//! 按固定优先级依次尝试，第一个匹配的格式胜出。
//! 每种格式在一次解析中只提示一次。
//!
//! ## 依赖关系
//! - 被 `parsers/xyz/comment.rs` 使用
//! - 使用 `regex`

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

static ORCA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Coordinates\s+from\s+ORCA-job\s+.+\s+E\s+([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)")
        .unwrap()
});

static MOLCLUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Energy\s*=\s*([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)\s*a\.u\.").unwrap()
});

static XTB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"energy:\s*([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)").unwrap()
});

/// 注释行能量格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyFormat {
    Orca,
    Molclus,
    Xtb,
}

impl std::fmt::Display for EnergyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyFormat::Orca => write!(f, "ORCA"),
            EnergyFormat::Molclus => write!(f, "molclus"),
            EnergyFormat::Xtb => write!(f, "xtb"),
        }
    }
}

impl EnergyFormat {
    fn pattern(&self) -> &'static Regex {
        match self {
            EnergyFormat::Orca => &ORCA_PATTERN,
            EnergyFormat::Molclus => &MOLCLUS_PATTERN,
            EnergyFormat::Xtb => &XTB_PATTERN,
        }
    }

    /// 单一格式的提取
    pub fn extract(&self, comment: &str) -> Option<f64> {
        let caps = self.pattern().captures(comment)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

/// 按优先级排列的提取器列表
#[derive(Debug)]
pub struct EnergyPipeline {
    formats: Vec<EnergyFormat>,
    announced: HashSet<EnergyFormat>,
}

impl Default for EnergyPipeline {
    fn default() -> Self {
        EnergyPipeline {
            formats: vec![EnergyFormat::Orca, EnergyFormat::Molclus, EnergyFormat::Xtb],
            announced: HashSet::new(),
        }
    }
}

impl EnergyPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新的一次解析开始前清空已提示的格式
    pub fn reset(&mut self) {
        self.announced.clear();
    }

    /// 依次尝试各格式，返回第一个匹配的能量
    pub fn extract(&mut self, comment: &str) -> Option<f64> {
        let (format, energy) = self
            .formats
            .iter()
            .find_map(|fmt| fmt.extract(comment).map(|e| (*fmt, e)))?;

        if self.announced.insert(format) {
            info!(">> Detected {} output format - energy information available", format);
        }
        debug!("Extracted {} energy: {}", format, energy);
        Some(energy)
    }

    /// 本次解析中已识别的格式
    pub fn detected(&self) -> impl Iterator<Item = &EnergyFormat> {
        self.announced.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_format() {
        assert_eq!(
            EnergyFormat::Orca.extract("Coordinates from ORCA-job water E -76.328924"),
            Some(-76.328924)
        );
        assert_eq!(
            EnergyFormat::Molclus.extract("Energy =   -147.48410656 a.u.  #Cluster:    1"),
            Some(-147.48410656)
        );
        assert_eq!(
            EnergyFormat::Xtb.extract(" energy: -149.706157544781 gnorm: 0.000492 xtb: 6.7.0"),
            Some(-149.706157544781)
        );
        assert_eq!(EnergyFormat::Xtb.extract("no energy here"), None);
    }

    #[test]
    fn test_vendor_pattern_wins_over_earlier_numbers() {
        let mut pipeline = EnergyPipeline::new();

        // 行首的数字与 xtb 标记都不应被选中
        let comment = "12 3.5 Coordinates from ORCA-job opt E -687.545427056709 energy: -1.0";
        assert_eq!(pipeline.extract(comment), Some(-687.545427056709));

        let comment = "frame 7 energy: -5.0 Energy = -147.25 a.u.";
        assert_eq!(pipeline.extract(comment), Some(-147.25));
    }

    #[test]
    fn test_announce_once_and_reset() {
        let mut pipeline = EnergyPipeline::new();

        pipeline.extract("energy: -1.5");
        pipeline.extract("energy: -1.6");
        assert_eq!(pipeline.detected().count(), 1);

        pipeline.extract("Energy = -2.0 a.u.");
        assert_eq!(pipeline.detected().count(), 2);

        pipeline.reset();
        assert_eq!(pipeline.detected().count(), 0);
    }

    #[test]
    fn test_no_match() {
        let mut pipeline = EnergyPipeline::new();
        assert_eq!(pipeline.extract("0 1"), None);
        assert_eq!(pipeline.extract(""), None);
    }
}
