//! # XYZ 注释行解析
//!
//! 每帧的注释行可能携带：
//! - 电荷与自旋多重度（仅第一帧，且整行恰为两个整数，如 `0 1`）
//! - 能量（交给 `energy.rs` 的提取器列表）
//!
//! ## 依赖关系
//! - 被 `parsers/xyz/mod.rs` 使用
//! - 使用 `parsers/xyz/energy.rs`

use super::energy::EnergyPipeline;
use crate::models::ComputationRecord;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct CommentParser {
    pipeline: EnergyPipeline,
}

impl CommentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    pub fn pipeline(&self) -> &EnergyPipeline {
        &self.pipeline
    }

    /// 解析一帧的注释行，返回能量（如果有）
    pub fn parse(&mut self, comment: &str, record: &mut ComputationRecord, frame: usize) -> Option<f64> {
        if frame == 1 {
            try_charge_spin(comment, record);
        }
        self.pipeline.extract(comment)
    }
}

fn try_charge_spin(comment: &str, record: &mut ComputationRecord) {
    if record.has_charge_spin() {
        return;
    }

    let tokens: Vec<&str> = comment.split_whitespace().collect();
    let [charge, mult] = tokens.as_slice() else {
        return;
    };

    match (charge.parse::<i32>(), mult.parse::<i32>()) {
        (Ok(c), Ok(m)) => {
            record.set_charge_spin(c, m);
            info!("Extracted charge: {}, spin: {} from first frame", c, m);
        }
        _ => debug!("First comment line is not a charge/spin pair"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChargeSpin;

    #[test]
    fn test_charge_spin_on_first_frame() {
        let mut parser = CommentParser::new();
        let mut record = ComputationRecord::new();

        assert_eq!(parser.parse("  0 1  ", &mut record, 1), None);
        assert!(record.has_charge_spin());
        assert_eq!(
            record.charge_spin(),
            ChargeSpin {
                charge: 0,
                multiplicity: 1
            }
        );
    }

    #[test]
    fn test_charge_spin_ignored_after_first_frame() {
        let mut parser = CommentParser::new();
        let mut record = ComputationRecord::new();

        parser.parse("water", &mut record, 1);
        parser.parse("-1 2", &mut record, 2);
        assert!(!record.has_charge_spin());

        let mut record = ComputationRecord::new();
        parser.parse("1 2", &mut record, 1);
        parser.parse("0 1", &mut record, 2);
        assert_eq!(record.charge_spin().charge, 1);
        assert_eq!(record.charge_spin().multiplicity, 2);
    }

    #[test]
    fn test_non_integer_pairs_rejected() {
        let mut parser = CommentParser::new();

        for comment in ["0.0 1", "0 1 extra", "a b", "1"] {
            let mut record = ComputationRecord::new();
            parser.parse(comment, &mut record, 1);
            assert!(!record.has_charge_spin(), "{comment}");
        }
    }

    #[test]
    fn test_energy_passthrough() {
        let mut parser = CommentParser::new();
        let mut record = ComputationRecord::new();

        let energy = parser.parse("energy: -40.5 gnorm: 0.01", &mut record, 1);
        assert_eq!(energy, Some(-40.5));
        assert!(!record.has_charge_spin());
    }
}
