//! # XYZ 多帧轨迹解析器
//!
//! 每帧格式：
//! ```text
//! 3
//! energy: -5.070544 gnorm: 0.000281
//! O   0.000000   0.000000   0.117790
//! H   0.000000   0.755453  -0.471161
//! H   0.000000  -0.755453  -0.471161
//! ```
//! 每帧视作一个优化步骤；注释行没有可识别能量时记为 -100.0，
//! 轨迹帧一律不收敛。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 分派
//! - 子模块: comment, energy

pub mod comment;
pub mod energy;

use super::cursor::{LineCursor, TextSource};
use super::parse_fortran_float;
use crate::models::element::normalize_symbol;
use crate::models::{Atom, ComputationRecord, OptimizationStep};
use comment::CommentParser;
use tracing::{debug, info};

/// 注释行没有能量时的占位值 (Hartree)
pub const ENERGY_SENTINEL: f64 = -100.0;

pub const KEYWORDS: &[&str] = &["XYZ", "TRJ", "TRAJECTORY"];

/// XYZ 轨迹解析器
#[derive(Debug, Default)]
pub struct XyzParser {
    comments: CommentParser,
}

impl XyzParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, source: &TextSource) -> ComputationRecord {
        self.comments.reset();

        let mut record = ComputationRecord::new();
        let mut cur = source.cursor();
        let mut frame = 0;
        let mut with_energy = 0;

        while let Some(line) = cur.next_line() {
            let Some(count) = atom_count(line) else {
                continue;
            };
            frame += 1;

            let comment = cur.next_line().unwrap_or("");
            let mut step = OptimizationStep::new(frame);
            step.energy = match self.comments.parse(comment, &mut record, frame) {
                Some(e) => {
                    with_energy += 1;
                    e
                }
                None => ENERGY_SENTINEL,
            };
            step.atoms = read_frame_atoms(&mut cur, count);

            let n_atoms = step.atom_count();
            if record.push_step(step, None) {
                debug!("Added frame {} with {} atoms", frame, n_atoms);
            }
        }

        record.has_optimization = record.is_usable();

        if with_energy > 0 {
            let formats: Vec<String> = self
                .comments
                .pipeline()
                .detected()
                .map(|f| f.to_string())
                .collect();
            info!(
                "Energy information available in {} out of {} frames ({})",
                with_energy,
                frame,
                formats.join(", ")
            );
        } else {
            info!("No energy information found in comments, using {:.1}", ENERGY_SENTINEL);
        }

        record
    }
}

/// 原子数行：单个正整数
fn atom_count(line: &str) -> Option<usize> {
    line.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// 最多读取 `count` 行原子；遇到空行或下一帧的原子数行提前结束（不消耗该行）
fn read_frame_atoms(cur: &mut LineCursor, count: usize) -> Vec<Atom> {
    let mut atoms = Vec::with_capacity(count);

    while atoms.len() < count {
        let Some(line) = cur.peek() else { break };
        if line.trim().is_empty() || atom_count(line).is_some() {
            break;
        }
        cur.next_line();

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            continue;
        }
        let coords: Vec<f64> = tokens[1..4]
            .iter()
            .filter_map(|s| parse_fortran_float(s))
            .collect();
        if coords.len() == 3 {
            atoms.push(Atom::new(
                normalize_symbol(tokens[0]),
                [coords[0], coords[1], coords[2]],
            ));
        }
    }

    atoms
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAJECTORY: &str = "3
0 1
O   0.000000   0.000000   0.117790
H   0.000000   0.755453  -0.471161
H   0.000000  -0.755453  -0.471161
3
energy: -5.070544 gnorm: 0.000281 xtb: 6.7.0
8   0.000000   0.000000   0.118000
1   0.000000   0.756000  -0.472000
1   0.000000  -0.756000  -0.472000
3
0 1
O   0.000000   0.000000   0.118100
H   0.000000   0.756100  -0.472100
H   0.000000  -0.756100  -0.472100
";

    fn parse(text: &str) -> ComputationRecord {
        let source = TextSource::from_string("traj.xyz", text);
        XyzParser::new().parse(&source)
    }

    #[test]
    fn test_frames_and_sentinel_energy() {
        let record = parse(TRAJECTORY);

        assert!(record.has_optimization);
        assert_eq!(record.steps.len(), 3);
        assert_eq!(record.steps[0].energy, ENERGY_SENTINEL);
        assert!((record.steps[1].energy + 5.070544).abs() < 1e-12);
        assert_eq!(record.steps[2].energy, -100.0);
        assert!(record.steps.iter().all(|s| !s.converged));
    }

    #[test]
    fn test_numeric_symbols() {
        let record = parse(TRAJECTORY);
        assert_eq!(record.steps[1].atoms[0].symbol(), "O");
        assert_eq!(record.steps[1].atoms[2].atomic_number(), 1);
    }

    #[test]
    fn test_charge_spin_from_first_frame_only() {
        let record = parse(TRAJECTORY);
        assert!(record.has_charge_spin());
        assert_eq!(record.charge_spin().charge, 0);
        assert_eq!(record.charge_spin().multiplicity, 1);

        let text = TRAJECTORY.replacen("0 1", "first frame", 1);
        let record = parse(&text);
        assert!(!record.has_charge_spin());
        assert_eq!(record.charge_spin().multiplicity, 1);
    }

    #[test]
    fn test_short_frame_stops_at_next_count_line() {
        let text = "3
short
C 0.0 0.0 0.0
2
second
H 0.0 0.0 0.0
H 0.0 0.0 0.74
";
        let record = parse(text);

        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[0].atom_count(), 1);
        assert_eq!(record.steps[1].atom_count(), 2);
    }

    #[test]
    fn test_empty_frames_are_dropped() {
        let text = "2
empty frame

2
Energy = -1.17 a.u.
H 0.0 0.0 0.0
H 0.0 0.0 0.74
";
        let record = parse(text);

        assert_eq!(record.steps.len(), 1);
        assert_eq!(record.steps[0].index, 2);
        assert!((record.steps[0].energy + 1.17).abs() < 1e-12);
    }

    #[test]
    fn test_header_only_has_no_geometry() {
        let record = parse("3\ncomment only\n");
        assert!(!record.is_usable());
        assert!(!record.has_optimization);
    }

    #[test]
    fn test_announcements_reset_between_parses() {
        let mut parser = XyzParser::new();
        let source = TextSource::from_string("traj.xyz", TRAJECTORY);

        parser.parse(&source);
        assert_eq!(parser.comments.pipeline().detected().count(), 1);

        let plain = TextSource::from_string("plain.xyz", "1\nno energy\nHe 0 0 0\n");
        parser.parse(&plain);
        assert_eq!(parser.comments.pipeline().detected().count(), 0);
    }
}
