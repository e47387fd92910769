//! # convert 命令实现
//!
//! 把一个计算程序输出文件转换为 Gaussian 格式日志。
//!
//! ## 流程
//! 1. 按 `--from` 选择解析器并检查输入文件
//! 2. 解析为 `ComputationRecord`，打印摘要
//! 3. 确定输出路径（默认 `<stem>_fake.<ext>`），拒绝覆盖已有文件
//! 4. 渲染、检查输出，可选导出能量 CSV
//!
//! 解析失败时不会产生任何输出文件。
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `parsers/`, `render/`, `models/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::convert::ConvertArgs;
use crate::error::{FakegError, Result};
use crate::models::ComputationRecord;
use crate::parsers::{SourceParser, TextSource};
use crate::render::{self, RenderOptions};
use crate::utils::{output, progress};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::{debug, info, warn};

const OUTPUT_SUFFIX: &str = "_fake";
const SUMMARY_ROWS: usize = 10;

/// 摘要表的一行
#[derive(Debug, Clone, Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Energy (Hartree)")]
    energy: String,
    #[tabled(rename = "Converged")]
    converged: String,
}

/// 能量 CSV 的一行
#[derive(Debug, Serialize)]
struct EnergyRow {
    step: usize,
    energy_hartree: f64,
    rms_force: f64,
    max_force: f64,
    rms_displacement: f64,
    max_displacement: f64,
    converged: bool,
}

/// 执行 convert 命令
pub fn execute(args: ConvertArgs, quiet: bool) -> Result<()> {
    let mut parser = SourceParser::for_dialect(args.from.into());
    output::print_header(&format!("Converting {} output", parser.name()));

    let output_path = resolve_output_path(&args.input, args.output.as_deref());

    let mut opts = RenderOptions::for_parser(&parser, &args.input);
    if let Some(width) = args.block_width {
        if !(1..=5).contains(&width) {
            output::print_warning(&format!(
                "Block width {} is out of range, using {}",
                width,
                width.clamp(1, 5)
            ));
        }
        opts = opts.with_block_width(width);
    }

    let spinner = if quiet {
        progress::hidden_spinner()
    } else {
        progress::create_spinner(&format!("Scanning {}", args.input.display()))
    };
    let result = convert_file(&mut parser, &args.input, &output_path, &opts, args.overwrite);
    spinner.finish_and_clear();
    let record = result?;

    print_summary(&record);

    if render::validate_output(&output_path) {
        output::print_conversion(
            &args.input.display().to_string(),
            &output_path.display().to_string(),
        );
    } else {
        output::print_warning(&format!(
            "{} was written but does not look like a complete Gaussian log",
            output_path.display()
        ));
    }

    if let Some(csv_path) = &args.energy_csv {
        save_energy_csv(&record, csv_path)?;
        output::print_success(&format!("Step energies saved to '{}'", csv_path.display()));
    }

    output::print_done(&format!(
        "Converted {} step(s) from {}",
        record.steps.len(),
        parser.name()
    ));

    Ok(())
}

/// 解析输入并写出 Gaussian 格式文件
///
/// 解析成功之前不会创建或修改任何文件。
pub fn convert_file(
    parser: &mut SourceParser,
    input: &Path,
    output_path: &Path,
    opts: &RenderOptions,
    overwrite: bool,
) -> Result<ComputationRecord> {
    if !parser.validate(input) {
        return Err(FakegError::FileNotFound {
            path: input.display().to_string(),
        });
    }

    if same_file(input, output_path) {
        return Err(FakegError::InvalidArgument(format!(
            "output path '{}' would overwrite the input file",
            output_path.display()
        )));
    }

    let source = TextSource::open(input)?;
    let record = parser.parse(&source)?;
    info!(
        "Parsed {} step(s), {} mode(s) with the {} {} parser",
        record.steps.len(),
        record.modes.len(),
        parser.name(),
        parser.version()
    );
    debug!("Recognized markers: {}", parser.supported_keywords().join(", "));

    if output_path.exists() && !overwrite {
        return Err(FakegError::OutputExists {
            path: output_path.display().to_string(),
        });
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FakegError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    render::render(&record, output_path, opts)?;
    if !render::validate_output(output_path) {
        warn!("Output check failed for {}", output_path.display());
    }

    Ok(record)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// 打印解析摘要与最后若干步的表格
fn print_summary(record: &ComputationRecord) {
    let cs = record.charge_spin();
    output::print_info(&format!(
        "{} step(s), {} atom(s), charge {} multiplicity {}",
        record.steps.len(),
        record.last_atom_count(),
        cs.charge,
        cs.multiplicity
    ));

    let excited: usize = record.tddft.iter().map(|b| b.states.len()).sum();
    if excited > 0 {
        output::print_info(&format!("{} excited state(s)", excited));
    }
    if let Some(state) = record.tddft.iter().rev().find_map(|b| b.tracked_state()) {
        output::print_info(&format!(
            "Optimized on excited state {} ({:.4} eV)",
            state.index, state.energy_ev
        ));
    }
    if record.has_frequencies {
        output::print_info(&format!("{} vibrational mode(s)", record.modes.len()));
    }
    if record.has_thermo() {
        output::print_info("Thermochemistry found");
    }

    let skip = record.steps.len().saturating_sub(SUMMARY_ROWS);
    let rows: Vec<StepRow> = record
        .steps
        .iter()
        .skip(skip)
        .map(|s| StepRow {
            step: s.index,
            atoms: s.atom_count(),
            energy: format!("{:.9}", s.energy),
            converged: if s.converged { "yes" } else { "no" }.to_string(),
        })
        .collect();

    if skip > 0 {
        output::print_info(&format!("Last {} steps:", SUMMARY_ROWS));
    }
    println!("{}", Table::new(&rows));
}

/// 保存每一步的能量与收敛指标
fn save_energy_csv(record: &ComputationRecord, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for step in &record.steps {
        let c = &step.convergence;
        wtr.serialize(EnergyRow {
            step: step.index,
            energy_hartree: step.energy,
            rms_force: c.rms_force,
            max_force: c.max_force,
            rms_displacement: c.rms_displacement,
            max_displacement: c.max_displacement,
            converged: step.converged,
        })?;
    }

    wtr.flush().map_err(|e| FakegError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 输出路径（显式给定或由输入派生）
pub fn resolve_output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| render::derive_output_path(input, OUTPUT_SUFFIX))
}
