//! # 日志初始化
//!
//! 安装 `tracing-subscriber`：终端输出到 stderr，可选同时写入日志文件。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `tracing-subscriber` crate

use crate::error::{FakegError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// 终端日志级别：默认 INFO，`--debug` 为 DEBUG，`--quiet` 关闭
pub fn level_for(debug: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::OFF
    } else if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

pub fn setup_logging(debug: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(level_for(debug, quiet));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| FakegError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
            let level = if debug {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| FakegError::LoggingError(e.to_string()))
}
