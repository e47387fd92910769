//! # 文本源与行游标
//!
//! 解析器不直接读文件：`TextSource` 一次性读入整个日志，
//! `LineCursor` 在行数组上前后移动，支持回退和按标记截取子窗口。
//!
//! ## 依赖关系
//! - 被所有 `parsers/` 子模块使用

use crate::error::{FakegError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 已读入内存的文本文件
#[derive(Debug, Clone)]
pub struct TextSource {
    path: PathBuf,
    lines: Vec<String>,
}

impl TextSource {
    /// 读取文件，非 UTF-8 字节按替换字符处理
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| FakegError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::from_string(path, &text))
    }

    /// 由内存中的字符串构造（测试与管道输入）
    pub fn from_string(path: impl Into<PathBuf>, text: &str) -> Self {
        let lines = text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        TextSource {
            path: path.into(),
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> LineCursor<'_> {
        LineCursor::new(&self.lines)
    }
}

/// 行游标
///
/// `find` 失败时游标停在末尾，调用方据此结束循环。
#[derive(Debug, Clone, Copy)]
pub struct LineCursor<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        LineCursor { lines, pos: 0 }
    }

    /// 读取当前行并前进
    pub fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line.as_str())
    }

    /// 查看当前行，不前进
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).map(|s| s.as_str())
    }

    /// 跳到指定行（超出范围时停在末尾）
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.lines.len());
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// 跳过 n 行
    pub fn skip(&mut self, n: usize) {
        self.seek(self.pos + n);
    }

    /// 前进到包含 `marker` 的行之后，返回该行
    pub fn find(&mut self, marker: &str) -> Option<&'a str> {
        while let Some(line) = self.next_line() {
            if line.contains(marker) {
                return Some(line);
            }
        }
        None
    }

    /// 从当前位置到下一个 `marker` 行（不含）的子游标
    ///
    /// 自身位置不变；没有下一个标记时窗口延伸到末尾。
    pub fn until(&self, marker: &str) -> LineCursor<'a> {
        let rest = &self.lines[self.pos..];
        let end = rest
            .iter()
            .position(|l| l.contains(marker))
            .unwrap_or(rest.len());
        LineCursor::new(&rest[..end])
    }
}
