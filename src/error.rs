//! 错误类型定义

use crate::validation::ValidationReport;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("空矩阵")]
    EmptyMatrix,

    #[error("行长度不一致: 第 {row} 行有 {found} 列, 期望 {expected} 列")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("矩阵不是方阵: {rows} 行, {cols} 列")]
    NotSquare { rows: usize, cols: usize },

    #[error("矩阵过大: {size}x{size}, 最大允许 {max}x{max}")]
    MatrixTooLarge { size: usize, max: usize },

    #[error("无效的数值 ({row},{col}): \"{value}\"")]
    InvalidCell {
        row: usize,
        col: usize,
        value: String,
    },

    #[error("未知算法: {0}")]
    UnknownAlgorithm(String),

    #[error("校验失败: {}", .0.errors.join(" | "))]
    Validation(ValidationReport),

    #[error("播放错误: {0}")]
    PlaybackError(String),

    #[error("服务器错误: {0}")]
    ServerError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
