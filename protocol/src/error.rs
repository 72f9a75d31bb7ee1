//! 错误类型定义

use thiserror::Error;

use crate::mark::Mark;

/// 棋盘规则错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 目标格已有棋子（本地镜像与服务端不一致）
    #[error("Illegal cell state: ({row}, {col}) already holds {existing:?}, refusing to place {incoming:?}")]
    IllegalCellState {
        row: usize,
        col: usize,
        existing: Mark,
        incoming: Mark,
    },

    /// 格子索引超出棋盘范围
    #[error("Cell {index} out of range for a {size}x{size} board")]
    CellOutOfRange { index: i64, size: usize },

    /// 无效的棋盘边长
    #[error("Invalid board size: {size} (must be 1..={max})")]
    InvalidBoardSize { size: usize, max: usize },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误（传输层故障）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 无法解析的消息
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 棋盘规则错误
    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

impl ProtocolError {
    /// 构造 MalformedMessage
    pub fn malformed(reason: impl Into<String>) -> Self {
        ProtocolError::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// 是否可以跳过该行继续读取
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::MalformedMessage { .. })
    }
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
