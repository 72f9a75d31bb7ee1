//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::mark::Mark;

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    // === 会话 ===
    /// 分配本方标记（会话开始时发送一次）
    MarkAssigned(Mark),

    // === 走子结果 ===
    /// 上一步被接受
    ValidMove,
    /// 上一步被拒绝，需要重新走
    InvalidMove,
    /// 对手落子
    OpponentMoved { cell: usize },

    // === 终局 ===
    /// 对手离开（本方判胜）
    OpponentLeft,
    /// 本方胜
    YouWin,
    /// 本方负
    YouLose,

    // === 其他 ===
    /// 未识别的文本，原样显示
    Info(String),
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// 在指定格子落子
    Move { cell: usize },
    /// 认输/主动退出
    Forfeit,
}

