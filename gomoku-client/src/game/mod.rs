//! 游戏逻辑模块
//!
//! 管理回合状态和本地输入

mod input;
mod state;

pub use input::*;
pub use state::*;

use protocol::{ClientMessage, Mark};

/// 状态机产生的副作用
///
/// 由会话层依次执行：发送到服务端、通知显示层或关闭连接。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// 发送消息到服务端
    Send(ClientMessage),
    /// 本方标记已分配
    IdentityAssigned(Mark),
    /// 棋盘格子变化
    BoardChanged { row: usize, col: usize, mark: Mark },
    /// 状态栏文字
    Status(String),
    /// 关闭连接
    Close,
}
