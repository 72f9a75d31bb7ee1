//! 网络会话模块
//!
//! 一个读取任务阻塞在连接上，把解码后的服务端消息送进会话队列；
//! 本地输入通过 [`SessionHandle`] 送进同一个队列。会话任务是状态机
//! 唯一的持有者，所有修改按到达顺序串行执行。

mod session;

pub use session::*;

use protocol::ServerMessage;
use tokio::sync::mpsc;

/// 会话队列中的命令
#[derive(Debug)]
pub enum SessionCommand {
    /// 读取任务送来的服务端消息或读取错误
    Server(protocol::Result<ServerMessage>),
    /// 选择格子
    SelectCell(usize),
    /// 提交已选格子
    SubmitMove,
    /// 选择并提交
    Play(usize),
    /// 认输并关闭连接
    Forfeit,
}

/// 会话结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// 对端关闭连接
    Closed,
    /// 本方认输
    Forfeited,
    /// 传输层故障
    Failed(String),
}

/// 本地输入句柄（可克隆）
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SessionCommand>) -> Self {
        Self { tx }
    }

    /// 选择格子，会话已结束时返回 false
    pub fn select_cell(&self, index: usize) -> bool {
        self.send(SessionCommand::SelectCell(index))
    }

    /// 提交已选格子
    pub fn submit_move(&self) -> bool {
        self.send(SessionCommand::SubmitMove)
    }

    /// 选择并提交
    pub fn play(&self, index: usize) -> bool {
        self.send(SessionCommand::Play(index))
    }

    /// 认输并关闭连接
    pub fn forfeit(&self) -> bool {
        self.send(SessionCommand::Forfeit)
    }

    fn send(&self, cmd: SessionCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }
}
