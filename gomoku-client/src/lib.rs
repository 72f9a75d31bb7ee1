//! 五子棋终端客户端
//!
//! 回合状态机、会话循环和终端显示

pub mod game;
pub mod network;
pub mod settings;
pub mod view;

pub use game::{ClientGame, Effect, InputCommand, Outcome, Phase};
pub use network::{Session, SessionCommand, SessionEnd, SessionHandle};
pub use settings::{ClientSettings, LogLevel};
pub use view::{BoardView, TerminalView};
