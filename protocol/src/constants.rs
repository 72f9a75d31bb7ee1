//! 协议常量定义

use std::time::Duration;

/// 默认棋盘边长（15 x 15）
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// 棋盘边长上限，保证格子索引可以放进 u32
pub const MAX_BOARD_SIZE: usize = 255;

/// 默认服务器端口
pub const DEFAULT_PORT: u16 = 12345;

/// 认输/退出哨兵值，永远不是合法的格子索引
pub const FORFEIT_CELL: i32 = -1;

/// 单行消息最大长度（字节）
pub const MAX_LINE_LEN: usize = 4096;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

// === 服务端消息字面量 ===

/// 先手标记
pub const FIRST_SYMBOL: &str = "X";

/// 后手标记
pub const SECOND_SYMBOL: &str = "O";

/// 走子被接受
pub const VALID_MOVE: &str = "Valid move.";

/// 走子被拒绝
pub const INVALID_MOVE: &str = "Invalid move, try again";

/// 对手走子（下一行是格子索引）
pub const OPPONENT_MOVED: &str = "Opponent moved";

/// 对手离开
pub const OPPONENT_LEFT: &str = "Your opponent left";

/// 本方胜
pub const YOU_WIN: &str = "You win";

/// 本方负
pub const YOU_LOSE: &str = "You lose";
