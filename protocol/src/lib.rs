//! 网格对弈共享协议库
//!
//! 包含:
//! - 标记、位置、棋盘等核心数据结构
//! - 消息类型定义 (ServerMessage, ClientMessage)
//! - 行文本编解码 (decode / encode)
//! - 传输层抽象 (Connector, Connection traits) 与按行读写

mod board;
mod codec;
mod constants;
mod error;
mod mark;
mod message;
mod transport;

pub use board::Board;
pub use codec::{decode, decode_message, decode_opponent_move, encode, encode_forfeit, encode_move, Decoded};
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use mark::{Mark, Position};
pub use message::{ClientMessage, ServerMessage};
pub use transport::{
    Connection, Connector,
    TcpConnection, TcpConnector,
    NetworkConfig,
    LineReader, LineWriter,
};
