//! 文本行编解码
//!
//! 协议的每条消息是一行 UTF-8 文本。"Opponent moved" 之后紧跟一行格子索引，
//! 由 [`decode_opponent_move`] 单独解析。

use crate::constants::{
    FORFEIT_CELL, INVALID_MOVE, OPPONENT_LEFT, OPPONENT_MOVED, VALID_MOVE, YOU_LOSE, YOU_WIN,
};
use crate::error::{ProtocolError, Result};
use crate::mark::Mark;
use crate::message::{ClientMessage, ServerMessage};

/// 单行解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// 完整消息
    Message(ServerMessage),
    /// "Opponent moved"，还需要再读一行格子索引
    OpponentMoveFollows,
}

/// 解码一行服务端消息
///
/// 空行返回 MalformedMessage；未识别的非空文本作为 [`ServerMessage::Info`] 返回。
pub fn decode(line: &str) -> Result<Decoded> {
    let text = strip_line_ending(line);
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ProtocolError::malformed("empty line"));
    }

    if let Some(mark) = Mark::from_symbol(trimmed) {
        return Ok(Decoded::Message(ServerMessage::MarkAssigned(mark)));
    }

    let msg = match trimmed {
        VALID_MOVE => ServerMessage::ValidMove,
        INVALID_MOVE => ServerMessage::InvalidMove,
        OPPONENT_MOVED => return Ok(Decoded::OpponentMoveFollows),
        OPPONENT_LEFT => ServerMessage::OpponentLeft,
        YOU_WIN => ServerMessage::YouWin,
        YOU_LOSE => ServerMessage::YouLose,
        _ => ServerMessage::Info(text.to_string()),
    };
    Ok(Decoded::Message(msg))
}

/// 解析 "Opponent moved" 之后的格子索引行
pub fn decode_opponent_move(next_line: &str, board_size: usize) -> Result<usize> {
    let trimmed = strip_line_ending(next_line).trim();
    let value: i64 = trimmed.parse().map_err(|_| {
        ProtocolError::malformed(format!("expected cell index after opponent move, got {trimmed:?}"))
    })?;

    let cell_count = (board_size * board_size) as i64;
    if value < 0 || value >= cell_count {
        return Err(ProtocolError::malformed(format!(
            "opponent cell {value} out of range 0..{cell_count}"
        )));
    }
    Ok(value as usize)
}

/// 解码一条完整消息，必要时通过 `next_line` 再取一行
///
/// `next_line` 最多被调用一次。
pub fn decode_message<F>(line: &str, board_size: usize, next_line: F) -> Result<ServerMessage>
where
    F: FnOnce() -> Result<String>,
{
    match decode(line)? {
        Decoded::Message(msg) => Ok(msg),
        Decoded::OpponentMoveFollows => {
            let cell_line = next_line()?;
            let cell = decode_opponent_move(&cell_line, board_size)?;
            Ok(ServerMessage::OpponentMoved { cell })
        }
    }
}

/// 编码落子消息
pub fn encode_move(cell: usize) -> String {
    cell.to_string()
}

/// 编码认输消息
pub fn encode_forfeit() -> String {
    FORFEIT_CELL.to_string()
}

/// 编码客户端消息（不含换行）
pub fn encode(msg: &ClientMessage) -> String {
    match msg {
        ClientMessage::Move { cell } => encode_move(*cell),
        ClientMessage::Forfeit => encode_forfeit(),
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(line: &str) -> ServerMessage {
        match decode(line).unwrap() {
            Decoded::Message(msg) => msg,
            Decoded::OpponentMoveFollows => panic!("Unexpected opponent move header"),
        }
    }

    #[test]
    fn test_decode_literals() {
        assert_eq!(message("X"), ServerMessage::MarkAssigned(Mark::First));
        assert_eq!(message("O"), ServerMessage::MarkAssigned(Mark::Second));
        assert_eq!(message("Valid move."), ServerMessage::ValidMove);
        assert_eq!(message("Invalid move, try again"), ServerMessage::InvalidMove);
        assert_eq!(message("Your opponent left"), ServerMessage::OpponentLeft);
        assert_eq!(message("You win"), ServerMessage::YouWin);
        assert_eq!(message("You lose"), ServerMessage::YouLose);
        assert_eq!(decode("Opponent moved").unwrap(), Decoded::OpponentMoveFollows);
    }

    #[test]
    fn test_decode_tolerates_line_endings() {
        assert_eq!(message("Valid move.\r\n"), ServerMessage::ValidMove);
        assert_eq!(message("  X \n"), ServerMessage::MarkAssigned(Mark::First));
        assert_eq!(decode("Opponent moved\n").unwrap(), Decoded::OpponentMoveFollows);
    }

    #[test]
    fn test_decode_informational() {
        assert_eq!(
            message("Player X connected\n"),
            ServerMessage::Info("Player X connected".to_string())
        );
        // 大小写不同的字面量不被识别
        assert_eq!(message("valid move."), ServerMessage::Info("valid move.".to_string()));
    }

    #[test]
    fn test_decode_empty_is_malformed() {
        assert!(matches!(decode(""), Err(ProtocolError::MalformedMessage { .. })));
        assert!(matches!(decode("   \r\n"), Err(ProtocolError::MalformedMessage { .. })));
    }

    #[test]
    fn test_decode_opponent_move() {
        assert_eq!(decode_opponent_move("0", 15).unwrap(), 0);
        assert_eq!(decode_opponent_move("224\r\n", 15).unwrap(), 224);
        assert_eq!(decode_opponent_move(" 112 ", 15).unwrap(), 112);

        assert!(decode_opponent_move("225", 15).is_err());
        assert!(decode_opponent_move("-1", 15).is_err());
        assert!(decode_opponent_move("abc", 15).is_err());
        assert!(decode_opponent_move("", 15).is_err());
        assert!(decode_opponent_move("1.5", 15).is_err());
    }

    #[test]
    fn test_decode_message_consumes_one_line() {
        let mut lines = vec!["17".to_string(), "You win".to_string()].into_iter();
        let msg = decode_message("Opponent moved", 15, || {
            lines.next().ok_or(ProtocolError::ConnectionClosed)
        })
        .unwrap();
        assert_eq!(msg, ServerMessage::OpponentMoved { cell: 17 });
        assert_eq!(lines.next().as_deref(), Some("You win"));
    }

    #[test]
    fn test_decode_message_does_not_read_ahead() {
        let msg = decode_message("Valid move.", 15, || panic!("must not read another line")).unwrap();
        assert_eq!(msg, ServerMessage::ValidMove);
    }

    #[test]
    fn test_decode_message_malformed_cell() {
        let result = decode_message("Opponent moved", 15, || Ok("north-east".to_string()));
        assert!(matches!(result, Err(ProtocolError::MalformedMessage { .. })));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_move(112), "112");
        assert_eq!(encode_forfeit(), "-1");
        assert_eq!(encode(&ClientMessage::Move { cell: 0 }), "0");
        assert_eq!(encode(&ClientMessage::Forfeit), "-1");
    }
}
