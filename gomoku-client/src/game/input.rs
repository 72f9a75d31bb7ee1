//! 终端输入解析

use thiserror::Error;

/// 输入命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// 在格子落子（选择并提交）
    Play(usize),
    /// 认输并退出
    Forfeit,
    /// 显示帮助
    Help,
}

/// 输入错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown command: {0:?} (type `help`)")]
    Unknown(String),

    #[error("({row}, {col}) is outside the {size}x{size} board")]
    OffBoard { row: usize, col: usize, size: usize },

    #[error("Cell {index} is outside the {size}x{size} board")]
    IndexOffBoard { index: usize, size: usize },
}

/// 帮助文本
pub const HELP_TEXT: &str = "Commands:\n  <index>        play cell by index (row * size + col)\n  <row> <col>    play cell by coordinates (also `row,col`)\n  quit | exit    forfeit and leave\n  help           show this help";

/// 解析一行输入，空行返回 `None`
pub fn parse_command(line: &str, board_size: usize) -> Result<Option<InputCommand>, InputError> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match text.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => return Ok(Some(InputCommand::Forfeit)),
        "help" | "h" | "?" => return Ok(Some(InputCommand::Help)),
        _ => {}
    }

    let parts: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();

    match parts.as_slice() {
        [index] => {
            let index: usize = index
                .parse()
                .map_err(|_| InputError::Unknown(text.to_string()))?;
            if index >= board_size * board_size {
                return Err(InputError::IndexOffBoard {
                    index,
                    size: board_size,
                });
            }
            Ok(Some(InputCommand::Play(index)))
        }
        [row, col] => {
            let (Ok(row), Ok(col)) = (row.parse::<usize>(), col.parse::<usize>()) else {
                return Err(InputError::Unknown(text.to_string()));
            };
            let pos = protocol::Position::new(row, col, board_size).ok_or(InputError::OffBoard {
                row,
                col,
                size: board_size,
            })?;
            Ok(Some(InputCommand::Play(pos.to_index(board_size))))
        }
        _ => Err(InputError::Unknown(text.to_string())),
    }
}
