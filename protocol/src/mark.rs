//! 棋子标记与棋盘位置

use serde::{Deserialize, Serialize};

use crate::constants::{FIRST_SYMBOL, SECOND_SYMBOL};
use crate::error::GameError;

/// 格子上的标记
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// 空格
    #[default]
    None,
    /// 先手（X）
    First,
    /// 后手（O）
    Second,
}

impl Mark {
    /// 获取对方标记（空格的对方仍是空格）
    pub fn opponent(&self) -> Mark {
        match self {
            Mark::First => Mark::Second,
            Mark::Second => Mark::First,
            Mark::None => Mark::None,
        }
    }

    /// 是否为空格
    pub fn is_none(&self) -> bool {
        matches!(self, Mark::None)
    }

    /// 协议中的符号
    pub fn symbol(&self) -> &'static str {
        match self {
            Mark::First => FIRST_SYMBOL,
            Mark::Second => SECOND_SYMBOL,
            Mark::None => " ",
        }
    }

    /// 从协议符号解析（只接受 X / O）
    pub fn from_symbol(s: &str) -> Option<Mark> {
        match s {
            FIRST_SYMBOL => Some(Mark::First),
            SECOND_SYMBOL => Some(Mark::Second),
            _ => None,
        }
    }

    /// 终端显示字符
    pub fn display_char(&self) -> char {
        match self {
            Mark::First => 'X',
            Mark::Second => 'O',
            Mark::None => '.',
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 棋盘位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 行
    pub row: usize,
    /// 列
    pub col: usize,
}

impl Position {
    /// 创建新位置（检查边界）
    pub fn new(row: usize, col: usize, size: usize) -> Option<Self> {
        if row < size && col < size {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 从格子索引转换：row = index / size, col = index % size
    pub fn from_index(index: usize, size: usize) -> Result<Self, GameError> {
        if index < size * size {
            Ok(Self {
                row: index / size,
                col: index % size,
            })
        } else {
            Err(GameError::CellOutOfRange {
                index: index as i64,
                size,
            })
        }
    }

    /// 转换为格子索引
    pub fn to_index(&self, size: usize) -> usize {
        self.row * size + self.col
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
