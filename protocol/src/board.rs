//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE};
use crate::error::GameError;
use crate::mark::{Mark, Position};

/// 棋盘
///
/// N x N 的标记表，索引为 row * N + col。只能通过 [`Board::apply_move`] 落子，
/// 已有标记的格子不会被覆盖。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Mark>,
}

impl Board {
    /// 创建空棋盘
    pub fn new(size: usize) -> Result<Self, GameError> {
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(GameError::InvalidBoardSize {
                size,
                max: MAX_BOARD_SIZE,
            });
        }
        Ok(Self {
            size,
            cells: vec![Mark::None; size * size],
        })
    }

    /// 棋盘边长
    pub fn size(&self) -> usize {
        self.size
    }

    /// 格子总数
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// 获取指定位置的标记
    pub fn get(&self, pos: Position) -> Mark {
        if pos.row < self.size && pos.col < self.size {
            self.cells[pos.to_index(self.size)]
        } else {
            Mark::None
        }
    }

    /// 按格子索引获取标记
    pub fn get_index(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    /// 把格子索引转换为位置
    pub fn position(&self, index: usize) -> Result<Position, GameError> {
        Position::from_index(index, self.size)
    }

    /// 落子
    ///
    /// 目标格已有非空标记时返回 [`GameError::IllegalCellState`]，棋盘保持不变。
    pub fn apply_move(&mut self, index: usize, mark: Mark) -> Result<Position, GameError> {
        let pos = self.position(index)?;
        let existing = self.get(pos);
        if !existing.is_none() {
            return Err(GameError::IllegalCellState {
                row: pos.row,
                col: pos.col,
                existing,
                incoming: mark,
            });
        }
        self.cells[index] = mark;
        Ok(pos)
    }

    /// 已落子的格子数
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|m| !m.is_none()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            cells: vec![Mark::None; DEFAULT_BOARD_SIZE * DEFAULT_BOARD_SIZE],
        }
    }
}
