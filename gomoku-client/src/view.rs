//! 显示层接口
//!
//! 会话层只通过 [`BoardView`] 通知显示层，具体怎么画由实现决定。

use std::io::Write;

use protocol::Mark;

/// 显示层接口
pub trait BoardView: Send {
    /// 本方标记已分配
    fn identity_assigned(&mut self, mark: Mark);

    /// 格子标记变化
    fn board_changed(&mut self, row: usize, col: usize, mark: Mark);

    /// 追加状态文字
    fn status_text(&mut self, text: &str);
}

/// 终端显示
///
/// 自己维护一份只用于显示的格子副本，每次落子后重画整个棋盘。
pub struct TerminalView<W> {
    out: W,
    size: usize,
    cells: Vec<Mark>,
    identity: Option<Mark>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W, size: usize) -> Self {
        Self {
            out,
            size,
            cells: vec![Mark::None; size * size],
            identity: None,
        }
    }

    /// 渲染棋盘为文本
    pub fn render(&self) -> String {
        let mut text = String::from("   ");
        for col in 0..self.size {
            text.push_str(&format!("{:>3}", col));
        }
        text.push('\n');

        for (row, marks) in self.cells.chunks(self.size).enumerate() {
            text.push_str(&format!("{:>3}", row));
            for mark in marks {
                text.push_str(&format!("{:>3}", mark.display_char()));
            }
            text.push('\n');
        }
        text
    }

    /// 取回输出（测试用）
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> BoardView for TerminalView<W> {
    fn identity_assigned(&mut self, mark: Mark) {
        self.identity = Some(mark);
        let board = self.render();
        let _ = write!(self.out, "{board}");
        let _ = self.out.flush();
    }

    fn board_changed(&mut self, row: usize, col: usize, mark: Mark) {
        if row >= self.size || col >= self.size {
            tracing::warn!("View ignoring out-of-range cell ({}, {})", row, col);
            return;
        }
        self.cells[row * self.size + col] = mark;
        let board = self.render();
        let _ = write!(self.out, "\n{board}");
        let _ = self.out.flush();
    }

    fn status_text(&mut self, text: &str) {
        let _ = match self.identity {
            Some(mark) => writeln!(self.out, "[{mark}] {text}"),
            None => writeln!(self.out, "{text}"),
        };
        let _ = self.out.flush();
    }
}
