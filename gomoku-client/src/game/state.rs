//! 客户端回合状态机
//!
//! 持有本方标记、回合标志、待发送选择和棋盘镜像。所有方法只返回 [`Effect`]，
//! 由会话层负责发送和显示，状态机本身不做 I/O。

use protocol::{
    Board, ClientMessage, GameError, Mark, ServerMessage, INVALID_MOVE, OPPONENT_MOVED, VALID_MOVE,
};

use super::Effect;

/// 终局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 本方胜
    Won,
    /// 本方负
    Lost,
    /// 对手离开（本方判胜）
    OpponentLeft,
}

impl Outcome {
    /// 状态栏文字
    pub fn status_text(&self) -> &'static str {
        match self {
            Outcome::Won => "You win.",
            Outcome::Lost => "You lose.",
            Outcome::OpponentLeft => "Your opponent left. You win.",
        }
    }
}

/// 状态机阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 等待服务端分配标记
    AwaitingAssignment,
    /// 空闲（是否轮到本方见 `my_turn`）
    Idle,
    /// 已提交走子，等待服务端确认
    MoveSubmitted { cell: usize },
    /// 终局
    Terminal(Outcome),
    /// 本方已认输，会话结束
    Closed,
}

/// 客户端游戏状态
#[derive(Debug, Clone)]
pub struct ClientGame {
    /// 棋盘镜像
    board: Board,
    /// 本方标记（分配后不再改变）
    my_mark: Option<Mark>,
    /// 是否轮到本方
    my_turn: bool,
    /// 本地选中但尚未发送的格子
    pending_selection: Option<usize>,
    /// 当前阶段
    phase: Phase,
    /// 棋盘镜像已不可信，只读模式
    degraded: bool,
}

impl ClientGame {
    /// 创建新游戏
    pub fn new(board_size: usize) -> Result<Self, GameError> {
        Ok(Self {
            board: Board::new(board_size)?,
            my_mark: None,
            my_turn: false,
            pending_selection: None,
            phase: Phase::AwaitingAssignment,
            degraded: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn my_mark(&self) -> Option<Mark> {
        self.my_mark
    }

    /// 是否轮到玩家走棋
    pub fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    pub fn pending_selection(&self) -> Option<usize> {
        self.pending_selection
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 是否已终局或已结束会话
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Terminal(_) | Phase::Closed)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// 当前是否可以接受本地选择/提交
    fn accepts_input(&self) -> bool {
        self.phase == Phase::Idle && self.my_turn && !self.degraded
    }

    // ========================================================================
    // 本地输入
    // ========================================================================

    /// 选择格子（只在轮到本方时记录）
    pub fn select_cell(&mut self, index: usize) -> Vec<Effect> {
        if index >= self.board.cell_count() {
            let size = self.board.size();
            return vec![Effect::Status(format!(
                "Cell {index} is outside the {size}x{size} board."
            ))];
        }

        if !self.accepts_input() {
            tracing::debug!("Ignoring selection of cell {} in {:?}", index, self.phase);
            return Vec::new();
        }

        self.pending_selection = Some(index);
        Vec::new()
    }

    /// 提交待发送的选择
    ///
    /// 不是本方回合或没有选择时什么都不做，因此连续调用最多发出一次走子。
    pub fn submit_move(&mut self) -> Vec<Effect> {
        if !self.accepts_input() {
            tracing::debug!("Submit ignored in {:?} (my_turn={})", self.phase, self.my_turn);
            return Vec::new();
        }
        let Some(cell) = self.pending_selection.take() else {
            tracing::debug!("Submit ignored: no pending selection");
            return Vec::new();
        };

        self.my_turn = false;
        self.phase = Phase::MoveSubmitted { cell };
        tracing::info!("Submitting move: cell {}", cell);
        vec![Effect::Send(ClientMessage::Move { cell })]
    }

    /// 选择并立即提交
    pub fn play(&mut self, index: usize) -> Vec<Effect> {
        let mut effects = self.select_cell(index);
        effects.extend(self.submit_move());
        effects
    }

    /// 认输/退出，任何阶段都可以
    pub fn forfeit(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Closed {
            return Vec::new();
        }
        self.phase = Phase::Closed;
        self.my_turn = false;
        self.pending_selection = None;
        tracing::info!("Forfeiting session");
        vec![Effect::Send(ClientMessage::Forfeit), Effect::Close]
    }

    // ========================================================================
    // 服务端消息
    // ========================================================================

    /// 处理一条服务端消息
    pub fn handle_server(&mut self, msg: ServerMessage) -> Vec<Effect> {
        if self.phase == Phase::Closed {
            tracing::debug!("Session closed, dropping {:?}", msg);
            return Vec::new();
        }

        match msg {
            ServerMessage::Info(text) => vec![Effect::Status(text)],
            ServerMessage::MarkAssigned(mark) => self.on_mark_assigned(mark),
            ServerMessage::OpponentLeft => self.on_terminal(Outcome::OpponentLeft),
            ServerMessage::YouWin => self.on_terminal(Outcome::Won),
            ServerMessage::YouLose => self.on_terminal(Outcome::Lost),
            ServerMessage::ValidMove => self.on_valid_move(),
            ServerMessage::InvalidMove => self.on_invalid_move(),
            ServerMessage::OpponentMoved { cell } => self.on_opponent_moved(cell),
        }
    }

    fn on_mark_assigned(&mut self, mark: Mark) -> Vec<Effect> {
        if self.phase != Phase::AwaitingAssignment {
            tracing::warn!("Mark {} received after identity was assigned", mark);
            return vec![Effect::Status(mark.symbol().to_string())];
        }

        self.my_mark = Some(mark);
        self.my_turn = mark == Mark::First;
        self.phase = Phase::Idle;
        tracing::info!("Assigned mark {} (my_turn={})", mark, self.my_turn);
        vec![
            Effect::IdentityAssigned(mark),
            Effect::Status(format!("You are player \"{mark}\"")),
        ]
    }

    fn on_valid_move(&mut self) -> Vec<Effect> {
        let Phase::MoveSubmitted { cell } = self.phase else {
            return self.unexpected(VALID_MOVE);
        };

        self.phase = Phase::Idle;
        self.my_turn = false;
        let mark = self.my_mark.unwrap_or_default();
        match self.board.apply_move(cell, mark) {
            Ok(pos) => vec![
                Effect::BoardChanged {
                    row: pos.row,
                    col: pos.col,
                    mark,
                },
                Effect::Status("Valid move, please wait.".to_string()),
            ],
            Err(e) => self.board_diverged(e),
        }
    }

    fn on_invalid_move(&mut self) -> Vec<Effect> {
        if !matches!(self.phase, Phase::MoveSubmitted { .. }) {
            return self.unexpected(INVALID_MOVE);
        }

        self.phase = Phase::Idle;
        self.pending_selection = None;
        self.my_turn = true;
        vec![Effect::Status(INVALID_MOVE.to_string())]
    }

    fn on_opponent_moved(&mut self, cell: usize) -> Vec<Effect> {
        match self.phase {
            Phase::Idle => {}
            Phase::MoveSubmitted { cell: submitted } => {
                tracing::warn!(
                    "Opponent moved while cell {} awaited confirmation, dropping submission",
                    submitted
                );
            }
            Phase::AwaitingAssignment | Phase::Terminal(_) | Phase::Closed => {
                return self.unexpected(&format!("{OPPONENT_MOVED} {cell}"));
            }
        }

        self.phase = Phase::Idle;
        self.my_turn = true;
        let mark = self.my_mark.map(|m| m.opponent()).unwrap_or_default();
        match self.board.apply_move(cell, mark) {
            Ok(pos) => vec![
                Effect::BoardChanged {
                    row: pos.row,
                    col: pos.col,
                    mark,
                },
                Effect::Status("Opponent moved. Your turn.".to_string()),
            ],
            Err(e) => self.board_diverged(e),
        }
    }

    fn on_terminal(&mut self, outcome: Outcome) -> Vec<Effect> {
        if let Phase::Terminal(previous) = self.phase {
            tracing::warn!("{:?} received after game already ended with {:?}", outcome, previous);
            return vec![Effect::Status(outcome.status_text().to_string())];
        }

        self.phase = Phase::Terminal(outcome);
        self.my_turn = false;
        self.pending_selection = None;
        tracing::info!("Game over: {:?}", outcome);
        vec![Effect::Status(outcome.status_text().to_string())]
    }

    /// 当前阶段不该出现的消息：原样显示，不改变状态
    fn unexpected(&self, text: &str) -> Vec<Effect> {
        tracing::warn!("Unexpected {:?} in {:?}", text, self.phase);
        if self.is_finished() {
            vec![Effect::Status(format!("Game is over, ignoring: {text}"))]
        } else {
            vec![Effect::Status(text.to_string())]
        }
    }

    /// 棋盘镜像与服务端不一致，进入只读模式
    fn board_diverged(&mut self, err: GameError) -> Vec<Effect> {
        tracing::error!("Board invariant violated: {}", err);
        self.degraded = true;
        self.pending_selection = None;
        vec![Effect::Status(format!(
            "Board out of sync with server ({err}); moves disabled."
        ))]
    }
}
