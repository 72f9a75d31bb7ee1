//! 会话循环

use protocol::{GameError, LineReader, LineWriter, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{SessionCommand, SessionEnd, SessionHandle};
use crate::game::{ClientGame, Effect};
use crate::view::BoardView;

/// 客户端会话
///
/// 持有状态机、写端和显示层。[`Session::run`] 启动读取任务，然后按到达顺序
/// 处理队列中的命令，直到连接关闭、传输故障或本方认输。
pub struct Session<R, W, V> {
    game: ClientGame,
    reader: Option<LineReader<R>>,
    writer: LineWriter<W>,
    view: V,
    reader_tx: Option<mpsc::UnboundedSender<SessionCommand>>,
    rx: mpsc::UnboundedReceiver<SessionCommand>,
    reader_task: Option<JoinHandle<()>>,
}

impl<R, W, V> Session<R, W, V>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
    V: BoardView,
{
    /// 创建会话和本地输入句柄
    pub fn new(
        board_size: usize,
        reader: LineReader<R>,
        writer: LineWriter<W>,
        view: V,
    ) -> Result<(Self, SessionHandle), GameError> {
        let game = ClientGame::new(board_size)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(tx.clone());

        let session = Self {
            game,
            reader: Some(reader),
            writer,
            view,
            reader_tx: Some(tx),
            rx,
            reader_task: None,
        };
        Ok((session, handle))
    }

    pub fn game(&self) -> &ClientGame {
        &self.game
    }

    /// 运行会话直到结束
    pub async fn run(&mut self) -> SessionEnd {
        if let (Some(reader), Some(tx)) = (self.reader.take(), self.reader_tx.take()) {
            let board_size = self.game.board().size();
            self.reader_task = Some(tokio::spawn(read_loop(reader, board_size, tx)));
        }
        tracing::info!("Session started");

        let end = loop {
            let Some(cmd) = self.rx.recv().await else {
                break SessionEnd::Closed;
            };
            if let Some(end) = self.handle(cmd).await {
                break end;
            }
        };

        self.finish().await;
        tracing::info!(
            "Session ended: {:?} (mark {:?}, phase {:?})",
            end,
            self.game.my_mark(),
            self.game.phase()
        );
        end
    }

    async fn handle(&mut self, cmd: SessionCommand) -> Option<SessionEnd> {
        let effects = match cmd {
            SessionCommand::Server(Ok(msg)) => {
                tracing::debug!("Server message: {:?}", msg);
                self.game.handle_server(msg)
            }
            SessionCommand::Server(Err(ProtocolError::ConnectionClosed)) => {
                tracing::info!("Connection closed by server");
                self.view.status_text("Connection closed.");
                return Some(SessionEnd::Closed);
            }
            SessionCommand::Server(Err(e)) if e.is_recoverable() => {
                tracing::warn!("Skipping malformed message: {}", e);
                self.view.status_text(&format!("Ignored malformed message: {e}"));
                return None;
            }
            SessionCommand::Server(Err(e)) => {
                tracing::error!("Transport failure: {}", e);
                self.view.status_text(&format!("Connection error: {e}"));
                return Some(SessionEnd::Failed(e.to_string()));
            }
            SessionCommand::SelectCell(index) => self.game.select_cell(index),
            SessionCommand::SubmitMove => self.game.submit_move(),
            SessionCommand::Play(index) => self.game.play(index),
            SessionCommand::Forfeit => self.game.forfeit(),
        };
        self.apply(effects).await
    }

    async fn apply(&mut self, effects: Vec<Effect>) -> Option<SessionEnd> {
        for effect in effects {
            match effect {
                Effect::Send(msg) => {
                    if let Err(e) = self.writer.send(&msg).await {
                        tracing::error!("Failed to send {:?}: {}", msg, e);
                        self.view.status_text(&format!("Connection error: {e}"));
                        return Some(SessionEnd::Failed(e.to_string()));
                    }
                    tracing::debug!("Sent {:?}", msg);
                }
                Effect::IdentityAssigned(mark) => self.view.identity_assigned(mark),
                Effect::BoardChanged { row, col, mark } => self.view.board_changed(row, col, mark),
                Effect::Status(text) => self.view.status_text(&text),
                Effect::Close => return Some(SessionEnd::Forfeited),
            }
        }
        None
    }

    async fn finish(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!("Writer shutdown failed: {}", e);
        }
    }
}

/// 读取任务：唯一阻塞在连接上的地方
async fn read_loop<R>(
    mut reader: LineReader<R>,
    board_size: usize,
    tx: mpsc::UnboundedSender<SessionCommand>,
) where
    R: AsyncRead + Unpin + Send,
{
    loop {
        let result = reader.read_message(board_size).await;
        let fatal = matches!(&result, Err(e) if !e.is_recoverable());
        if tx.send(SessionCommand::Server(result)).is_err() {
            tracing::debug!("Session gone, reader exiting");
            return;
        }
        if fatal {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Mark;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{DuplexStream, ReadBuf, ReadHalf, WriteHalf};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum ViewEvent {
        Identity(Mark),
        Board(usize, usize, Mark),
        Status(String),
    }

    struct RecordingView(mpsc::UnboundedSender<ViewEvent>);

    impl BoardView for RecordingView {
        fn identity_assigned(&mut self, mark: Mark) {
            let _ = self.0.send(ViewEvent::Identity(mark));
        }

        fn board_changed(&mut self, row: usize, col: usize, mark: Mark) {
            let _ = self.0.send(ViewEvent::Board(row, col, mark));
        }

        fn status_text(&mut self, text: &str) {
            let _ = self.0.send(ViewEvent::Status(text.to_string()));
        }
    }

    type TestSession = Session<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>, RecordingView>;

    struct Harness {
        server_reader: LineReader<ReadHalf<DuplexStream>>,
        server_writer: LineWriter<WriteHalf<DuplexStream>>,
        handle: SessionHandle,
        events: mpsc::UnboundedReceiver<ViewEvent>,
        task: JoinHandle<(SessionEnd, TestSession)>,
    }

    fn start(board_size: usize) -> Harness {
        let (client_io, server_io) = tokio::io::duplex(1024);
        let (client_read, client_write) = tokio::io::split(client_io);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (event_tx, events) = mpsc::unbounded_channel();

        let (mut session, handle) = Session::new(
            board_size,
            LineReader::new(client_read),
            LineWriter::new(client_write),
            RecordingView(event_tx),
        )
        .unwrap();

        let task = tokio::spawn(async move {
            let end = session.run().await;
            (end, session)
        });

        Harness {
            server_reader: LineReader::new(server_read),
            server_writer: LineWriter::new(server_write),
            handle,
            events,
            task,
        }
    }

    fn status(text: &str) -> Option<ViewEvent> {
        Some(ViewEvent::Status(text.to_string()))
    }

    impl Harness {
        async fn assign(&mut self, symbol: &str, mark: Mark) {
            self.server_writer.write_line(symbol).await.unwrap();
            assert_eq!(self.events.recv().await, Some(ViewEvent::Identity(mark)));
            assert_eq!(
                self.events.recv().await,
                status(&format!("You are player \"{symbol}\""))
            );
        }
    }

    #[tokio::test]
    async fn test_submit_and_valid_move() {
        let mut h = start(15);
        h.assign("X", Mark::First).await;

        assert!(h.handle.play(112));
        assert_eq!(h.server_reader.read_line().await.unwrap(), "112");

        h.server_writer.write_line("Valid move.").await.unwrap();
        assert_eq!(h.events.recv().await, Some(ViewEvent::Board(7, 7, Mark::First)));
        assert_eq!(h.events.recv().await, status("Valid move, please wait."));

        h.handle.forfeit();
        assert_eq!(h.server_reader.read_line().await.unwrap(), "-1");
        assert!(matches!(
            h.server_reader.read_line().await,
            Err(ProtocolError::ConnectionClosed)
        ));

        let (end, session) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Forfeited);
        assert_eq!(session.game().board().get_index(112), Some(Mark::First));
        assert!(!session.game().is_my_turn());
    }

    #[tokio::test]
    async fn test_opponent_move_then_server_close() {
        let mut h = start(15);
        h.assign("O", Mark::Second).await;

        h.server_writer.write_line("Opponent moved").await.unwrap();
        h.server_writer.write_line("0").await.unwrap();
        assert_eq!(h.events.recv().await, Some(ViewEvent::Board(0, 0, Mark::First)));
        assert_eq!(h.events.recv().await, status("Opponent moved. Your turn."));

        h.server_writer.shutdown().await.unwrap();
        assert_eq!(h.events.recv().await, status("Connection closed."));

        let (end, session) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Closed);
        assert!(session.game().is_my_turn());
    }

    #[tokio::test]
    async fn test_malformed_opponent_move_keeps_reading() {
        let mut h = start(15);
        h.assign("O", Mark::Second).await;

        h.server_writer.write_line("Opponent moved").await.unwrap();
        h.server_writer.write_line("not a number").await.unwrap();
        match h.events.recv().await {
            Some(ViewEvent::Status(text)) => assert!(text.starts_with("Ignored malformed message")),
            other => panic!("Unexpected event: {:?}", other),
        }

        h.server_writer.write_line("Waiting for opponent").await.unwrap();
        assert_eq!(h.events.recv().await, status("Waiting for opponent"));

        h.server_writer.shutdown().await.unwrap();
        assert_eq!(h.events.recv().await, status("Connection closed."));

        let (end, session) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Closed);
        assert_eq!(session.game().board().occupied(), 0);
        assert!(!session.game().is_my_turn());
    }

    #[tokio::test]
    async fn test_invalid_move_then_resubmit() {
        let mut h = start(15);
        h.assign("X", Mark::First).await;

        h.handle.play(0);
        assert_eq!(h.server_reader.read_line().await.unwrap(), "0");
        h.server_writer.write_line("Invalid move, try again").await.unwrap();
        assert_eq!(h.events.recv().await, status("Invalid move, try again"));

        h.handle.select_cell(1);
        h.handle.submit_move();
        assert_eq!(h.server_reader.read_line().await.unwrap(), "1");

        h.handle.forfeit();
        assert_eq!(h.server_reader.read_line().await.unwrap(), "-1");
        let (end, _) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Forfeited);
    }

    #[tokio::test]
    async fn test_repeated_submit_sends_one_line() {
        let mut h = start(15);
        h.assign("X", Mark::First).await;

        h.handle.play(5);
        h.handle.play(6);
        h.handle.submit_move();
        h.handle.forfeit();

        assert_eq!(h.server_reader.read_line().await.unwrap(), "5");
        assert_eq!(h.server_reader.read_line().await.unwrap(), "-1");
        let (end, session) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Forfeited);
        assert_eq!(session.game().board().occupied(), 0);
    }

    #[tokio::test]
    async fn test_opponent_left_is_terminal() {
        let mut h = start(15);
        h.assign("O", Mark::Second).await;

        h.server_writer.write_line("Your opponent left").await.unwrap();
        assert_eq!(h.events.recv().await, status("Your opponent left. You win."));

        // 终局后选择不会发出走子
        h.handle.play(3);
        h.handle.forfeit();
        assert_eq!(h.server_reader.read_line().await.unwrap(), "-1");

        let (end, session) = h.task.await.unwrap();
        assert_eq!(end, SessionEnd::Forfeited);
        assert_eq!(session.game().board().occupied(), 0);
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset by peer",
            )))
        }
    }

    #[tokio::test]
    async fn test_transport_failure_ends_session() {
        let (client_io, _server_io) = tokio::io::duplex(64);
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (mut session, _handle) = Session::new(
            15,
            LineReader::new(FailingReader),
            LineWriter::new(client_io),
            RecordingView(event_tx),
        )
        .unwrap();

        let end = session.run().await;
        assert!(matches!(end, SessionEnd::Failed(ref reason) if reason.contains("reset by peer")));
        match events.recv().await {
            Some(ViewEvent::Status(text)) => assert!(text.starts_with("Connection error")),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_board_size() {
        let (client_io, _server_io) = tokio::io::duplex(64);
        let (read, write) = tokio::io::split(client_io);
        let (event_tx, _events) = mpsc::unbounded_channel();
        let result = Session::new(
            0,
            LineReader::new(read),
            LineWriter::new(write),
            RecordingView(event_tx),
        );
        assert!(result.is_err());
    }
}
