//! 传输层抽象
//!
//! 提供 Connector/Connection traits 使会话层与具体传输实现解耦，
//! 以及按行读写的 [`LineReader`] / [`LineWriter`]。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::codec::{self, Decoded};
use crate::error::{ProtocolError, Result};
use crate::message::{ClientMessage, ServerMessage};
use crate::{CONNECT_TIMEOUT, DEFAULT_PORT, MAX_LINE_LEN};

/// 网络配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl NetworkConfig {
    /// 连接地址 host:port
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// 连接抽象 trait
///
/// 会话层只需要把连接拆成独立的读端和写端：读端交给读取任务，写端留给会话。
pub trait Connection: Send {
    type Reader: AsyncRead + Unpin + Send + 'static;
    type Writer: AsyncWrite + Unpin + Send + 'static;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;

    /// 分离读写端
    fn split(self) -> (LineReader<Self::Reader>, LineWriter<Self::Writer>);
}

/// 连接器 trait（客户端使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接器
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;
        tracing::debug!("TCP connected to {}", addr);

        TcpConnection::from_stream(stream)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: LineReader<OwnedReadHalf>,
    writer: LineWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: LineReader::new(read_half),
            writer: LineWriter::new(write_half),
            peer_addr,
        })
    }
}

impl Connection for TcpConnection {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }

    fn split(self) -> (LineReader<OwnedReadHalf>, LineWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }
}

// ============================================================================
// 行编解码
// ============================================================================

/// 行读取器
pub struct LineReader<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    /// 创建新的行读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: Vec::with_capacity(256),
        }
    }

    /// 读取一行（不含换行符）
    ///
    /// 对端关闭时返回 ConnectionClosed。去掉行尾后超过 [`MAX_LINE_LEN`] 字节或
    /// 非 UTF-8 的行被整行丢弃并返回 MalformedMessage，读取位置停在下一行开头。
    pub async fn read_line(&mut self) -> Result<String> {
        self.buffer.clear();
        // 多留两个字节给 "\r\n"
        let limit = MAX_LINE_LEN as u64 + 2;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buffer)
            .await?;

        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }

        if self.buffer.last() != Some(&b'\n') && self.buffer.len() as u64 >= limit {
            tracing::warn!("Discarding line longer than {} bytes", MAX_LINE_LEN);
            self.discard_rest_of_line().await?;
            return Err(too_long());
        }

        while matches!(self.buffer.last(), Some(b'\n' | b'\r')) {
            self.buffer.pop();
        }

        if self.buffer.len() > MAX_LINE_LEN {
            tracing::warn!("Discarding line longer than {} bytes", MAX_LINE_LEN);
            return Err(too_long());
        }

        String::from_utf8(std::mem::take(&mut self.buffer))
            .map_err(|_| ProtocolError::malformed("line is not valid UTF-8"))
    }

    /// 读取并解码一条完整的服务端消息
    ///
    /// "Opponent moved" 会再消费一行格子索引。
    pub async fn read_message(&mut self, board_size: usize) -> Result<ServerMessage> {
        let line = self.read_line().await?;
        let cell_line = match codec::decode(&line)? {
            Decoded::OpponentMoveFollows => Some(self.read_line().await?),
            Decoded::Message(_) => None,
        };
        codec::decode_message(&line, board_size, move || {
            cell_line.ok_or_else(|| ProtocolError::malformed("missing cell index line"))
        })
    }

    async fn discard_rest_of_line(&mut self) -> Result<()> {
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            let n = (&mut self.reader)
                .take(MAX_LINE_LEN as u64)
                .read_until(b'\n', &mut scratch)
                .await?;
            if n == 0 || scratch.last() == Some(&b'\n') {
                return Ok(());
            }
        }
    }
}

fn too_long() -> ProtocolError {
    ProtocolError::malformed(format!("line exceeds {MAX_LINE_LEN} bytes"))
}

/// 行写入器
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    /// 创建新的行写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 写入一行并立即刷新
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// 编码并发送客户端消息
    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        self.write_line(&codec::encode(msg)).await
    }

    /// 关闭写端
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
