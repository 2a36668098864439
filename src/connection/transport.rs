//! Stream transport.
//!
//! The connection manager only sees the [`Dialer`], [`FrameWriter`] and
//! [`FrameReader`] traits. [`WsDialer`] is the production implementation
//! on top of `tokio-tungstenite`; tests plug in scripted transports.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping,
    Pong,
    Close { code: u16, reason: String },
}

/// Write half of an open session
#[async_trait]
pub trait FrameWriter: Send {
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// Send a normal-closure close frame
    async fn send_close(&mut self) -> Result<()>;

    /// Flush and release the transport
    async fn close(&mut self) -> Result<()>;
}

/// Read half of an open session
#[async_trait]
pub trait FrameReader: Send {
    /// Next frame, `None` once the stream has ended
    async fn recv(&mut self) -> Option<Result<Frame>>;
}

/// Opens sessions to the stream endpoint
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self) -> Result<(Box<dyn FrameWriter>, Box<dyn FrameReader>)>;
}

/// WebSocket dialer for `wss://<host>/streaming?i=<token>`
#[derive(Clone)]
pub struct WsDialer {
    url: String,
}

impl WsDialer {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self) -> Result<(Box<dyn FrameWriter>, Box<dyn FrameReader>)> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context("WebSocket handshake failed")?;

        let (sink, stream) = ws_stream.split();
        Ok((Box::new(WsWriter { sink }), Box::new(WsReader { stream })))
    }
}

struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameWriter for WsWriter {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .context("WebSocket send failed")
    }

    async fn send_close(&mut self) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .context("WebSocket close frame send failed")
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await.context("WebSocket close failed")
    }
}

struct WsReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for WsReader {
    async fn recv(&mut self) -> Option<Result<Frame>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(Message::Text(text)) => Frame::Text(text),
                Ok(Message::Binary(data)) => Frame::Binary(data),
                Ok(Message::Ping(_)) => Frame::Ping,
                Ok(Message::Pong(_)) => Frame::Pong,
                Ok(Message::Close(close_frame)) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    Frame::Close { code, reason }
                }
                // Raw frames are never yielded while reading
                Ok(Message::Frame(_)) => continue,
                Err(e) => return Some(Err(anyhow::anyhow!("WebSocket read error: {}", e))),
            };
            return Some(Ok(frame));
        }
    }
}
