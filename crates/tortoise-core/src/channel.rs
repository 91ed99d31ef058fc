//! Transports carrying command values from the sending turtle to a live view.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::liveview::LiveView;
use crate::protocol::WireValue;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
    #[error("invalid live view URL: {0}")]
    InvalidUrl(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// FIFO delivery of values to a single receiver.
///
/// There is no acknowledgement and no retry.
pub trait CommandSink {
    fn send(&mut self, value: WireValue) -> Result<(), ChannelError>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, value: WireValue) -> Result<(), ChannelError> {
        (**self).send(value)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, value: WireValue) -> Result<(), ChannelError> {
        (**self).send(value)
    }
}

/// Queues values until a host drains them.
#[derive(Debug, Default)]
pub struct Outbox {
    outgoing: Vec<WireValue>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Take all queued values, oldest first.
    pub fn take_outgoing(&mut self) -> Vec<WireValue> {
        std::mem::take(&mut self.outgoing)
    }
}

impl CommandSink for Outbox {
    fn send(&mut self, value: WireValue) -> Result<(), ChannelError> {
        self.outgoing.push(value);
        Ok(())
    }
}

/// Delivers straight into a live view in the same thread.
#[derive(Debug, Clone)]
pub struct LocalLink {
    view: Rc<RefCell<LiveView>>,
}

impl LocalLink {
    /// Link to `view`, announcing the connection.
    pub fn new(view: Rc<RefCell<LiveView>>) -> Self {
        view.borrow_mut().connection_opened();
        Self { view }
    }

    pub fn view(&self) -> &Rc<RefCell<LiveView>> {
        &self.view
    }
}

impl CommandSink for LocalLink {
    fn send(&mut self, value: WireValue) -> Result<(), ChannelError> {
        let mut view = self.view.try_borrow_mut().map_err(|_| ChannelError::Closed)?;
        view.receive(&value);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::WebSocketSink;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::net::TcpStream;
    use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use tungstenite::stream::MaybeTlsStream;
    use tungstenite::{Message, WebSocket, connect};
    use url::Url;

    use super::{ChannelError, CommandSink};
    use crate::protocol::WireValue;

    /// How long the socket thread waits for queued values before polling the
    /// socket for replies.
    const POLL_INTERVAL: Duration = Duration::from_millis(50);
    /// How long a closing socket keeps collecting replies.
    const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

    type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

    enum SocketCommand {
        Send(String),
        Close,
    }

    /// Sends values as JSON text frames to a remote live view.
    ///
    /// The socket lives on a background thread; `send` only queues. Replies
    /// from the live view are collected and can be drained with
    /// [`WebSocketSink::poll_replies`].
    pub struct WebSocketSink {
        cmd_tx: Option<Sender<SocketCommand>>,
        reply_rx: Receiver<String>,
        thread: Option<JoinHandle<()>>,
    }

    impl WebSocketSink {
        /// Validate `url` and start connecting in the background.
        pub fn connect(url: &str) -> Result<Self, ChannelError> {
            let parsed = Url::parse(url).map_err(|err| ChannelError::InvalidUrl(err.to_string()))?;
            // Built without TLS support.
            if parsed.scheme() != "ws" {
                return Err(ChannelError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed.scheme()
                )));
            }

            let (cmd_tx, cmd_rx) = channel::<SocketCommand>();
            let (reply_tx, reply_rx) = channel::<String>();
            let url = parsed.to_string();
            let thread = thread::spawn(move || run_socket(&url, cmd_rx, reply_tx));

            Ok(Self {
                cmd_tx: Some(cmd_tx),
                reply_rx,
                thread: Some(thread),
            })
        }

        /// Replies received so far.
        pub fn poll_replies(&mut self) -> Vec<String> {
            self.reply_rx.try_iter().collect()
        }

        /// Flush everything queued, close the socket and wait for the thread.
        ///
        /// Replies that arrive before the live view acknowledges the close
        /// are still collected.
        pub fn close(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(SocketCommand::Close);
            }
            if let Some(handle) = self.thread.take() {
                if handle.join().is_err() {
                    log::error!("live view socket thread panicked");
                }
            }
        }
    }

    impl CommandSink for WebSocketSink {
        fn send(&mut self, value: WireValue) -> Result<(), ChannelError> {
            let text = serde_json::to_string(&value)
                .map_err(|err| ChannelError::Serialization(err.to_string()))?;
            let tx = self.cmd_tx.as_ref().ok_or(ChannelError::Closed)?;
            tx.send(SocketCommand::Send(text)).map_err(|_| ChannelError::Closed)
        }
    }

    impl Drop for WebSocketSink {
        fn drop(&mut self) {
            self.close();
        }
    }

    fn run_socket(url: &str, cmd_rx: Receiver<SocketCommand>, reply_tx: Sender<String>) {
        log::info!("live view socket: connecting to {url}");
        let (mut socket, response) = match connect(url) {
            Ok(connected) => connected,
            Err(err) => {
                log::error!("live view connection failed: {err}");
                return;
            }
        };
        log::info!("live view connected, status: {}", response.status());

        if let MaybeTlsStream::Plain(tcp) = socket.get_mut() {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(10)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }

        'outer: loop {
            // Drain everything queued before checking for replies.
            loop {
                match cmd_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(SocketCommand::Send(text)) => {
                        log::debug!("live view sending: {}", preview(&text));
                        if let Err(err) = socket.send(Message::Text(text)) {
                            log::error!("live view send error: {err}");
                            break 'outer;
                        }
                    }
                    Ok(SocketCommand::Close) => {
                        log::info!("live view close requested");
                        finish(&mut socket, &reply_tx);
                        break 'outer;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        log::info!("live view command channel disconnected");
                        finish(&mut socket, &reply_tx);
                        break 'outer;
                    }
                    Err(RecvTimeoutError::Timeout) => break,
                }
            }

            if let Poll::Closed = read_reply(&mut socket, &reply_tx) {
                break;
            }
        }

        log::info!("live view socket thread exiting");
    }

    enum Poll {
        Open,
        Closed,
    }

    /// Read at most one frame, forwarding text replies.
    fn read_reply(socket: &mut Socket, reply_tx: &Sender<String>) -> Poll {
        match socket.read() {
            Ok(Message::Text(text)) => {
                log::info!("live view replied: {text}");
                let _ = reply_tx.send(text);
                Poll::Open
            }
            Ok(Message::Close(_)) => {
                log::info!("live view closed the connection");
                Poll::Closed
            }
            Ok(_) => Poll::Open,
            Err(tungstenite::Error::Io(ref err))
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                Poll::Open
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Poll::Closed
            }
            Err(err) => {
                log::error!("live view read error: {err}");
                Poll::Closed
            }
        }
    }

    /// Start the close handshake and keep reading until the live view
    /// answers it or `CLOSE_TIMEOUT` passes.
    fn finish(socket: &mut Socket, reply_tx: &Sender<String>) {
        if let Err(err) = socket.close(None) {
            log::warn!("live view close error: {err}");
            return;
        }
        let deadline = Instant::now() + CLOSE_TIMEOUT;
        while Instant::now() < deadline {
            if let Poll::Closed = read_reply(socket, reply_tx) {
                return;
            }
        }
        log::warn!("live view did not acknowledge close within {CLOSE_TIMEOUT:?}");
    }

    fn preview(text: &str) -> String {
        text.chars().take(100).collect()
    }
}
