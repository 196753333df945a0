use std::{
    io::{ErrorKind, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use bytes::BytesMut;

use crate::rtsp::{
    auth::Authenticator,
    message::{Incoming, RtspRequest, parse_incoming},
    rtsp_error::RtspError,
    transport::SessionHeader,
    url::RtspUrl,
};

const READ_CHUNK: usize = 64 * 1024;

/// Write side of the control connection: numbers requests and adds the
/// session-wide headers.
pub struct RtspConnection {
    stream: TcpStream,
    cseq: u32,
    user_agent: String,
    pub session: Option<SessionHeader>,
    pub auth: Option<Authenticator>,
}

impl RtspConnection {
    /// Connects to the URL's host; returns the connection and a clone of
    /// the stream for the reader thread.
    ///
    /// # Errors
    /// `Connect` when no resolved address accepts within `timeout`.
    pub fn connect(
        url: &RtspUrl,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<(Self, TcpStream), RtspError> {
        let addr = url.socket_addr();
        let connect_err = |source| RtspError::Connect {
            addr: addr.clone(),
            source,
        };
        let mut last_err = None;
        let mut stream = None;
        for sa in addr.to_socket_addrs().map_err(connect_err)? {
            match TcpStream::connect_timeout(&sa, timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = stream.ok_or_else(|| {
            connect_err(
                last_err.unwrap_or_else(|| ErrorKind::AddrNotAvailable.into()),
            )
        })?;
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;

        Ok((
            Self {
                stream,
                cseq: 0,
                user_agent: user_agent.to_string(),
                session: None,
                auth: None,
            },
            reader,
        ))
    }

    /// Sends `req` and returns its `CSeq`.
    ///
    /// # Errors
    /// I/O errors from the socket.
    pub fn send(&mut self, mut req: RtspRequest) -> Result<u32, RtspError> {
        self.cseq = self.cseq.wrapping_add(1);
        let cseq = self.cseq;
        let mut headers = vec![
            ("CSeq".to_string(), cseq.to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        if let Some(auth) = self.auth.as_mut() {
            headers.push((
                "Authorization".to_string(),
                auth.authorization(req.method.as_str(), &req.uri),
            ));
        }
        if let Some(session) = &self.session {
            headers.push(("Session".to_string(), session.id.clone()));
        }
        headers.append(&mut req.headers);
        req.headers = headers;

        self.stream.write_all(&req.encode())?;
        self.stream.flush()?;
        Ok(cseq)
    }

    /// Sends a `$` framed packet on an interleaved channel.
    ///
    /// # Errors
    /// I/O errors, or `Malformed` for a packet over 65535 bytes.
    pub fn send_interleaved(&mut self, channel: u8, data: &[u8]) -> Result<(), RtspError> {
        let len = u16::try_from(data.len())
            .map_err(|_| RtspError::Malformed("interleaved packet too large".into()))?;
        let mut frame = Vec::with_capacity(4 + data.len());
        frame.push(b'$');
        frame.push(channel);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(data);
        self.stream.write_all(&frame)?;
        Ok(())
    }

    /// # Errors
    /// When the socket is no longer connected.
    pub fn peer_addr(&self) -> Result<std::net::SocketAddr, RtspError> {
        Ok(self.stream.peer_addr()?)
    }

    /// Closes both directions; unblocks the reader thread.
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// Read side of the control connection.
pub struct RtspReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: Read> RtspReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Blocks until one complete message or interleaved frame is available.
    ///
    /// # Errors
    /// `ConnectionClosed` at EOF, I/O and parse errors otherwise.
    pub fn read_incoming(&mut self) -> Result<Incoming, RtspError> {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if let Some(msg) = parse_incoming(&mut self.buf)? {
                return Ok(msg);
            }
            let n = match self.inner.read(&mut chunk) {
                Ok(0) => return Err(RtspError::ConnectionClosed),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::rtsp::message::Method;
    use std::{io::Cursor, net::TcpListener};

    #[test]
    fn reader_yields_messages_then_closed() {
        let data = b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n$\x00\x00\x02hi".to_vec();
        let mut r = RtspReader::new(Cursor::new(data));
        assert!(matches!(r.read_incoming().unwrap(), Incoming::Response(_)));
        assert!(matches!(
            r.read_incoming().unwrap(),
            Incoming::Interleaved { channel: 0, .. }
        ));
        assert!(matches!(r.read_incoming(), Err(RtspError::ConnectionClosed)));
    }

    #[test]
    fn requests_carry_cseq_agent_and_session() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = RtspUrl::parse(&format!("rtsp://127.0.0.1:{port}/x")).unwrap();
        let (mut conn, _reader) =
            RtspConnection::connect(&url, Duration::from_secs(1), "rtspcam").unwrap();
        let (server, _) = listener.accept().unwrap();

        assert_eq!(conn.send(RtspRequest::new(Method::Options, "*")).unwrap(), 1);
        conn.session = SessionHeader::parse("abc;timeout=10");
        let cseq = conn
            .send(RtspRequest::new(Method::Play, url.request_url()).with_header("Range", "npt=0-"))
            .unwrap();
        assert_eq!(cseq, 2);

        let mut sr = RtspReader::new(server);
        let Incoming::Request(first) = sr.read_incoming().unwrap() else {
            panic!("expected request");
        };
        assert_eq!(first.method, Method::Options);
        assert_eq!(first.header("User-Agent"), Some("rtspcam"));
        assert!(first.header("Session").is_none());
        let Incoming::Request(second) = sr.read_incoming().unwrap() else {
            panic!("expected request");
        };
        assert_eq!(second.cseq(), Some(2));
        assert_eq!(second.header("Session"), Some("abc"));
        assert_eq!(second.header("Range"), Some("npt=0-"));
    }
}
