//! RTSP session driver.
//!
//! One thread owns the session: it sends requests, waits for their replies
//! and routes media. A reader thread turns the control connection into
//! [`Incoming`] events and, for UDP transport, one thread per socket
//! forwards datagrams; all of them feed the same channel.

use std::{
    io::{self, ErrorKind},
    net::{IpAddr, SocketAddr, TcpStream, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    h264::decode_sprop_parameter_sets,
    log::LogSink,
    media::{AccessUnitSink, VideoSink},
    rtcp::{ReceiverReport, RtcpPacket, Sdes},
    rtp::{RtpPacket, RxTracker, time::ntp_now},
    rtsp::{
        auth::Authenticator,
        connection::{RtspConnection, RtspReader},
        message::{Incoming, Method, RtspRequest, RtspResponse},
        rtsp_error::RtspError,
        transport::{SessionHeader, Transport, TransportHeader},
        url::{RtspUrl, resolve_control},
    },
    sdp::{Media, Sdp},
    sink_debug, sink_error, sink_info, sink_trace, sink_warn,
    sync::ErrorSlot,
};

/// Seconds of slack added to a bounded stream's advertised duration.
const DURATION_SLOP: Duration = Duration::from_secs(2);
/// Poll period of UDP reader threads for the stop flag.
const UDP_POLL: Duration = Duration::from_millis(200);
const UDP_BUF_LEN: usize = 65_536;
const DEFAULT_CLOCK_RATE: u32 = 90_000;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub transport: Transport,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// How long to wait for the reply to a request.
    pub response_timeout: Duration,
    /// Period of RTCP receiver reports.
    pub rtcp_interval: Duration,
    /// Delay before the first keep-alive after PLAY.
    pub first_keepalive: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            transport: Transport::Udp,
            user_agent: "rtspcam".to_string(),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            rtcp_interval: Duration::from_secs(5),
            first_keepalive: Duration::from_secs(55),
        }
    }
}

/// What a sink factory learns about the subsession it serves.
#[derive(Debug, Clone)]
pub struct SubsessionInfo {
    pub index: usize,
    pub control_url: String,
    pub payload_type: u8,
    pub clock_rate: u32,
}

/// Builds the access unit consumer of each H.264 subsession.
pub type SinkFactory =
    Box<dyn FnMut(&SubsessionInfo) -> Result<Box<dyn AccessUnitSink>, String> + Send>;

enum ClientEvent {
    Control(Incoming),
    ControlClosed(String),
    Udp {
        sub: usize,
        rtcp: bool,
        data: Vec<u8>,
    },
    Quit,
}

/// Handle to a running RTSP session.
///
/// Failures and the end of the stream are reported through the
/// [`ErrorSlot`] given to [`RtspClient::start`]; an empty message means
/// the stream ended normally.
pub struct RtspClient {
    events: Sender<ClientEvent>,
    thread: Option<JoinHandle<()>>,
}

impl RtspClient {
    /// Validates the URL and starts the session thread.
    ///
    /// # Errors
    /// `InvalidUrl` for a malformed URL, `Io` if the thread cannot start.
    pub fn start(
        url: &str,
        options: ClientOptions,
        factory: SinkFactory,
        error_slot: Arc<ErrorSlot>,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, RtspError> {
        let url = RtspUrl::parse(url)?;
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();

        let thread = thread::Builder::new()
            .name("rtspcam-client".into())
            .spawn(move || {
                let _guard = PanicGuard(Arc::clone(&error_slot));
                let mut session = Session::new(url, options, factory, logger, tx, rx);
                let message = match session.run() {
                    Ok(()) | Err(RtspError::Aborted) => String::new(),
                    Err(e) => {
                        sink_error!(session.logger, "[RTSP] {e}");
                        e.to_string()
                    }
                };
                session.shutdown();
                error_slot.set(message);
            })?;

        Ok(Self {
            events,
            thread: Some(thread),
        })
    }

    /// Tears the session down and joins its threads. Idempotent.
    pub fn quit(&mut self) {
        let _ = self.events.send(ClientEvent::Quit);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }

    /// True once the session thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for RtspClient {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Reports a panicking session thread through the error slot.
struct PanicGuard(Arc<ErrorSlot>);

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.set("RTSP session thread panicked");
        }
    }
}

struct Subsession {
    info: SubsessionInfo,
    sink: Option<VideoSink>,
    rx: RxTracker,
    remote_ssrc: Option<u32>,
    /// Interleaved RTP channel; RTCP uses the next one.
    rtp_channel: Option<u8>,
    rtcp_socket: Option<Arc<UdpSocket>>,
    rtcp_dest: Option<SocketAddr>,
}

struct Session {
    url: RtspUrl,
    options: ClientOptions,
    factory: SinkFactory,
    logger: Arc<dyn LogSink>,
    events_tx: Sender<ClientEvent>,
    events: Receiver<ClientEvent>,
    conn: Option<RtspConnection>,
    control_reader: Option<JoinHandle<()>>,
    udp_readers: Vec<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    subsessions: Vec<Subsession>,
    aggregate_url: String,
    ssrc: u32,
    cname: String,
    started: Instant,
    shut_down: bool,
}

impl Session {
    fn new(
        url: RtspUrl,
        options: ClientOptions,
        factory: SinkFactory,
        logger: Arc<dyn LogSink>,
        events_tx: Sender<ClientEvent>,
        events: Receiver<ClientEvent>,
    ) -> Self {
        let aggregate_url = url.request_url();
        Self {
            url,
            options,
            factory,
            logger,
            events_tx,
            events,
            conn: None,
            control_reader: None,
            udp_readers: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            subsessions: Vec::new(),
            aggregate_url,
            ssrc: rand::random(),
            cname: format!("rtspcam-{}", std::process::id()),
            started: Instant::now(),
            shut_down: false,
        }
    }

    fn run(&mut self) -> Result<(), RtspError> {
        self.connect()?;
        let (sdp, base_url) = self.describe()?;

        for (index, media) in sdp.media.iter().enumerate() {
            if !media.is_h264_video() {
                sink_debug!(
                    self.logger,
                    "[RTSP] skipping {} subsession ({})",
                    media.kind,
                    media.codec_name().unwrap_or_else(|| "unknown codec".into())
                );
                continue;
            }
            let control_url = resolve_control(&base_url, media.control().unwrap_or_default());
            match self.setup(index, media, control_url) {
                Ok(()) => {}
                Err(e @ (RtspError::Aborted | RtspError::ConnectionClosed | RtspError::Io(_))) => {
                    return Err(e);
                }
                Err(e) => sink_warn!(self.logger, "[RTSP] Failed to set up subsession: {e}"),
            }
        }
        if self.subsessions.is_empty() {
            return Err(RtspError::NoVideoSubsession);
        }

        self.aggregate_url = match sdp.control() {
            Some(c) => resolve_control(&base_url, c),
            None => base_url,
        };
        let end = self.play(&sdp)?;
        self.stream(end)
    }

    fn connect(&mut self) -> Result<(), RtspError> {
        let (conn, reader) = RtspConnection::connect(
            &self.url,
            self.options.connect_timeout,
            &self.options.user_agent,
        )?;
        sink_info!(self.logger, "[RTSP] connected to {}", self.url.socket_addr());
        self.conn = Some(conn);
        self.control_reader = Some(spawn_control_reader(reader, self.events_tx.clone())?);
        Ok(())
    }

    fn describe(&mut self) -> Result<(Sdp, String), RtspError> {
        let url = self.url.request_url();
        let req = RtspRequest::new(Method::Describe, &url).with_header("Accept", "application/sdp");
        let resp = self.request(req)?;
        if !resp.is_success() {
            return Err(RtspError::DescribeFailed(format!(
                "{} {}",
                resp.code, resp.reason
            )));
        }

        let text = resp.body_text();
        sink_info!(self.logger, "[RTSP] Got a SDP description:\n{}", text.trim_end());
        let sdp = Sdp::parse(&text)?;
        if sdp.media.is_empty() {
            return Err(RtspError::NoMedia);
        }
        let base = resp
            .header("Content-Base")
            .or_else(|| resp.header("Content-Location"))
            .map_or(url, str::to_string);
        Ok((sdp, base))
    }

    fn setup(&mut self, index: usize, media: &Media, control_url: String) -> Result<(), RtspError> {
        let payload_type = media.payload_type().unwrap_or(96);
        let clock_rate = media
            .rtpmap(payload_type)
            .map_or(DEFAULT_CLOCK_RATE, |m| m.clock_rate);

        let mut sockets = None;
        let request_transport = match self.options.transport {
            Transport::Udp => {
                let (rtp, rtcp) = bind_rtp_pair(self.url.host.contains(':'))?;
                let port = rtp.local_addr()?.port();
                sockets = Some((rtp, rtcp));
                TransportHeader::udp(port)
            }
            Transport::Tcp => {
                let k = u8::try_from(self.subsessions.len() * 2).unwrap_or(u8::MAX - 1);
                TransportHeader::interleaved(k)
            }
        };

        let req = RtspRequest::new(Method::Setup, &control_url)
            .with_header("Transport", request_transport.to_request_value());
        let resp = self.request(req)?;
        if !resp.is_success() {
            return Err(RtspError::Status {
                method: "SETUP",
                code: resp.code,
                reason: resp.reason,
            });
        }
        if let Some(session) = resp.header("Session").and_then(SessionHeader::parse) {
            let conn = self.conn_mut()?;
            if conn.session.is_none() {
                conn.session = Some(session);
            }
        }
        let reply = resp
            .header("Transport")
            .map(TransportHeader::parse)
            .unwrap_or_else(|| request_transport.clone());

        let info = SubsessionInfo {
            index,
            control_url,
            payload_type,
            clock_rate,
        };
        let target = (self.factory)(&info).map_err(RtspError::SinkCreation)?;
        let extradata = media
            .fmtp(payload_type)
            .get("sprop-parameter-sets")
            .map(|v| {
                decode_sprop_parameter_sets(v).unwrap_or_else(|e| {
                    sink_warn!(self.logger, "[RTSP] ignoring sprop-parameter-sets: {e}");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        let sink = VideoSink::new(
            info.control_url.clone(),
            extradata,
            target,
            Arc::clone(&self.logger),
        );

        let sub = self.subsessions.len();
        let mut subsession = Subsession {
            info,
            sink: Some(sink),
            rx: RxTracker::default(),
            remote_ssrc: reply.ssrc,
            rtp_channel: None,
            rtcp_socket: None,
            rtcp_dest: None,
        };

        match sockets {
            Some((rtp, rtcp)) => {
                let server_ip = match reply.source.as_deref().and_then(|s| s.parse::<IpAddr>().ok())
                {
                    Some(ip) => ip,
                    None => self.conn_mut()?.peer_addr()?.ip(),
                };
                subsession.rtcp_dest = reply
                    .server_port
                    .map(|(_, rtcp_port)| SocketAddr::new(server_ip, rtcp_port));
                let (rtp_port, _) = request_transport.client_port.unwrap_or_default();
                let rtcp = Arc::new(rtcp);
                let rtp_reader = self.spawn_udp_reader(Arc::new(rtp), sub, false)?;
                let rtcp_reader = self.spawn_udp_reader(Arc::clone(&rtcp), sub, true)?;
                self.udp_readers.extend([rtp_reader, rtcp_reader]);
                subsession.rtcp_socket = Some(rtcp);
                sink_info!(
                    self.logger,
                    "[RTSP] Set up the \"video/H264\" subsession (client ports {}-{})",
                    rtp_port,
                    rtp_port.wrapping_add(1)
                );
            }
            None => {
                let (rtp_channel, _) = reply
                    .interleaved
                    .or(request_transport.interleaved)
                    .unwrap_or_default();
                subsession.rtp_channel = Some(rtp_channel);
                sink_info!(
                    self.logger,
                    "[RTSP] Set up the \"video/H264\" subsession (interleaved {}-{})",
                    rtp_channel,
                    rtp_channel.wrapping_add(1)
                );
            }
        }
        self.subsessions.push(subsession);
        Ok(())
    }

    /// Sends PLAY; returns when the stream should be stopped, if bounded.
    fn play(&mut self, sdp: &Sdp) -> Result<Option<Instant>, RtspError> {
        let req = RtspRequest::new(Method::Play, &self.aggregate_url).with_header("Range", "npt=0.000-");
        let resp = self.request(req)?;
        if !resp.is_success() {
            return Err(RtspError::Status {
                method: "PLAY",
                code: resp.code,
                reason: resp.reason,
            });
        }

        let duration = sdp
            .npt_range()
            .and_then(|r| r.duration())
            .filter(|d| *d > 0.0)
            .and_then(|d| Duration::try_from_secs_f64(d).ok())
            .and_then(|d| d.checked_add(DURATION_SLOP));
        match duration {
            Some(d) => sink_info!(
                self.logger,
                "[RTSP] Started playing session (for up to {:.1} seconds)...",
                d.as_secs_f64()
            ),
            None => sink_info!(self.logger, "[RTSP] Started playing session..."),
        }
        Ok(duration.and_then(|d| Instant::now().checked_add(d)))
    }

    fn stream(&mut self, end: Option<Instant>) -> Result<(), RtspError> {
        let mut next_keepalive = Instant::now() + self.options.first_keepalive;
        let mut next_report = Instant::now() + self.options.rtcp_interval;

        loop {
            let now = Instant::now();
            if end.is_some_and(|e| now >= e) {
                sink_info!(self.logger, "[RTSP] stream duration elapsed");
                return Ok(());
            }
            if now >= next_keepalive {
                self.send_keepalive()?;
                let secs = self
                    .conn
                    .as_ref()
                    .and_then(|c| c.session.as_ref())
                    .map_or(SessionHeader::DEFAULT_TIMEOUT_SECS - 5, SessionHeader::keepalive_secs);
                next_keepalive = now + Duration::from_secs(secs);
            }
            if now >= next_report {
                self.send_receiver_reports();
                next_report = now + self.options.rtcp_interval;
            }

            let mut wake = next_keepalive.min(next_report);
            if let Some(e) = end {
                wake = wake.min(e);
            }
            match self.events.recv_timeout(wake.saturating_duration_since(Instant::now())) {
                Ok(ClientEvent::Control(Incoming::Response(resp))) => {
                    if !resp.is_success() {
                        sink_warn!(
                            self.logger,
                            "[RTSP] request {} failed: {} {}",
                            resp.cseq().unwrap_or_default(),
                            resp.code,
                            resp.reason
                        );
                    }
                }
                Ok(ev) => self.handle_event(ev)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(RtspError::ConnectionClosed),
            }

            if self.subsessions.iter().all(|s| s.sink.is_none()) {
                sink_info!(self.logger, "[RTSP] all subsessions have ended");
                return Ok(());
            }
        }
    }

    /// Sends `req`, retrying once with credentials on `401`.
    fn request(&mut self, req: RtspRequest) -> Result<RtspResponse, RtspError> {
        let method = req.method.as_str();
        let cseq = self.conn_mut()?.send(req.clone())?;
        let resp = self.wait_response(cseq, method)?;
        if resp.code != 401 {
            return Ok(resp);
        }
        let Some(creds) = self.url.credentials.clone() else {
            return Ok(resp);
        };
        if self.conn.as_ref().is_some_and(|c| c.auth.is_some()) {
            return Ok(resp);
        }
        let auth = Authenticator::from_challenges(creds, resp.header_values("WWW-Authenticate"))
            .ok_or_else(|| RtspError::Unauthorized("no supported WWW-Authenticate challenge".into()))?;
        sink_debug!(self.logger, "[RTSP] retrying {} with {} auth", method, auth.scheme());
        let conn = self.conn_mut()?;
        conn.auth = Some(auth);
        let cseq = conn.send(req)?;
        self.wait_response(cseq, method)
    }

    fn wait_response(&mut self, cseq: u32, method: &'static str) -> Result<RtspResponse, RtspError> {
        let deadline = Instant::now() + self.options.response_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RtspError::Timeout(method));
            }
            match self.events.recv_timeout(remaining) {
                Ok(ClientEvent::Control(Incoming::Response(resp))) => {
                    match resp.cseq() {
                        Some(c) if c != cseq => {
                            sink_debug!(self.logger, "[RTSP] ignoring reply to CSeq {}", c);
                        }
                        _ => return Ok(resp),
                    }
                }
                Ok(ev) => self.handle_event(ev)?,
                Err(RecvTimeoutError::Timeout) => return Err(RtspError::Timeout(method)),
                Err(RecvTimeoutError::Disconnected) => return Err(RtspError::ConnectionClosed),
            }
        }
    }

    fn handle_event(&mut self, ev: ClientEvent) -> Result<(), RtspError> {
        match ev {
            ClientEvent::Quit => return Err(RtspError::Aborted),
            ClientEvent::ControlClosed(reason) => {
                sink_warn!(self.logger, "[RTSP] control connection lost: {}", reason);
                return Err(RtspError::ConnectionClosed);
            }
            ClientEvent::Control(Incoming::Interleaved { channel, data }) => {
                let found = self.subsessions.iter().enumerate().find_map(|(i, s)| {
                    let rtp = s.rtp_channel?;
                    (channel == rtp || channel == rtp.wrapping_add(1)).then_some((i, channel != rtp))
                });
                match found {
                    Some((sub, false)) => self.on_rtp(sub, &data),
                    Some((sub, true)) => self.on_rtcp(sub, &data),
                    None => sink_trace!(self.logger, "[RTSP] data on unknown channel {}", channel),
                }
            }
            ClientEvent::Control(Incoming::Request(req)) => {
                sink_debug!(self.logger, "[RTSP] ignoring server request {}", req.method);
            }
            ClientEvent::Control(Incoming::Response(resp)) => {
                sink_debug!(self.logger, "[RTSP] unexpected reply {} {}", resp.code, resp.reason);
            }
            ClientEvent::Udp { sub, rtcp, data } => {
                if rtcp {
                    self.on_rtcp(sub, &data);
                } else {
                    self.on_rtp(sub, &data);
                }
            }
        }
        Ok(())
    }

    fn on_rtp(&mut self, sub: usize, data: &[u8]) {
        let elapsed = self.started.elapsed();
        let Some(s) = self.subsessions.get_mut(sub) else {
            return;
        };
        let pkt = match RtpPacket::decode(data) {
            Ok(p) => p,
            Err(e) => {
                sink_debug!(self.logger, "[RTSP] dropping bad RTP packet: {e}");
                return;
            }
        };
        if pkt.header.payload_type != s.info.payload_type {
            sink_trace!(
                self.logger,
                "[RTSP] dropping RTP packet with payload type {}",
                pkt.header.payload_type
            );
            return;
        }
        let arrival = (elapsed.as_micros() * u128::from(s.info.clock_rate) / 1_000_000) as u32;
        s.rx.on_rtp(pkt.header.sequence_number, pkt.header.timestamp, arrival);
        s.remote_ssrc = Some(pkt.header.ssrc);
        if let Some(sink) = s.sink.as_mut() {
            sink.on_rtp(&pkt);
        }
    }

    fn on_rtcp(&mut self, sub: usize, data: &[u8]) {
        let packets = match RtcpPacket::decode_compound(data) {
            Ok(p) => p,
            Err(e) => {
                sink_debug!(self.logger, "[RTSP] dropping bad RTCP packet: {e}");
                return;
            }
        };
        let Some(s) = self.subsessions.get_mut(sub) else {
            return;
        };
        for pkt in packets {
            match pkt {
                RtcpPacket::Sr(sr) => {
                    s.rx.on_sr_received(sr.info.ntp_msw, sr.info.ntp_lsw, ntp_now());
                }
                RtcpPacket::Bye(bye) => {
                    sink_info!(
                        self.logger,
                        "[RTSP] Received RTCP \"BYE\" on \"{}\"{}",
                        s.info.control_url,
                        bye.reason.map(|r| format!(" (reason: \"{r}\")")).unwrap_or_default()
                    );
                    if let Some(mut sink) = s.sink.take() {
                        sink.close();
                    }
                }
                _ => {}
            }
        }
    }

    fn send_keepalive(&mut self) -> Result<(), RtspError> {
        let url = self.aggregate_url.clone();
        self.conn_mut()?
            .send(RtspRequest::new(Method::GetParameter, url))?;
        sink_debug!(self.logger, "[RTSP] keep-alive sent");
        Ok(())
    }

    fn send_receiver_reports(&mut self) {
        let ssrc = self.ssrc;
        for s in &mut self.subsessions {
            if s.sink.is_none() {
                continue;
            }
            let reports = s
                .remote_ssrc
                .map(|remote| vec![s.rx.build_report_block(remote)])
                .unwrap_or_default();
            let compound = RtcpPacket::encode_compound(&[
                RtcpPacket::Rr(ReceiverReport::new(ssrc, reports)),
                RtcpPacket::Sdes(Sdes::cname(ssrc, self.cname.clone())),
            ]);
            let bytes = match compound {
                Ok(b) => b,
                Err(e) => {
                    sink_warn!(self.logger, "[RTSP] cannot build receiver report: {e}");
                    continue;
                }
            };

            let sent = match (&s.rtcp_socket, s.rtcp_dest, s.rtp_channel) {
                (Some(sock), Some(dest), _) => sock.send_to(&bytes, dest).map(|_| ()).map_err(RtspError::from),
                (_, _, Some(ch)) => match self.conn.as_mut() {
                    Some(conn) => conn.send_interleaved(ch.wrapping_add(1), &bytes),
                    None => Ok(()),
                },
                _ => Ok(()),
            };
            match sent {
                Ok(()) => sink_trace!(self.logger, "[RTSP] receiver report sent ({} bytes)", bytes.len()),
                Err(e) => sink_debug!(self.logger, "[RTSP] receiver report not sent: {e}"),
            }
        }
    }

    fn spawn_udp_reader(
        &self,
        sock: Arc<UdpSocket>,
        sub: usize,
        rtcp: bool,
    ) -> Result<JoinHandle<()>, RtspError> {
        sock.set_read_timeout(Some(UDP_POLL))?;
        let stop = Arc::clone(&self.stop);
        let tx = self.events_tx.clone();
        let name = if rtcp { "rtspcam-rtcp" } else { "rtspcam-rtp" };
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            let mut buf = vec![0u8; UDP_BUF_LEN];
            while !stop.load(Ordering::Acquire) {
                match sock.recv_from(&mut buf) {
                    Ok((n, _)) => {
                        let data = buf[..n].to_vec();
                        if tx.send(ClientEvent::Udp { sub, rtcp, data }).is_err() {
                            break;
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            ErrorKind::WouldBlock
                                | ErrorKind::TimedOut
                                | ErrorKind::Interrupted
                                | ErrorKind::ConnectionReset
                        ) => {}
                    Err(_) => break,
                }
            }
        })?;
        Ok(handle)
    }

    fn conn_mut(&mut self) -> Result<&mut RtspConnection, RtspError> {
        self.conn.as_mut().ok_or(RtspError::ConnectionClosed)
    }

    /// Closes sinks, sends TEARDOWN and joins helper threads. Idempotent.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let mut any_active = false;
        for s in &mut self.subsessions {
            if let Some(mut sink) = s.sink.take() {
                any_active = true;
                sink.close();
            }
        }

        if let Some(conn) = self.conn.as_mut() {
            if any_active {
                let req = RtspRequest::new(Method::Teardown, self.aggregate_url.clone());
                if let Err(e) = conn.send(req) {
                    sink_debug!(self.logger, "[RTSP] TEARDOWN not sent: {e}");
                }
            }
            conn.shutdown();
        }

        self.stop.store(true, Ordering::Release);
        if let Some(t) = self.control_reader.take() {
            let _ = t.join();
        }
        for t in self.udp_readers.drain(..) {
            let _ = t.join();
        }
        sink_info!(self.logger, "[RTSP] session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_control_reader(
    stream: TcpStream,
    tx: Sender<ClientEvent>,
) -> Result<JoinHandle<()>, RtspError> {
    let handle = thread::Builder::new()
        .name("rtspcam-rtsp-reader".into())
        .spawn(move || {
            let mut reader = RtspReader::new(stream);
            loop {
                match reader.read_incoming() {
                    Ok(msg) => {
                        if tx.send(ClientEvent::Control(msg)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(ClientEvent::ControlClosed(e.to_string()));
                        break;
                    }
                }
            }
        })?;
    Ok(handle)
}

/// Binds an even RTP port and the odd RTCP port above it.
fn bind_rtp_pair(ipv6: bool) -> Result<(UdpSocket, UdpSocket), RtspError> {
    let any = if ipv6 { "[::]:0" } else { "0.0.0.0:0" };
    for _ in 0..16 {
        let rtp = UdpSocket::bind(any)?;
        let mut addr = rtp.local_addr()?;
        let port = addr.port();
        if port % 2 != 0 || port == u16::MAX - 1 {
            continue;
        }
        addr.set_port(port + 1);
        if let Ok(rtcp) = UdpSocket::bind(addr) {
            return Ok((rtp, rtcp));
        }
    }
    Err(io::Error::new(ErrorKind::AddrInUse, "no free even/odd UDP port pair").into())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn rtp_pair_is_even_odd() {
        let (rtp, rtcp) = bind_rtp_pair(false).unwrap();
        let p = rtp.local_addr().unwrap().port();
        assert_eq!(p % 2, 0);
        assert_eq!(rtcp.local_addr().unwrap().port(), p + 1);
    }

    #[test]
    fn invalid_url_fails_fast() {
        let slot = Arc::new(ErrorSlot::new());
        let factory: SinkFactory = Box::new(|_| Err("unused".into()));
        let r = RtspClient::start(
            "http://cam/",
            ClientOptions::default(),
            factory,
            slot,
            Arc::new(crate::log::NoopLogSink),
        );
        assert!(matches!(r, Err(RtspError::InvalidUrl(_))));
    }

    #[test]
    fn refused_connection_reaches_error_slot() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let slot = Arc::new(ErrorSlot::new());
        let factory: SinkFactory = Box::new(|_| Err("unused".into()));
        let mut c = RtspClient::start(
            &format!("rtsp://127.0.0.1:{port}/x"),
            ClientOptions::default(),
            factory,
            Arc::clone(&slot),
            Arc::new(crate::log::NoopLogSink),
        )
        .unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !slot.is_set() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(slot.check().unwrap().contains("Failed to connect"));
        c.quit();
        c.quit();
        assert!(c.is_finished());
    }
}
