use std::{
    sync::{Arc, mpsc},
    thread::{self, JoinHandle},
};

use crate::{
    log::LogSink,
    media::{
        h264_decoder::H264Decoder, media_error::MediaError, video_frame::VideoFrame,
        video_sink::AccessUnitSink,
    },
    sink_debug, sink_error, sink_info, sink_trace,
    sync::{Queue, Swapper},
};

/// Backlog above which the worker reports that it is falling behind.
const BACKLOG_WARN: usize = 3;

pub enum DecoderCommand {
    Decode(Vec<u8>),
    Stop,
}

/// Asynchronous H.264 decoder.
///
/// Access units are queued to a worker thread; each decoded picture is
/// published to the shared [`Swapper`], replacing any picture the reader
/// has not taken yet.
pub struct Decoder {
    queue: Arc<Queue<DecoderCommand>>,
    worker: Option<JoinHandle<()>>,
    logger: Arc<dyn LogSink>,
}

impl Decoder {
    /// Starts the worker and waits until its decoder is initialised.
    ///
    /// # Errors
    /// `WorkerSpawn` if the thread cannot start, `DecoderInit` if openh264
    /// fails to initialise inside it.
    pub fn spawn(
        frames: Arc<Swapper<VideoFrame>>,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, MediaError> {
        let queue = Arc::new(Queue::new());
        let (init_tx, init_rx) = mpsc::channel();

        let worker_queue = Arc::clone(&queue);
        let worker_logger = Arc::clone(&logger);
        let worker = thread::Builder::new()
            .name("rtspcam-decoder".into())
            .spawn(move || {
                let decoder = match H264Decoder::new(Arc::clone(&worker_logger)) {
                    Ok(d) => {
                        let _ = init_tx.send(Ok(()));
                        d
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };
                run_worker(decoder, &worker_queue, &frames, worker_logger.as_ref());
            })
            .map_err(|e| MediaError::WorkerSpawn(e.to_string()))?;

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(MediaError::DecoderInit("decoder thread exited".into()));
            }
        }

        sink_debug!(logger, "[Decoder] worker started");
        Ok(Self {
            queue,
            worker: Some(worker),
            logger,
        })
    }

    /// Queues a copy of one Annex-B access unit.
    pub fn send(&self, au: &[u8]) {
        self.queue.push(DecoderCommand::Decode(au.to_vec()));
    }

    /// Access units waiting to be decoded.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl AccessUnitSink for Decoder {
    fn on_access_unit(&mut self, au: &[u8]) {
        self.send(au);
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        self.queue.push(DecoderCommand::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                sink_error!(self.logger, "[Decoder] worker panicked");
            }
        }
    }
}

fn run_worker(
    mut decoder: H264Decoder,
    queue: &Queue<DecoderCommand>,
    frames: &Swapper<VideoFrame>,
    logger: &dyn LogSink,
) {
    let mut frame = VideoFrame::default();
    loop {
        let au = match queue.pop() {
            DecoderCommand::Decode(au) => au,
            DecoderCommand::Stop => break,
        };

        let backlog = queue.len();
        if backlog > BACKLOG_WARN {
            sink_debug!(logger, "[Decoder] {} access units queued", backlog);
        }

        match decoder.decode(&au, &mut frame) {
            Ok(true) => frame = frames.push(frame),
            Ok(false) => {
                sink_trace!(logger, "[Decoder] decoder needs more NALs for this AU");
            }
            Err(e) => sink_error!(logger, "[Decoder] {e}"),
        }
    }
    sink_info!(
        logger,
        "[Decoder] stopped after {} frames",
        decoder.frames_decoded()
    );
}
