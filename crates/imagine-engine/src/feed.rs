use std::collections::{HashSet, VecDeque};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use imagine_contracts::events::{EventKind, EventPayload, EventWriter};
use imagine_contracts::feed::{FeedItem, FeedRecord};
use serde_json::Value;

use crate::error_chain_text;

pub const PAGE_SIZE: usize = 12;
pub const VISIBLE_CAP: usize = 120;
pub const RECONNECT_DELAY: Duration = Duration::from_secs(12);
/// A signalled worker parked on a quiet stream exits within this bound.
pub const FEED_READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSpeed {
    Slow,
    Normal,
}

impl FeedSpeed {
    pub fn drain_interval(self) -> Duration {
        match self {
            FeedSpeed::Slow => Duration::from_secs(30),
            FeedSpeed::Normal => Duration::from_secs(15),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedSpeed::Slow => "slow",
            FeedSpeed::Normal => "normal",
        }
    }
}

/// Pure buffering state for the live feed: a monotonic seen-set keyed by
/// URL, a FIFO of records waiting to surface, and the visible newest-first
/// list the UI pages over.
///
/// The seen-set is never pruned, even past the visible cap; long sessions
/// grow it without bound, matching the upstream behavior.
#[derive(Debug)]
pub struct FeedQueue {
    seen: HashSet<String>,
    pending: VecDeque<FeedItem>,
    visible: Vec<FeedItem>,
    enabled: bool,
    auto_paused: bool,
    page_index: usize,
}

impl FeedQueue {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            pending: VecDeque::new(),
            visible: Vec::new(),
            enabled: true,
            auto_paused: false,
            page_index: 0,
        }
    }

    /// Ingests one decoded record. Duplicates are dropped outright. Until
    /// the first page is full (and the newest page is showing), accepted
    /// items bypass the drain queue so the feed never opens empty;
    /// afterwards they buffer in arrival order.
    pub fn offer(&mut self, item: FeedItem) -> bool {
        if !self.seen.insert(item.url.clone()) {
            return false;
        }
        if self.fast_filling() {
            self.visible.insert(0, item);
        } else {
            self.pending.push_back(item);
        }
        true
    }

    /// Surfaces at most one pending item. Inert while disabled, while the
    /// first page is still fast-filling, or when nothing is buffered.
    pub fn drain_tick(&mut self) -> bool {
        if !self.enabled || self.fast_filling() {
            return false;
        }
        let Some(item) = self.pending.pop_front() else {
            return false;
        };
        self.visible.insert(0, item);
        self.visible.truncate(VISIBLE_CAP);
        true
    }

    /// Manual pause/resume. Manual control supersedes the auto-pause
    /// bookkeeping in both directions, so paging back to the newest page
    /// never overrides an explicit user pause.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.auto_paused = false;
    }

    /// Moves toward older items. Leaving the newest page pauses ingestion
    /// on the user's behalf; buffering continues underneath.
    pub fn page_older(&mut self) -> bool {
        if (self.page_index + 1) * PAGE_SIZE >= self.visible.len() {
            return false;
        }
        self.page_index += 1;
        if self.enabled {
            self.enabled = false;
            self.auto_paused = true;
        }
        true
    }

    /// Moves toward newer items. Arriving back at the newest page resumes
    /// ingestion only when the pause was automatic.
    pub fn page_newer(&mut self) -> bool {
        if self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        if self.page_index == 0 && self.auto_paused {
            self.enabled = true;
            self.auto_paused = false;
        }
        true
    }

    pub fn visible_page(&self) -> &[FeedItem] {
        let start = (self.page_index * PAGE_SIZE).min(self.visible.len());
        let end = (start + PAGE_SIZE).min(self.visible.len());
        &self.visible[start..end]
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    fn fast_filling(&self) -> bool {
        self.enabled && self.page_index == 0 && self.visible.len() < PAGE_SIZE
    }
}

impl Default for FeedQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) enum WorkerNotice {
    Connected,
    Record(FeedRecord),
    Disconnected(String),
}

/// Reads one SSE-framed stream, invoking `on_data` with each complete
/// `data:` payload. Comment lines (leading `:`) are skipped; an event is
/// dispatched on the blank separator line. Returns when the stream ends or
/// the callback asks to stop.
pub(crate) fn read_sse<R: BufRead>(
    reader: &mut R,
    mut on_data: impl FnMut(&str) -> bool,
) -> Result<()> {
    let mut line = String::new();
    let mut data_lines: Vec<String> = Vec::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).context("feed stream read failed")?;
        if read == 0 {
            return Ok(());
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            if !data_lines.is_empty() {
                let payload = data_lines.join("\n");
                data_lines.clear();
                if !on_data(&payload) {
                    return Ok(());
                }
            }
            continue;
        }
        if trimmed.starts_with(':') {
            continue;
        }
        if let Some(value) = trimmed.strip_prefix("data:") {
            data_lines.push(value.trim_start().to_string());
        }
    }
}

fn run_worker(feed_url: String, stop: Arc<AtomicBool>, tx: Sender<WorkerNotice>) {
    let outcome = (|| -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(FEED_READ_TIMEOUT)
            .build()
            .context("feed client build failed")?;
        let response = client
            .get(&feed_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .with_context(|| format!("feed connection failed ({feed_url})"))?;
        if !response.status().is_success() {
            anyhow::bail!("feed returned status {}", response.status());
        }
        if tx.send(WorkerNotice::Connected).is_err() {
            return Ok(());
        }

        let mut reader = std::io::BufReader::new(response);
        read_sse(&mut reader, |payload| {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            // Undecodable payloads are skipped; the stream continues.
            match serde_json::from_str::<FeedRecord>(payload) {
                Ok(record) => tx.send(WorkerNotice::Record(record)).is_ok(),
                Err(_) => true,
            }
        })
    })();

    if stop.load(Ordering::Relaxed) {
        return;
    }
    let reason = match outcome {
        Ok(()) => "feed stream ended".to_string(),
        Err(err) => error_chain_text(&err, 300),
    };
    let _ = tx.send(WorkerNotice::Disconnected(reason));
}

/// Point-in-time view of the feed for rendering.
#[derive(Debug, Clone)]
pub struct FeedStatus {
    pub enabled: bool,
    pub auto_paused: bool,
    pub connected: bool,
    pub error: Option<String>,
    pub visible: usize,
    pub pending: usize,
    pub page_index: usize,
    pub speed: FeedSpeed,
}

/// Owns the queue, the live connection, and the drain/reconnect timers.
/// All stream handling funnels through `poll`, which the caller invokes
/// from its own loop; nothing here owns a timer thread.
pub struct FeedSession {
    queue: FeedQueue,
    speed: FeedSpeed,
    base: String,
    feed_url: String,
    events: EventWriter,
    rx: Option<Receiver<WorkerNotice>>,
    stop: Option<Arc<AtomicBool>>,
    worker: Option<JoinHandle<()>>,
    generation: u64,
    connected: bool,
    error: Option<String>,
    reconnect_at: Option<Instant>,
    last_drain: Option<Instant>,
}

impl FeedSession {
    /// The session starts paused: the queue accepts nothing and no
    /// connection exists until `set_enabled(true)` opens one, so an
    /// enabled queue always has a connection alongside it.
    pub fn new(feed_url: String, base: String, events: EventWriter) -> Self {
        let mut queue = FeedQueue::new();
        queue.set_enabled(false);
        Self {
            queue,
            speed: FeedSpeed::Normal,
            base,
            feed_url,
            events,
            rx: None,
            stop: None,
            worker: None,
            generation: 0,
            connected: false,
            error: None,
            reconnect_at: None,
            last_drain: None,
        }
    }

    /// Manual pause/resume. Enabling opens a connection if none is live
    /// and re-arms the drain timer; disabling signals the worker, drops
    /// the channel so no further record is observable, and detaches the
    /// thread.
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) -> Result<()> {
        self.queue.set_enabled(enabled);
        if enabled {
            self.events.emit(EventKind::FeedEnabled, EventPayload::new())?;
            self.last_drain = Some(now);
            if self.rx.is_none() {
                self.connect();
            }
        } else {
            self.events.emit(EventKind::FeedDisabled, EventPayload::new())?;
            self.disconnect();
            self.reconnect_at = None;
        }
        Ok(())
    }

    /// Pumps worker notices, applies due drain ticks, and runs the single
    /// scheduled reconnect attempt. Call this regularly; it never blocks.
    pub fn poll(&mut self, now: Instant) -> Result<FeedStatus> {
        self.pump(now)?;

        if let Some(due) = self.reconnect_at {
            if now >= due && self.queue.is_enabled() && self.rx.is_none() {
                self.reconnect_at = None;
                self.connect();
            }
        }

        // The first poll arms the timer; ticks fire one interval apart.
        let interval = self.speed.drain_interval();
        match self.last_drain {
            None => self.last_drain = Some(now),
            Some(last) if now.duration_since(last) >= interval => {
                self.queue.drain_tick();
                self.last_drain = Some(now);
            }
            Some(_) => {}
        }

        Ok(self.status())
    }

    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            enabled: self.queue.is_enabled(),
            auto_paused: self.queue.is_auto_paused(),
            connected: self.connected,
            error: self.error.clone(),
            visible: self.queue.visible_len(),
            pending: self.queue.pending_len(),
            page_index: self.queue.page_index(),
            speed: self.speed,
        }
    }

    pub fn set_speed(&mut self, speed: FeedSpeed) {
        self.speed = speed;
    }

    pub fn speed(&self) -> FeedSpeed {
        self.speed
    }

    pub fn page_older(&mut self) -> bool {
        self.queue.page_older()
    }

    pub fn page_newer(&mut self) -> bool {
        self.queue.page_newer()
    }

    pub fn visible_page(&self) -> &[FeedItem] {
        self.queue.visible_page()
    }

    pub fn queue(&self) -> &FeedQueue {
        &self.queue
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn pump(&mut self, now: Instant) -> Result<()> {
        let Some(rx) = &self.rx else {
            return Ok(());
        };

        let mut disconnected: Option<String> = None;
        loop {
            match rx.try_recv() {
                Ok(WorkerNotice::Connected) => {
                    self.connected = true;
                    self.error = None;
                    self.events.emit(EventKind::FeedConnected, EventPayload::new())?;
                }
                Ok(WorkerNotice::Record(record)) => {
                    if let Some(item) = record.into_item(&self.base) {
                        self.queue.offer(item);
                        // A live record clears any stale error banner.
                        self.error = None;
                    }
                }
                Ok(WorkerNotice::Disconnected(reason)) => {
                    disconnected = Some(reason);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = Some("feed worker exited".to_string());
                    break;
                }
            }
        }

        if let Some(reason) = disconnected {
            self.connected = false;
            self.error = Some(reason.clone());
            self.rx = None;
            self.stop = None;
            self.worker = None;
            let mut payload = EventPayload::new();
            payload.insert("reason".to_string(), Value::String(reason));
            self.events.emit(EventKind::FeedDisconnected, payload)?;
            // Exactly one reconnect attempt per disconnect.
            if self.queue.is_enabled() {
                self.reconnect_at = Some(now + RECONNECT_DELAY);
            }
        }
        Ok(())
    }

    fn connect(&mut self) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let feed_url = self.feed_url.clone();
        let worker_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || run_worker(feed_url, worker_stop, tx));

        self.generation += 1;
        self.rx = Some(rx);
        self.stop = Some(stop);
        self.worker = Some(handle);
        self.connected = false;
    }

    fn disconnect(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
        // Dropping the receiver makes a blocked worker exit at its next
        // send; the thread is detached rather than joined.
        self.rx = None;
        self.worker = None;
        self.connected = false;
    }

    /// Stands in for `connect` under test: installs a channel the test
    /// feeds directly and marks the queue live, as an opened connection
    /// would be.
    #[cfg(test)]
    fn attach_channel(&mut self) -> Sender<WorkerNotice> {
        let (tx, rx) = mpsc::channel();
        self.generation += 1;
        self.rx = Some(rx);
        self.queue.set_enabled(true);
        tx
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(tag: usize) -> FeedItem {
        FeedItem {
            url: format!("https://example.com/{tag}.png"),
            prompt: Some(format!("prompt {tag}")),
            model: None,
            seed: None,
            width: None,
            height: None,
        }
    }

    fn filled_queue(count: usize) -> FeedQueue {
        let mut queue = FeedQueue::new();
        for index in 0..count {
            queue.offer(item(index));
            queue.drain_tick();
        }
        queue
    }

    #[test]
    fn duplicate_urls_are_rejected_once_seen() {
        let mut queue = FeedQueue::new();
        assert!(queue.offer(item(1)));
        assert!(!queue.offer(item(1)));
        assert_eq!(queue.visible_len(), 1);
    }

    #[test]
    fn first_page_fast_fills_without_draining() {
        let mut queue = FeedQueue::new();
        for index in 0..PAGE_SIZE {
            queue.offer(item(index));
        }
        assert_eq!(queue.visible_len(), PAGE_SIZE);
        assert_eq!(queue.pending_len(), 0);

        // The thirteenth record buffers instead.
        queue.offer(item(PAGE_SIZE));
        assert_eq!(queue.visible_len(), PAGE_SIZE);
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn fast_fill_prepends_newest_first() {
        let mut queue = FeedQueue::new();
        queue.offer(item(1));
        queue.offer(item(2));
        assert_eq!(queue.visible_page()[0].url, item(2).url);
        assert_eq!(queue.visible_page()[1].url, item(1).url);
    }

    #[test]
    fn drain_pops_at_most_one_per_tick() {
        let mut queue = filled_queue(PAGE_SIZE);
        queue.offer(item(100));
        queue.offer(item(101));
        assert_eq!(queue.pending_len(), 2);

        assert!(queue.drain_tick());
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.visible_page()[0].url, item(100).url);

        assert!(queue.drain_tick());
        assert_eq!(queue.pending_len(), 0);
        assert!(!queue.drain_tick());
    }

    #[test]
    fn drain_is_inert_while_disabled_or_fast_filling() {
        let mut queue = FeedQueue::new();
        queue.set_enabled(false);
        queue.offer(item(1));
        assert!(!queue.drain_tick());
        assert_eq!(queue.pending_len(), 1);

        let mut filling = FeedQueue::new();
        filling.offer(item(1));
        assert!(!filling.drain_tick());
    }

    #[test]
    fn visible_list_caps_at_120_evicting_oldest() {
        let mut queue = filled_queue(VISIBLE_CAP);
        assert_eq!(queue.visible_len(), VISIBLE_CAP);

        queue.offer(item(500));
        queue.drain_tick();
        assert_eq!(queue.visible_len(), VISIBLE_CAP);
        assert_eq!(queue.visible_page()[0].url, item(500).url);
    }

    #[test]
    fn seen_set_outlives_visible_eviction() {
        let mut queue = filled_queue(VISIBLE_CAP + 10);
        // item(0) was evicted from the visible list long ago.
        assert!(!queue.offer(item(0)));
        assert_eq!(queue.visible_len(), VISIBLE_CAP);
    }

    #[test]
    fn paging_older_auto_pauses() {
        let mut queue = filled_queue(PAGE_SIZE * 3);
        assert!(queue.is_enabled());

        assert!(queue.page_older());
        assert!(!queue.is_enabled());
        assert!(queue.is_auto_paused());
        assert_eq!(queue.page_index(), 1);
    }

    #[test]
    fn paging_back_to_newest_resumes_after_auto_pause() {
        let mut queue = filled_queue(PAGE_SIZE * 3);
        queue.page_older();
        queue.page_older();
        assert_eq!(queue.page_index(), 2);

        queue.page_newer();
        assert!(!queue.is_enabled());

        queue.page_newer();
        assert_eq!(queue.page_index(), 0);
        assert!(queue.is_enabled());
        assert!(!queue.is_auto_paused());
    }

    #[test]
    fn manual_pause_survives_paging_back() {
        let mut queue = filled_queue(PAGE_SIZE * 2);
        queue.page_older();
        // An explicit pause while browsing clears the auto-pause claim.
        queue.set_enabled(false);
        assert!(!queue.is_auto_paused());

        queue.page_newer();
        assert_eq!(queue.page_index(), 0);
        assert!(!queue.is_enabled());
    }

    #[test]
    fn page_older_stops_at_the_last_window() {
        let mut queue = filled_queue(PAGE_SIZE + 3);
        assert!(queue.page_older());
        assert!(!queue.page_older());
        assert_eq!(queue.visible_page().len(), 3);
    }

    #[test]
    fn buffering_continues_while_auto_paused() {
        let mut queue = filled_queue(PAGE_SIZE * 2);
        queue.page_older();
        assert!(queue.offer(item(900)));
        assert_eq!(queue.pending_len(), 1);
        assert!(!queue.drain_tick());

        queue.page_newer();
        assert!(queue.drain_tick());
        assert_eq!(queue.visible_page()[0].url, item(900).url);
    }

    #[test]
    fn sse_frames_dispatch_on_blank_line() -> Result<()> {
        let raw = ": keepalive\ndata: {\"a\":1}\n\ndata: part one\ndata: part two\n\n";
        let mut reader = std::io::BufReader::new(raw.as_bytes());
        let mut payloads = Vec::new();
        read_sse(&mut reader, |payload| {
            payloads.push(payload.to_string());
            true
        })?;
        assert_eq!(payloads, vec!["{\"a\":1}", "part one\npart two"]);
        Ok(())
    }

    #[test]
    fn sse_ignores_trailing_partial_event() -> Result<()> {
        let raw = "data: {\"a\":1}\n\ndata: unterminated";
        let mut reader = std::io::BufReader::new(raw.as_bytes());
        let mut payloads = Vec::new();
        read_sse(&mut reader, |payload| {
            payloads.push(payload.to_string());
            true
        })?;
        assert_eq!(payloads, vec!["{\"a\":1}"]);
        Ok(())
    }

    fn test_session(dir: &std::path::Path) -> FeedSession {
        let events = EventWriter::new(dir.join("events.jsonl"), "session-test");
        FeedSession::new(
            "http://127.0.0.1:9/feed".to_string(),
            "https://image.pollinations.ai".to_string(),
            events,
        )
    }

    #[test]
    fn session_starts_paused_with_no_connection() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let session = test_session(temp.path());
        let status = session.status();
        assert!(!status.enabled);
        assert!(!status.connected);
        assert!(!status.auto_paused);
        Ok(())
    }

    #[test]
    fn disabled_session_worker_terminates() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        let start = Instant::now();

        session.set_enabled(true, start)?;
        let handle = session.worker.take().expect("worker spawned on enable");
        session.set_enabled(false, start)?;

        // The signalled worker must wind down on its own; joining hangs
        // forever if it leaks.
        handle.join().expect("worker thread exits");
        assert!(!session.status().enabled);
        Ok(())
    }

    #[test]
    fn session_surfaces_records_and_clears_errors() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        let tx = session.attach_channel();
        let now = Instant::now();

        tx.send(WorkerNotice::Connected).unwrap();
        tx.send(WorkerNotice::Record(FeedRecord {
            url: Some("https://example.com/live.png".to_string()),
            prompt: Some("live".to_string()),
            ..FeedRecord::default()
        }))
        .unwrap();

        let status = session.poll(now)?;
        assert!(status.connected);
        assert_eq!(status.visible, 1);
        assert!(status.error.is_none());
        Ok(())
    }

    #[test]
    fn disconnect_schedules_exactly_one_reconnect() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        let tx = session.attach_channel();
        let start = Instant::now();
        let first_generation = session.generation();

        tx.send(WorkerNotice::Disconnected("stream ended".to_string()))
            .unwrap();
        let status = session.poll(start)?;
        assert!(!status.connected);
        assert_eq!(status.error.as_deref(), Some("stream ended"));
        assert_eq!(session.generation(), first_generation);

        // Before the delay elapses nothing reconnects.
        session.poll(start + Duration::from_secs(5))?;
        assert_eq!(session.generation(), first_generation);

        // At the deadline one fresh connection opens.
        session.poll(start + RECONNECT_DELAY)?;
        assert_eq!(session.generation(), first_generation + 1);

        // And only one.
        session.poll(start + RECONNECT_DELAY + Duration::from_secs(1))?;
        assert_eq!(session.generation(), first_generation + 1);
        Ok(())
    }

    #[test]
    fn manual_disable_cancels_pending_reconnect() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        let tx = session.attach_channel();
        let start = Instant::now();
        let generation = session.generation();

        tx.send(WorkerNotice::Disconnected("gone".to_string()))
            .unwrap();
        session.poll(start)?;
        session.set_enabled(false, start)?;

        session.poll(start + RECONNECT_DELAY + Duration::from_secs(1))?;
        assert_eq!(session.generation(), generation);
        Ok(())
    }

    #[test]
    fn drain_waits_for_the_configured_interval() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        let tx = session.attach_channel();
        let start = Instant::now();

        // Fill the first page plus two buffered records.
        for index in 0..PAGE_SIZE + 2 {
            tx.send(WorkerNotice::Record(FeedRecord {
                url: Some(format!("https://example.com/{index}.png")),
                prompt: Some("p".to_string()),
                ..FeedRecord::default()
            }))
            .unwrap();
        }

        let status = session.poll(start)?;
        assert_eq!(status.visible, PAGE_SIZE);
        assert_eq!(status.pending, 2);

        // Within the interval nothing surfaces.
        let status = session.poll(start + Duration::from_secs(5))?;
        assert_eq!(status.pending, 2);

        let status = session.poll(start + Duration::from_secs(15))?;
        assert_eq!(status.pending, 1);
        Ok(())
    }

    #[test]
    fn slow_speed_doubles_the_interval() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = test_session(temp.path());
        session.set_speed(FeedSpeed::Slow);
        let tx = session.attach_channel();
        let start = Instant::now();

        for index in 0..PAGE_SIZE + 1 {
            tx.send(WorkerNotice::Record(FeedRecord {
                url: Some(format!("https://example.com/{index}.png")),
                prompt: Some("p".to_string()),
                ..FeedRecord::default()
            }))
            .unwrap();
        }

        session.poll(start)?;
        let status = session.poll(start + Duration::from_secs(15))?;
        assert_eq!(status.pending, 1);

        let status = session.poll(start + Duration::from_secs(30))?;
        assert_eq!(status.pending, 0);
        Ok(())
    }
}
