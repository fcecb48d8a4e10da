use super::session::{CallSession, Participant};
use super::stats::{CallRecord, StreamStats, TranscriptEntry};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub type SharedSession = Arc<Mutex<CallSession>>;

struct StreamEntry {
    call_sid: String,
    participant: Participant,
    session: SharedSession,
}

/// Call records kept when no explicit bound is configured
pub const DEFAULT_MAX_CALLS: usize = 500;

/// All active calls and media streams of the service
pub struct SessionRegistry {
    streams: RwLock<HashMap<String, StreamEntry>>,
    calls: RwLock<HashMap<String, CallRecord>>,
    max_calls: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_CALLS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry tracking at most `max_calls` call records
    pub fn with_capacity(max_calls: usize) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            calls: RwLock::new(HashMap::new()),
            max_calls: max_calls.max(1),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Insert or replace a call record.
    ///
    /// At capacity the oldest call without a live stream is evicted first.
    pub async fn register_call(&self, record: CallRecord) {
        let streams = self.streams.read().await;
        let mut calls = self.calls.write().await;

        if !calls.contains_key(&record.call_sid) && calls.len() >= self.max_calls {
            let oldest = calls
                .values()
                .filter(|call| !streams.values().any(|s| s.call_sid == call.call_sid))
                .min_by_key(|call| call.started_at)
                .map(|call| call.call_sid.clone());

            match oldest {
                Some(call_sid) => {
                    calls.remove(&call_sid);
                    info!("Evicted call {} ({} calls tracked)", call_sid, self.max_calls);
                }
                None => warn!("All {} tracked calls have live streams", calls.len()),
            }
        }

        info!("Registered call {} ({})", record.call_sid, record.mode.as_str());
        calls.insert(record.call_sid.clone(), record);
    }

    pub async fn get_call(&self, call_sid: &str) -> Option<CallRecord> {
        self.calls.read().await.get(call_sid).cloned()
    }

    pub async fn list_calls(&self) -> Vec<CallRecord> {
        let calls = self.calls.read().await;
        let mut list: Vec<CallRecord> = calls.values().cloned().collect();
        list.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        list
    }

    pub async fn update_call_status(&self, call_sid: &str, status: &str) -> bool {
        let mut calls = self.calls.write().await;
        match calls.get_mut(call_sid) {
            Some(record) => {
                record.status = status.to_string();
                true
            }
            None => false,
        }
    }

    pub async fn append_transcript(&self, call_sid: &str, entry: TranscriptEntry) -> bool {
        let mut calls = self.calls.write().await;
        match calls.get_mut(call_sid) {
            Some(record) => {
                record.transcript.push(entry);
                true
            }
            None => false,
        }
    }

    /// Remove a finished call together with all of its streams
    pub async fn end_call(&self, call_sid: &str) -> Option<CallRecord> {
        let removed_streams = {
            let mut streams = self.streams.write().await;
            let before = streams.len();
            streams.retain(|_, entry| entry.call_sid != call_sid);
            before - streams.len()
        };

        let record = self.calls.write().await.remove(call_sid).map(|mut record| {
            record.status = "completed".to_string();
            record.ended_at = Some(Utc::now());
            record
        });

        info!(
            "Ended call {} ({} streams removed)",
            call_sid, removed_streams
        );

        record
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    // ========================================================================
    // Streams
    // ========================================================================

    /// Track a new stream; a duplicate start replaces the previous record
    pub async fn start_stream(&self, session: CallSession) -> SharedSession {
        let stream_sid = session.stream_sid.clone();
        let entry = StreamEntry {
            call_sid: session.call_sid.clone(),
            participant: session.participant,
            session: Arc::new(Mutex::new(session)),
        };
        let shared = Arc::clone(&entry.session);

        let mut streams = self.streams.write().await;
        if streams.insert(stream_sid.clone(), entry).is_some() {
            warn!("Stream {} started twice; replacing session", stream_sid);
        }

        shared
    }

    pub async fn get_stream(&self, stream_sid: &str) -> Option<SharedSession> {
        self.streams
            .read()
            .await
            .get(stream_sid)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// Remove a stopped stream. Ends its call when no other stream remains.
    pub async fn close_stream(&self, stream_sid: &str) -> Option<CallRecord> {
        let call_sid = {
            let mut streams = self.streams.write().await;
            let entry = streams.remove(stream_sid)?;
            if streams.values().any(|other| other.call_sid == entry.call_sid) {
                return None;
            }
            entry.call_sid
        };

        self.end_call(&call_sid).await
    }

    /// The stream carrying the other leg of a forwarded call
    pub async fn find_peer(&self, call_sid: &str, participant: Participant) -> Option<SharedSession> {
        let peer = participant.peer()?;
        self.streams
            .read()
            .await
            .values()
            .find(|entry| entry.call_sid == call_sid && entry.participant == peer)
            .map(|entry| Arc::clone(&entry.session))
    }

    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    pub async fn stream_stats(&self) -> Vec<StreamStats> {
        let sessions: Vec<SharedSession> = self
            .streams
            .read()
            .await
            .values()
            .map(|entry| Arc::clone(&entry.session))
            .collect();

        let mut stats = Vec::with_capacity(sessions.len());
        for session in sessions {
            stats.push(session.lock().await.stats());
        }
        stats
    }

    pub async fn streams_for_call(&self, call_sid: &str) -> Vec<StreamStats> {
        self.stream_stats()
            .await
            .into_iter()
            .filter(|s| s.call_sid == call_sid)
            .collect()
    }
}
