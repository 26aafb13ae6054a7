//! In-memory session map with sliding expiry.

use std::collections::HashMap;

use briefhulp_chat::{ChatMessage, ParsedExplanation};
use briefhulp_core::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::types::{Session, SessionMode};

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(ttl_minutes: u64, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes.max(1) as i64),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Start a new session, evicting the least recently active one when full.
    pub fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session::new(uuid::Uuid::new_v4().to_string(), now);

        let mut sessions = self.sessions.write();
        Self::prune_locked(&mut sessions, now - self.ttl);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.last_active)
                .map(|s| s.id.clone());
            match oldest {
                Some(id) => {
                    debug!("Evicting session {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }
        sessions.insert(session.id.clone(), session.clone());
        info!("Created session {} ({} active)", session.id, sessions.len());
        session
    }

    /// Snapshot of a session. Touches its expiry.
    pub fn get(&self, id: &str) -> Result<Session> {
        self.update(id, |_| Ok(()))
    }

    /// Clear the session's letter, result and transcript. The id stays.
    pub fn reset(&self, id: &str) -> Result<Session> {
        self.update(id, |s| {
            s.clear();
            Ok(())
        })
    }

    /// Store a new explanation under a fresh result id. The transcript
    /// restarts with the summary.
    pub fn record_result(
        &self,
        id: &str,
        letter_text: String,
        parsed: ParsedExplanation,
    ) -> Result<Session> {
        self.update(id, |s| {
            s.result_id += 1;
            s.mode = SessionMode::Explain;
            s.transcript = vec![ChatMessage::assistant(parsed.summary.clone())];
            s.letter_text = Some(letter_text);
            s.summary = Some(parsed.summary);
            s.analysis = parsed.analysis;
            s.consequences = None;
            s.feedback_given = false;
            Ok(())
        })
    }

    /// Cache the consequences computed for `result_id`.
    pub fn set_consequences(&self, id: &str, result_id: u64, text: String) -> Result<Session> {
        self.update(id, |s| {
            s.result_of(result_id)?;
            s.consequences = Some(text);
            Ok(())
        })
    }

    /// Append a question and its answer, both about `result_id`, to the transcript.
    pub fn append_exchange(
        &self,
        id: &str,
        result_id: u64,
        question: &str,
        answer: &str,
    ) -> Result<Session> {
        self.update(id, |s| {
            s.result_of(result_id)?;
            s.transcript.push(ChatMessage::user(question));
            s.transcript.push(ChatMessage::assistant(answer));
            Ok(())
        })
    }

    /// Flag feedback for the current result. Fails when already given.
    /// The returned snapshot carries the result id the flag belongs to.
    pub fn mark_feedback(&self, id: &str) -> Result<Session> {
        self.update(id, |s| {
            s.result()?;
            if s.feedback_given {
                return Err(Error::FeedbackGiven);
            }
            s.feedback_given = true;
            Ok(())
        })
    }

    /// Undo [`SessionManager::mark_feedback`] after the sink failed. Only
    /// reverts while `result_id` is still the current result.
    pub fn clear_feedback(&self, id: &str, result_id: u64) -> Result<Session> {
        self.update(id, |s| {
            if s.result_id != result_id {
                return Err(Error::ResultChanged {
                    expected: result_id,
                    current: s.result_id,
                });
            }
            s.feedback_given = false;
            Ok(())
        })
    }

    /// Drop sessions idle longer than the TTL.
    pub fn prune(&self) -> usize {
        self.prune_idle_before(Utc::now() - self.ttl)
    }

    /// Drop sessions whose last activity is before `cutoff`.
    pub fn prune_idle_before(&self, cutoff: DateTime<Utc>) -> usize {
        let removed = Self::prune_locked(&mut self.sessions.write(), cutoff);
        if removed > 0 {
            info!("Pruned {} idle sessions", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn prune_locked(sessions: &mut HashMap<String, Session>, cutoff: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        before - sessions.len()
    }

    /// Run `f` on a live session and return a snapshot. Expired sessions
    /// are removed and reported as not found. A failing `f` leaves the
    /// session untouched.
    fn update<F>(&self, id: &str, f: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let now = Utc::now();
        let mut sessions = self.sessions.write();

        let expired = match sessions.get(id) {
            None => return Err(Error::NotFound(format!("session {id}"))),
            Some(s) => s.last_active < now - self.ttl,
        };
        if expired {
            sessions.remove(id);
            debug!("Session {} expired", id);
            return Err(Error::NotFound(format!("session {id}")));
        }

        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("session {id}")))?;
        let mut draft = session.clone();
        f(&mut draft)?;
        draft.last_active = now;
        *session = draft;
        Ok(session.clone())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(60, DEFAULT_MAX_SESSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefhulp_chat::{LetterAnalysis, SuggestedAction};

    fn parsed(summary: &str) -> ParsedExplanation {
        ParsedExplanation {
            summary: summary.into(),
            analysis: LetterAnalysis {
                action: Some(SuggestedAction::Pay),
                sender: Some("CJIB".into()),
                reference: Some("1234".into()),
            },
        }
    }

    #[test]
    fn test_create_and_get() {
        let mgr = SessionManager::default();
        let s = mgr.create();
        assert_eq!(s.mode, SessionMode::None);
        assert_eq!(mgr.get(&s.id).unwrap().id, s.id);
        assert!(matches!(mgr.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_record_result_starts_transcript() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        let s = mgr
            .record_result(&id, "brief".into(), parsed("U moet betalen."))
            .unwrap();

        assert_eq!(s.mode, SessionMode::Explain);
        assert_eq!(s.transcript, vec![ChatMessage::assistant("U moet betalen.")]);
        assert_eq!(s.analysis.sender.as_deref(), Some("CJIB"));
        assert_eq!(s.result().unwrap(), ("brief", "U moet betalen."));
    }

    #[test]
    fn test_reset_keeps_id_and_clears_transcript() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        mgr.record_result(&id, "brief".into(), parsed("Uitleg")).unwrap();
        let before = mgr.get(&id).unwrap().result_id;
        mgr.append_exchange(&id, before, "Hoeveel?", "€ 50.").unwrap();
        mgr.mark_feedback(&id).unwrap();

        let s = mgr.reset(&id).unwrap();
        assert_eq!(s.id, id);
        assert!(s.result_id > before);
        assert_eq!(s.mode, SessionMode::None);
        assert!(s.transcript.is_empty());
        assert!(s.letter_text.is_none());
        assert!(!s.feedback_given);
        assert_eq!(s.analysis, LetterAnalysis::default());
    }

    #[test]
    fn test_feedback_once_per_result() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;

        // Nothing to rate yet
        assert!(matches!(mgr.mark_feedback(&id), Err(Error::NoResult)));

        mgr.record_result(&id, "brief".into(), parsed("Uitleg")).unwrap();
        assert!(mgr.mark_feedback(&id).unwrap().feedback_given);
        assert!(matches!(mgr.mark_feedback(&id), Err(Error::FeedbackGiven)));

        // A new result can be rated again
        mgr.record_result(&id, "brief 2".into(), parsed("Uitleg 2")).unwrap();
        assert!(mgr.mark_feedback(&id).is_ok());
    }

    #[test]
    fn test_exchange_requires_result() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        assert!(mgr.append_exchange(&id, 0, "Vraag", "Antwoord").is_err());
        assert!(mgr.get(&id).unwrap().transcript.is_empty());

        let result_id = mgr
            .record_result(&id, "brief".into(), parsed("Uitleg"))
            .unwrap()
            .result_id;
        let s = mgr.append_exchange(&id, result_id, "Vraag", "Antwoord").unwrap();
        assert_eq!(s.transcript.len(), 3);
        assert_eq!(s.transcript[1], ChatMessage::user("Vraag"));
    }

    #[test]
    fn test_consequences_cleared_by_new_result() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        let result_id = mgr
            .record_result(&id, "brief".into(), parsed("Uitleg"))
            .unwrap()
            .result_id;
        mgr.set_consequences(&id, result_id, "Er komt een deurwaarder.".into())
            .unwrap();
        assert!(mgr.get(&id).unwrap().consequences.is_some());

        let s = mgr.record_result(&id, "brief 2".into(), parsed("Uitleg 2")).unwrap();
        assert!(s.consequences.is_none());
    }

    #[test]
    fn test_failed_feedback_rollback_keeps_newer_result_rated() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;

        mgr.record_result(&id, "brief A".into(), parsed("Uitleg A")).unwrap();
        let rated_a = mgr.mark_feedback(&id).unwrap().result_id;

        // While the insert for A is in flight, B is explained and rated
        mgr.record_result(&id, "brief B".into(), parsed("Uitleg B")).unwrap();
        mgr.mark_feedback(&id).unwrap();

        // The insert for A fails and its rollback arrives late
        assert!(matches!(
            mgr.clear_feedback(&id, rated_a),
            Err(Error::ResultChanged { .. })
        ));
        assert!(mgr.get(&id).unwrap().feedback_given);
        assert!(matches!(mgr.mark_feedback(&id), Err(Error::FeedbackGiven)));
    }

    #[test]
    fn test_rollback_reopens_feedback_for_same_result() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        mgr.record_result(&id, "brief".into(), parsed("Uitleg")).unwrap();

        let result_id = mgr.mark_feedback(&id).unwrap().result_id;
        assert!(!mgr.clear_feedback(&id, result_id).unwrap().feedback_given);
        assert!(mgr.mark_feedback(&id).is_ok());
    }

    #[test]
    fn test_late_writes_for_replaced_result_are_rejected() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        let result_a = mgr
            .record_result(&id, "brief A".into(), parsed("Uitleg A"))
            .unwrap()
            .result_id;

        // Brief B is explained while A's consequences and answer are computed
        mgr.record_result(&id, "brief B".into(), parsed("Uitleg B")).unwrap();

        assert!(matches!(
            mgr.set_consequences(&id, result_a, "gevolgen van brief A".into()),
            Err(Error::ResultChanged { .. })
        ));
        assert!(matches!(
            mgr.append_exchange(&id, result_a, "Vraag over A", "Antwoord over A"),
            Err(Error::ResultChanged { .. })
        ));

        let s = mgr.get(&id).unwrap();
        assert_eq!(s.letter_text.as_deref(), Some("brief B"));
        assert!(s.consequences.is_none());
        assert_eq!(s.transcript, vec![ChatMessage::assistant("Uitleg B")]);
    }

    #[test]
    fn test_reset_invalidates_pending_writes() {
        let mgr = SessionManager::default();
        let id = mgr.create().id;
        let old = mgr
            .record_result(&id, "brief".into(), parsed("Uitleg"))
            .unwrap()
            .result_id;
        mgr.reset(&id).unwrap();

        // A new result after the reset never reuses the old id
        let new = mgr
            .record_result(&id, "brief 2".into(), parsed("Uitleg 2"))
            .unwrap()
            .result_id;
        assert_ne!(old, new);
        assert!(mgr.set_consequences(&id, old, "oud".into()).is_err());
    }

    #[test]
    fn test_prune_idle_sessions() {
        let mgr = SessionManager::new(60, 10);
        let id = mgr.create().id;
        assert_eq!(mgr.prune_idle_before(Utc::now() - Duration::minutes(5)), 0);
        assert_eq!(mgr.prune_idle_before(Utc::now() + Duration::minutes(1)), 1);
        assert!(mgr.get(&id).is_err());
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_oldest_session_is_evicted() {
        let mgr = SessionManager::new(60, 2);
        let first = mgr.create().id;
        let second = mgr.create().id;
        // Touch the first so the second becomes the oldest
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.get(&first).unwrap();
        let third = mgr.create().id;

        assert_eq!(mgr.len(), 2);
        assert!(mgr.get(&first).is_ok());
        assert!(mgr.get(&second).is_err());
        assert!(mgr.get(&third).is_ok());
    }
}
