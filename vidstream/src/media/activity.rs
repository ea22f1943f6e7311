use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A client watching a specific channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub client: String,
    pub channel: String,
}

impl SessionKey {
    pub fn new(client: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            channel: channel.into(),
        }
    }
}

/**
    Who is fetching what, and who has been cut off.

    A session is refreshed by every segment request. A session that goes quiet
    is turned into a flag, which makes further manifest requests from that
    client fail until the flag cools down. Cast receivers keep polling the
    manifest after the viewer has left.
*/
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_access: HashMap<String, Instant>,
    sessions: HashMap<SessionKey, Instant>,
    flagged: HashMap<SessionKey, Instant>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a segment (or first manifest) request for a channel.
    pub fn touch_channel(&mut self, channel: &str, now: Instant) {
        self.last_access.insert(channel.to_string(), now);
    }

    pub fn touch_session(&mut self, key: SessionKey, now: Instant) {
        self.sessions.insert(key, now);
    }

    /**
        Whether `key` is still inside its flag cooldown.

        An expired flag is dropped as a side effect.
    */
    pub fn is_flagged(&mut self, key: &SessionKey, now: Instant, cooldown: Duration) -> bool {
        match self.flagged.get(key) {
            Some(flagged_at) if now.saturating_duration_since(*flagged_at) < cooldown => true,
            Some(_) => {
                self.flagged.remove(key);
                false
            }
            None => false,
        }
    }

    /**
        Drop sessions idle for longer than `timeout`, flagging their clients.

        Returns the channels that no longer have any session.
    */
    pub fn expire_sessions(&mut self, now: Instant, timeout: Duration) -> Vec<String> {
        let expired: Vec<SessionKey> = self
            .sessions
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) > timeout)
            .map(|(key, _)| key.clone())
            .collect();

        let mut orphaned = Vec::new();
        for key in expired {
            self.sessions.remove(&key);
            log::info!(
                "Client {} stopped fetching segments for {}, flagging",
                key.client,
                key.channel
            );

            let still_watched = self.sessions.keys().any(|k| k.channel == key.channel);
            if !still_watched && !orphaned.contains(&key.channel) {
                orphaned.push(key.channel.clone());
            }
            self.flagged.insert(key, now);
        }
        orphaned
    }

    /// Channels among `running` whose last access is older than `timeout`.
    pub fn idle_channels<'a>(
        &self,
        running: impl IntoIterator<Item = &'a str>,
        now: Instant,
        timeout: Duration,
    ) -> Vec<String> {
        let running: HashSet<&str> = running.into_iter().collect();
        let mut idle: Vec<String> = self
            .last_access
            .iter()
            .filter(|(channel, _)| running.contains(channel.as_str()))
            .filter(|(_, last)| now.saturating_duration_since(**last) > timeout)
            .map(|(channel, _)| channel.clone())
            .collect();
        idle.sort();
        idle
    }

    pub fn forget_channel(&mut self, channel: &str) {
        self.last_access.remove(channel);
    }

    pub fn has_session(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn last_access(&self, channel: &str) -> Option<Instant> {
        self.last_access.get(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(20);
    const COOLDOWN: Duration = Duration::from_secs(180);

    #[test]
    fn test_quiet_session_is_flagged_and_orphans_channel() {
        let start = Instant::now();
        let key = SessionKey::new("10.0.0.5|Chromecast", "42");

        let mut tracker = ActivityTracker::new();
        tracker.touch_session(key.clone(), start);

        assert!(tracker.expire_sessions(start + Duration::from_secs(10), TIMEOUT).is_empty());

        let orphaned = tracker.expire_sessions(start + Duration::from_secs(21), TIMEOUT);
        assert_eq!(orphaned, vec!["42".to_string()]);
        assert!(!tracker.has_session(&key));
        assert!(tracker.is_flagged(&key, start + Duration::from_secs(30), COOLDOWN));
    }

    #[test]
    fn test_other_viewers_keep_channel_alive() {
        let start = Instant::now();
        let quiet = SessionKey::new("10.0.0.5|Chromecast", "42");
        let active = SessionKey::new("10.0.0.6|Firefox", "42");

        let mut tracker = ActivityTracker::new();
        tracker.touch_session(quiet.clone(), start);
        tracker.touch_session(active.clone(), start + Duration::from_secs(15));

        let orphaned = tracker.expire_sessions(start + Duration::from_secs(25), TIMEOUT);
        assert!(orphaned.is_empty());
        assert!(tracker.has_session(&active));
        assert!(!tracker.has_session(&quiet));
    }

    #[test]
    fn test_flag_cools_down() {
        let start = Instant::now();
        let key = SessionKey::new("10.0.0.5|Chromecast", "42");

        let mut tracker = ActivityTracker::new();
        tracker.touch_session(key.clone(), start);
        tracker.expire_sessions(start + Duration::from_secs(21), TIMEOUT);

        let flagged_at = start + Duration::from_secs(21);
        assert!(tracker.is_flagged(&key, flagged_at + Duration::from_secs(179), COOLDOWN));
        assert!(!tracker.is_flagged(&key, flagged_at + Duration::from_secs(180), COOLDOWN));
        // Expired flags are removed, so an earlier instant no longer matches either.
        assert!(!tracker.is_flagged(&key, flagged_at, COOLDOWN));
    }

    #[test]
    fn test_flags_are_per_channel() {
        let start = Instant::now();
        let mut tracker = ActivityTracker::new();
        tracker.touch_session(SessionKey::new("c", "42"), start);
        tracker.expire_sessions(start + Duration::from_secs(21), TIMEOUT);

        let later = start + Duration::from_secs(22);
        assert!(tracker.is_flagged(&SessionKey::new("c", "42"), later, COOLDOWN));
        assert!(!tracker.is_flagged(&SessionKey::new("c", "43"), later, COOLDOWN));
    }

    #[test]
    fn test_idle_channels_only_considers_running() {
        let start = Instant::now();
        let mut tracker = ActivityTracker::new();
        tracker.touch_channel("1", start);
        tracker.touch_channel("2", start);
        tracker.touch_channel("3", start + Duration::from_secs(15));

        let now = start + Duration::from_secs(25);
        assert_eq!(tracker.idle_channels(["1", "3"], now, TIMEOUT), vec!["1".to_string()]);

        tracker.forget_channel("1");
        assert!(tracker.idle_channels(["1", "3"], now, TIMEOUT).is_empty());
        assert!(tracker.last_access("1").is_none());
    }
}
