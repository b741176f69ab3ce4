//! Admin insight feed
//!
//! An append-only, insertion-ordered list of [`QualificationResult`]s plus a
//! broadcast channel for live observers. A publish appends under the write
//! lock and broadcasts before releasing it, so every subscriber sees results
//! in the same order as the list.

use crate::types::{FeedStats, Interest, QualificationResult};
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Default number of results buffered per live subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

pub struct InsightFeed {
    results: RwLock<Vec<QualificationResult>>,
    tx: broadcast::Sender<QualificationResult>,
}

impl Default for InsightFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl InsightFeed {
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            results: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// Appends a result and notifies live subscribers.
    pub fn publish(&self, result: QualificationResult) {
        let mut results = self.results.write();
        results.push(result.clone());
        let position = results.len();
        // No subscribers is the common case, not an error
        let receivers = self.tx.send(result).unwrap_or(0);
        drop(results);

        tracing::info!(position, receivers, "Insight published to feed");
    }

    /// Chronological copy of every result.
    pub fn snapshot(&self) -> Vec<QualificationResult> {
        self.results.read().clone()
    }

    /// Most-recent-first copy, the order the admin dashboard displays.
    pub fn latest_first(&self) -> Vec<QualificationResult> {
        self.results.read().iter().rev().cloned().collect()
    }

    /// Most-recent-first results whose email, message or detected intent
    /// contains `term`, ignoring case. A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<QualificationResult> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.latest_first();
        }

        self.results
            .read()
            .iter()
            .rev()
            .filter(|r| {
                let insight = &r.admin_insight;
                insight.user_email.to_lowercase().contains(&needle)
                    || insight.last_message.to_lowercase().contains(&needle)
                    || insight.detected_intent.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }

    pub fn stats(&self) -> FeedStats {
        let results = self.results.read();
        FeedStats {
            live_signals: results.len(),
            high_intent_leads: results
                .iter()
                .filter(|r| r.admin_insight.interested == Interest::Yes)
                .count(),
        }
    }

    /// Receiver for results published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QualificationResult> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdminInsight, LeadStatus};
    use chrono::Utc;

    fn result(email: &str, intent: &str, interested: Interest) -> QualificationResult {
        QualificationResult {
            id: uuid::Uuid::new_v4().to_string(),
            chat_response: "Thanks for reaching out.".to_string(),
            admin_insight: AdminInsight {
                session_id: "s".to_string(),
                user_email: email.to_string(),
                last_message: "hello".to_string(),
                score: 50,
                interested,
                status: LeadStatus::Pursuable,
                detected_intent: intent.to_string(),
                reasoning: "n/a".to_string(),
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_publish_preserves_insertion_order() {
        let feed = InsightFeed::default();
        assert!(feed.is_empty());

        feed.publish(result("a@x.com", "first", Interest::No));
        feed.publish(result("b@x.com", "second", Interest::Yes));
        feed.publish(result("c@x.com", "third", Interest::Yes));

        let chronological: Vec<_> = feed
            .snapshot()
            .into_iter()
            .map(|r| r.admin_insight.detected_intent)
            .collect();
        assert_eq!(chronological, vec!["first", "second", "third"]);

        let latest: Vec<_> = feed
            .latest_first()
            .into_iter()
            .map(|r| r.admin_insight.detected_intent)
            .collect();
        assert_eq!(latest, vec!["third", "second", "first"]);
        assert_eq!(feed.len(), 3);
    }

    #[test]
    fn test_stats_count_high_intent() {
        let feed = InsightFeed::default();
        feed.publish(result("a@x.com", "browse", Interest::No));
        feed.publish(result("b@x.com", "pricing", Interest::Yes));

        assert_eq!(
            feed.stats(),
            FeedStats {
                live_signals: 2,
                high_intent_leads: 1
            }
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let feed = InsightFeed::default();
        feed.publish(result("buyer@corp.com", "Enterprise pricing", Interest::Yes));
        feed.publish(result("student@uni.edu", "Homework help", Interest::No));

        assert_eq!(feed.search("CORP").len(), 1);
        assert_eq!(feed.search("pricing")[0].admin_insight.user_email, "buyer@corp.com");
        assert_eq!(feed.search("  ").len(), 2);
        assert!(feed.search("nothing-matches").is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_publish_order() {
        let feed = InsightFeed::new(8);
        let mut rx = feed.subscribe();

        feed.publish(result("a@x.com", "one", Interest::No));
        feed.publish(result("b@x.com", "two", Interest::Yes));

        assert_eq!(rx.recv().await.unwrap().admin_insight.detected_intent, "one");
        assert_eq!(rx.recv().await.unwrap().admin_insight.detected_intent, "two");
    }

    #[test]
    fn test_publish_without_subscribers_still_appends() {
        let feed = InsightFeed::new(1);
        feed.publish(result("a@x.com", "one", Interest::No));
        feed.publish(result("b@x.com", "two", Interest::No));
        assert_eq!(feed.len(), 2);
    }
}
