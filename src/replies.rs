//! Canned assistant replies

use rand::seq::SliceRandom;

/// The fixed reply set
pub const CANNED_REPLIES: [&str; 8] = [
    "That's interesting! Tell me more.",
    "I understand. How can I assist you with that?",
    "Thanks for sharing! Is there anything specific you'd like help with?",
    "I'm here to help! What would you like to know?",
    "That sounds great! How can I support you?",
    "I see. Let me know if you need any assistance!",
    "Absolutely! I'm ready to help with whatever you need.",
    "Interesting question! I'd be happy to help you explore that.",
];

/// Uniform random choice over the canned reply set
#[derive(Debug, Clone)]
pub struct CannedReplies {
    replies: Vec<String>,
}

impl CannedReplies {
    /// Pick one reply uniformly at random
    pub fn choose(&self) -> String {
        let mut rng = rand::thread_rng();
        // Only built from CANNED_REPLIES, so never empty
        self.replies
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.replies.iter().any(|r| r == text)
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self {
            replies: CANNED_REPLIES.iter().map(ToString::to_string).collect(),
        }
    }
}
