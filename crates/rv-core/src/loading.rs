use std::time::Duration;

/// How long each message stays on screen
pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(3);

const MESSAGES: [&str; 8] = [
    "Warming up the motion engine...",
    "Studying your image...",
    "Sketching the first frames...",
    "Setting things in motion...",
    "Smoothing out the movement...",
    "This can take a few minutes...",
    "Rendering the final frames...",
    "Almost there, polishing the details...",
];

/// Message to show after `tick` intervals have elapsed. Cycles forever.
pub fn message_at(tick: u64) -> &'static str {
    MESSAGES[(tick % MESSAGES.len() as u64) as usize]
}

pub fn message_count() -> usize {
    MESSAGES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message() {
        assert_eq!(message_at(0), MESSAGES[0]);
    }

    #[test]
    fn test_messages_cycle() {
        let n = message_count() as u64;
        for tick in 0..n {
            assert_eq!(message_at(tick), message_at(tick + n));
        }
        assert_ne!(message_at(0), message_at(1));
    }

    #[test]
    fn test_large_ticks() {
        assert!(!message_at(u64::MAX).is_empty());
    }
}
