//! Bounded sliding window over recent question/answer exchanges.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One question/answer round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// FIFO window of the last `capacity` exchanges.
///
/// Appending beyond capacity evicts from the front, so
/// `len() <= capacity` holds after every insert.
#[derive(Clone, Debug)]
pub struct MemoryWindow {
    exchanges: VecDeque<Exchange>,
    capacity: usize,
}

impl MemoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            exchanges: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Pushes a new exchange, evicting the oldest entries until the window
    /// fits its capacity again.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.exchanges.push_back(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
        while self.exchanges.len() > self.capacity {
            self.exchanges.pop_front();
        }
    }

    /// Renders the window as a dialogue transcript, oldest exchange first.
    pub fn render(&self) -> String {
        let mut transcript = String::new();
        for exchange in &self.exchanges {
            if !transcript.is_empty() {
                transcript.push('\n');
            }
            transcript.push_str("Human: ");
            transcript.push_str(&exchange.question);
            transcript.push_str("\nAI: ");
            transcript.push_str(&exchange.answer);
        }
        transcript
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }
}
