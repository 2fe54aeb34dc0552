//! The crawl frontier: a FIFO of URLs waiting to be fetched

use std::collections::VecDeque;

use url::Url;

/// A URL waiting to be fetched, with the number of hops still allowed below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: Url,
    pub depth_remaining: u32,
}

impl FrontierItem {
    pub fn new(url: Url, depth_remaining: u32) -> Self {
        Self {
            url,
            depth_remaining,
        }
    }
}

/// Strict FIFO queue of frontier items
///
/// FIFO order is what makes the traversal breadth-first: every item of one
/// depth is popped before any item queued from it.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierItem>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: FrontierItem) {
        self.queue.push_back(item);
    }

    pub fn pop(&mut self) -> Option<FrontierItem> {
        self.queue.pop_front()
    }

    /// Pop the leading run of items sharing the front item's depth
    pub fn pop_level(&mut self) -> Vec<FrontierItem> {
        let Some(depth) = self.queue.front().map(|item| item.depth_remaining) else {
            return Vec::new();
        };

        let mut level = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|item| item.depth_remaining == depth)
        {
            if let Some(item) = self.queue.pop_front() {
                level.push(item);
            }
        }
        level
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
