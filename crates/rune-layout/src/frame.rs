//! Work deferred to the next paint frame.

use crate::host::ScrollOffset;

/// A task run by `Transition::on_frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTask {
    /// Scroll back to where the document was when the old state was recorded.
    RestoreScroll(ScrollOffset),
    /// Restore every muted CSS transition. With `unless_animated` set the task
    /// does nothing if the root is animating again by then.
    RestoreTransitions { unless_animated: bool },
}

/// FIFO of next-frame tasks. Tasks queued while a frame is being run wait for
/// the following frame.
#[derive(Debug, Default)]
pub struct FrameQueue {
    tasks: Vec<FrameTask>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: FrameTask) {
        self.tasks.push(task);
    }

    /// Take the tasks due this frame, in registration order.
    pub fn take(&mut self) -> Vec<FrameTask> {
        std::mem::take(&mut self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_drains_in_order() {
        let mut queue = FrameQueue::new();
        queue.push(FrameTask::RestoreScroll(ScrollOffset { x: 0.0, y: 40.0 }));
        queue.push(FrameTask::RestoreTransitions {
            unless_animated: true,
        });

        let tasks = queue.take();
        assert_eq!(tasks.len(), 2);
        assert!(matches!(tasks[0], FrameTask::RestoreScroll(_)));
        assert!(queue.is_empty());
    }
}
