use hubqueue_shared::{Context, ScanEntry, ScanTarget, ScanVisitor, Verdict};

use crate::HostContexts;

/// Drains the post-process queue. A live context is taken off the queue
/// before its callback runs, so the callback may queue it again.
pub(crate) struct PostProcessor<'h, C: Context> {
    host: &'h HostContexts<C>,
    pub(crate) processed: usize,
    pub(crate) dropped: usize,
}

impl<'h, C: Context> PostProcessor<'h, C> {
    pub fn new(host: &'h HostContexts<C>) -> Self {
        Self {
            host,
            processed: 0,
            dropped: 0,
        }
    }
}

impl<C: Context> ScanVisitor<C> for PostProcessor<'_, C> {
    fn visit(&mut self, entry: &ScanEntry<C>) -> Verdict {
        match entry.target() {
            ScanTarget::Live(_) | ScanTarget::Gone => Verdict::Remove,
            ScanTarget::Stale(_) => Verdict::Keep,
        }
    }

    fn after(&mut self, entry: ScanEntry<C>, removed: bool) {
        if !removed {
            return;
        }
        match entry.live() {
            Some(context) => {
                self.host.post_processor().post_process(self.host, context);
                self.processed += 1;
            }
            None => self.dropped += 1,
        }
    }
}
