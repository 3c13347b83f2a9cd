use std::sync::Arc;

use parking_lot::Mutex;

use hubqueue_shared::{
    AtomicFlags, Context, ContextContent, ContextQueues, ContextUpdate, Flags, Timestamp, Usec,
};

/// A context with just enough content to exercise the queues
pub struct TestContext {
    id: String,
    flags: AtomicFlags,
    queues: ContextQueues,
    content: Mutex<TestContent>,
}

#[derive(Default)]
pub struct TestContent {
    pub id: String,
    pub title: String,
    /// Current version
    pub version: u64,
    /// Version last sent to the hub
    pub hub_version: u64,
    /// Something the hub sees changed since the last dispatch
    pub dirty: bool,
    pub hidden: bool,
    pub deleted: bool,
    pub first_entry_s: u64,
    pub last_entry_s: u64,
    pub hub_updates: usize,
    pub persisted_deletes: usize,
}

impl TestContext {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            flags: AtomicFlags::new(Flags::NONE),
            queues: ContextQueues::new(),
            content: Mutex::new(TestContent {
                id: id.to_string(),
                title: format!("{} title", id),
                ..TestContent::default()
            }),
        })
    }

    /// Records a change the hub has not seen, for the given reason
    pub fn touch(&self, reason: Flags) {
        self.flags.set(reason);
        self.content.lock().dirty = true;
    }

    /// Marks the context deleted; the deletion still has to reach the hub
    pub fn mark_deleted(&self) {
        self.flags.set(Flags::DELETED);
        let mut content = self.content.lock();
        content.deleted = true;
        content.dirty = true;
    }

    pub fn hide(&self) {
        self.flags.set(Flags::HIDDEN);
        self.content.lock().hidden = true;
    }

    pub fn hub_version(&self) -> u64 {
        self.content.lock().hub_version
    }

    pub fn hub_updates(&self) -> usize {
        self.content.lock().hub_updates
    }

    pub fn persisted_deletes(&self) -> usize {
        self.content.lock().persisted_deletes
    }

    pub fn is_dirty(&self) -> bool {
        self.content.lock().dirty
    }
}

impl Context for TestContext {
    type Content = TestContent;

    fn id(&self) -> &str {
        &self.id
    }

    fn flags(&self) -> &AtomicFlags {
        &self.flags
    }

    fn queues(&self) -> &ContextQueues {
        &self.queues
    }

    fn content(&self) -> &Mutex<TestContent> {
        &self.content
    }
}

impl ContextContent for TestContent {
    fn hub_version_changed(&mut self) -> bool {
        self.dirty || self.version != self.hub_version
    }

    fn mark_hub_current(&mut self) {
        self.hub_version = self.version;
    }

    fn hub_update(&mut self, now: Usec) -> Option<ContextUpdate> {
        self.version = (self.version + 1).max(Timestamp::usec_to_secs(now));
        self.hub_version = self.version;
        self.dirty = false;
        self.hub_updates += 1;

        if self.hidden {
            return None;
        }

        Some(ContextUpdate {
            id: self.id.clone(),
            version: self.version,
            title: self.title.clone(),
            units: "units".to_string(),
            family: "family".to_string(),
            chart_type: "line".to_string(),
            priority: 1000,
            first_entry_s: self.first_entry_s,
            last_entry_s: self.last_entry_s,
            deleted: self.deleted,
        })
    }

    fn hub_version(&self) -> u64 {
        self.hub_version
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn should_be_deleted(&self) -> bool {
        self.deleted && !self.dirty && self.version == self.hub_version
    }

    fn delete_persisted(&mut self, _id: &str) {
        self.persisted_deletes += 1;
    }
}
