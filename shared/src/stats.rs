/// Diagnostic counters for one peer. Nothing reads these on the hot path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub requests_sent: u64,
    pub requests_evicted: u64,
    pub snapshots_applied: u64,
    pub snapshots_ignored: u64,
    pub position_corrections: u64,
    pub rotation_corrections: u64,
    pub validation_violations: u64,
    pub messages_dropped: u64,
}

impl SyncStats {
    pub fn merge(&mut self, other: &SyncStats) {
        self.requests_sent += other.requests_sent;
        self.requests_evicted += other.requests_evicted;
        self.snapshots_applied += other.snapshots_applied;
        self.snapshots_ignored += other.snapshots_ignored;
        self.position_corrections += other.position_corrections;
        self.rotation_corrections += other.rotation_corrections;
        self.validation_violations += other.validation_violations;
        self.messages_dropped += other.messages_dropped;
    }
}
