use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Identifies one widget instance for the schedule and the fetch pool.
/// Assigned from the widget's index in the configuration order.
pub type WidgetId = u64;

#[derive(Debug, Clone)]
struct RefreshSlot {
    next_due: Instant,
    in_flight: bool,
    interval: Duration,
}

/// Per-widget refresh bookkeeping. Pure: the caller supplies `now` and
/// performs the actual fetches; the schedule only decides when.
///
/// A widget with a fetch in flight is never due again until the caller
/// reports completion, so a slow source cannot pile up requests.
#[derive(Debug, Clone, Default)]
pub struct RefreshSchedule {
    slots: BTreeMap<WidgetId, RefreshSlot>,
}

impl RefreshSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a widget. Its first fetch is due immediately.
    pub fn insert(&mut self, id: WidgetId, interval: Duration, now: Instant) {
        self.slots.insert(
            id,
            RefreshSlot {
                next_due: now,
                in_flight: false,
                interval,
            },
        );
    }

    /// Widgets whose interval has elapsed and that have no fetch in
    /// flight, in ascending id order.
    pub fn due(&self, now: Instant) -> Vec<WidgetId> {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.in_flight && now >= slot.next_due)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn mark_started(&mut self, id: WidgetId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.in_flight = true;
        }
    }

    /// Record a completed fetch (success or failure) and re-arm the
    /// widget's timer. Unknown ids are ignored; a late result for a
    /// widget that no longer exists is not an error.
    pub fn complete(&mut self, id: WidgetId, now: Instant) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.in_flight = false;
            slot.next_due = now + slot.interval;
        }
    }

    /// Make every idle widget due immediately (manual refresh).
    pub fn force_refresh(&mut self, now: Instant) {
        for slot in self.slots.values_mut() {
            if !slot.in_flight {
                slot.next_due = now;
            }
        }
    }

    pub fn in_flight(&self, id: WidgetId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.in_flight)
    }

    pub fn interval(&self, id: WidgetId) -> Option<Duration> {
        self.slots.get(&id).map(|slot| slot.interval)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
