//! Resource identifiers handed across the C boundary.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque, process-unique id of a registered resource.
///
/// Valid ids are strictly positive; `0` is the boundary's "no resource" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

impl ResourceId {
    pub const INVALID: Self = Self(0);

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for ResourceId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<ResourceId> for i64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Window,
    Tray,
    Display,
    Keyboard,
    Broadcast,
    Accessibility,
}

impl ResourceKind {
    const fn index(self) -> usize {
        match self {
            ResourceKind::Window => 0,
            ResourceKind::Tray => 1,
            ResourceKind::Display => 2,
            ResourceKind::Keyboard => 3,
            ResourceKind::Broadcast => 4,
            ResourceKind::Accessibility => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Window => "window",
            ResourceKind::Tray => "tray",
            ResourceKind::Display => "display",
            ResourceKind::Keyboard => "keyboard",
            ResourceKind::Broadcast => "broadcast",
            ResourceKind::Accessibility => "accessibility",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic id source; never hands out the same id twice.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: AtomicI64,
}

/// One counter per kind for the whole process. Registries rebuilt after a
/// shutdown keep counting where the previous ones stopped.
static PROCESS_IDS: [IdAllocator; 6] = [
    IdAllocator::new(),
    IdAllocator::new(),
    IdAllocator::new(),
    IdAllocator::new(),
    IdAllocator::new(),
    IdAllocator::new(),
];

impl IdAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    pub(crate) fn for_kind(kind: ResourceKind) -> &'static Self {
        &PROCESS_IDS[kind.index()]
    }

    pub(crate) fn allocate(&self) -> ResourceId {
        ResourceId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_starts_at_one_and_increases() {
        let ids = IdAllocator::new();
        let first = ids.allocate();
        let second = ids.allocate();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert!(first.is_valid());
    }

    #[test]
    fn process_counters_are_shared_per_kind() {
        let first = IdAllocator::for_kind(ResourceKind::Broadcast).allocate();
        let second = IdAllocator::for_kind(ResourceKind::Broadcast).allocate();
        assert!(second > first);
        assert!(std::ptr::eq(
            IdAllocator::for_kind(ResourceKind::Tray),
            IdAllocator::for_kind(ResourceKind::Tray)
        ));
        assert!(!std::ptr::eq(
            IdAllocator::for_kind(ResourceKind::Tray),
            IdAllocator::for_kind(ResourceKind::Window)
        ));
    }

    #[test]
    fn zero_and_negative_ids_are_invalid() {
        assert!(!ResourceId::INVALID.is_valid());
        assert!(!ResourceId::from(-7).is_valid());
    }

    #[test]
    fn allocator_is_unique_across_threads() {
        let ids = IdAllocator::new();
        let mut all: Vec<i64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| (0..250).map(|_| ids.allocate().get()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
