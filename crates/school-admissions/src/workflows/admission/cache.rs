use std::sync::RwLock;

use tracing::debug;

use super::repository::ListingCache;
use super::views::AdmissionListView;

/// Process-local cache for the admin list view.
#[derive(Debug, Default)]
pub struct MemoryListingCache {
    slot: RwLock<CacheSlot>,
}

#[derive(Debug, Default)]
struct CacheSlot {
    generation: u64,
    view: Option<AdmissionListView>,
}

impl ListingCache for MemoryListingCache {
    fn load(&self) -> Option<AdmissionListView> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .view
            .clone()
    }

    fn generation(&self) -> u64 {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .generation
    }

    fn store(&self, generation: u64, view: AdmissionListView) -> bool {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.generation != generation {
            return false;
        }
        slot.view = Some(view);
        true
    }

    fn invalidate(&self) {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.generation = slot.generation.wrapping_add(1);
        if slot.view.take().is_some() {
            debug!(generation = slot.generation, "admission list cache invalidated");
        }
    }
}
