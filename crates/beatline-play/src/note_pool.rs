// Bounded per-type pools of note visuals

use beatline_model::LANE_COUNT;

/// Maximum idle visuals retained per image type.
pub const POOL_CAPACITY: usize = 50;

/// Sprite kind a visual is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteImageType {
    /// Tap head or hold head/tail, per lane.
    Lane(u8),
    /// Hold body, per lane.
    HoldLane(u8),
    TrailUp,
    TrailDown,
}

/// Pool family, which decides the occupancy bucket in the teardown log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualFamily {
    Note,
    Hold,
    Trail,
}

impl NoteImageType {
    pub const COUNT: usize = LANE_COUNT * 2 + 2;

    pub fn lane(lane: usize) -> Self {
        debug_assert!(lane < LANE_COUNT, "lane {lane} has no image type");
        Self::Lane(lane.min(LANE_COUNT - 1) as u8)
    }

    pub fn hold_lane(lane: usize) -> Self {
        debug_assert!(lane < LANE_COUNT, "lane {lane} has no hold image type");
        Self::HoldLane(lane.min(LANE_COUNT - 1) as u8)
    }

    pub fn family(self) -> VisualFamily {
        match self {
            Self::Lane(_) => VisualFamily::Note,
            Self::HoldLane(_) => VisualFamily::Hold,
            Self::TrailUp | Self::TrailDown => VisualFamily::Trail,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Lane(lane) => lane as usize,
            Self::HoldLane(lane) => LANE_COUNT + lane as usize,
            Self::TrailUp => LANE_COUNT * 2,
            Self::TrailDown => LANE_COUNT * 2 + 1,
        }
    }
}

/// A drawable (id, image type) pair on loan from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle {
    pub id: u32,
    pub image_type: NoteImageType,
}

/// Idle visuals by image type. Depooling from an empty type mints a new id;
/// repooling past [`POOL_CAPACITY`] drops the visual.
#[derive(Debug)]
pub struct NoteVisualPool {
    idle: [Vec<VisualHandle>; NoteImageType::COUNT],
    next_id: u32,
    minted: usize,
    dropped: usize,
}

impl Default for NoteVisualPool {
    fn default() -> Self {
        Self {
            idle: std::array::from_fn(|_| Vec::with_capacity(POOL_CAPACITY)),
            next_id: 0,
            minted: 0,
            dropped: 0,
        }
    }
}

impl NoteVisualPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depool(&mut self, image_type: NoteImageType) -> VisualHandle {
        if let Some(handle) = self.idle[image_type.slot()].pop() {
            return handle;
        }
        let handle = VisualHandle {
            id: self.next_id,
            image_type,
        };
        self.next_id = self.next_id.wrapping_add(1);
        self.minted += 1;
        handle
    }

    pub fn repool(&mut self, handle: VisualHandle) {
        let idle = &mut self.idle[handle.image_type.slot()];
        if idle.len() < POOL_CAPACITY {
            idle.push(handle);
        } else {
            self.dropped += 1;
        }
    }

    pub fn idle_count(&self, image_type: NoteImageType) -> usize {
        self.idle[image_type.slot()].len()
    }

    pub fn family_count(&self, family: VisualFamily) -> usize {
        let range = match family {
            VisualFamily::Note => 0..LANE_COUNT,
            VisualFamily::Hold => LANE_COUNT..LANE_COUNT * 2,
            VisualFamily::Trail => LANE_COUNT * 2..NoteImageType::COUNT,
        };
        self.idle[range].iter().map(Vec::len).sum()
    }

    pub fn total_idle(&self) -> usize {
        self.idle.iter().map(Vec::len).sum()
    }

    /// Visuals created because their pool was empty.
    pub fn minted(&self) -> usize {
        self.minted
    }

    /// Log occupancy and empty every pool.
    pub fn teardown(&mut self) {
        log::debug!(
            "Note pools: hold {}, note {}, trail {}, total {} (minted {}, dropped {})",
            self.family_count(VisualFamily::Hold),
            self.family_count(VisualFamily::Note),
            self.family_count(VisualFamily::Trail),
            self.total_idle(),
            self.minted,
            self.dropped,
        );
        for pool in &mut self.idle {
            pool.clear();
        }
    }
}
