/// Owner tag stored per row: 0 = unselected, k = selected by plot k-1.
pub type OwnerTag = u16;

/// Shared brushing state of one dataset.
///
/// Only the plot running the active selection gesture writes here, through
/// [`SelectionState::apply_gesture`]; every plot reads `owner` when it
/// rebuilds its color buffer.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    owner: Vec<OwnerTag>,
    /// Snapshot taken when a gesture starts on a different plot than the
    /// previous one. Replace-mode gestures fall back to it.
    previous_owner: Vec<OwnerTag>,
    /// Pre-inversion snapshot used to restore exactly.
    saved_owner: Vec<OwnerTag>,
    nselected: usize,
    inverted: bool,
    /// Tag of the plot that ran the most recent gesture.
    last_gesture_tag: Option<OwnerTag>,
    /// Set by invert/clear: the next gesture must re-snapshot even when it
    /// comes from the same plot.
    snapshot_stale: bool,
}

impl SelectionState {
    pub fn new(npoints: usize) -> Self {
        Self {
            owner: vec![0; npoints],
            previous_owner: vec![0; npoints],
            saved_owner: vec![0; npoints],
            nselected: 0,
            inverted: false,
            last_gesture_tag: None,
            snapshot_stale: false,
        }
    }

    pub fn npoints(&self) -> usize {
        self.owner.len()
    }

    pub fn owner(&self) -> &[OwnerTag] {
        &self.owner
    }

    pub fn owner_of(&self, row: usize) -> OwnerTag {
        self.owner[row]
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.owner[row] != 0
    }

    pub fn nselected(&self) -> usize {
        self.nselected
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn last_gesture_tag(&self) -> Option<OwnerTag> {
        self.last_gesture_tag
    }

    /// Start a selection gesture for the plot with `tag`.
    ///
    /// The replace-mode baseline is re-snapshotted only when the gesture
    /// comes from a different plot than the previous one, so repeated
    /// gestures in one plot replace each other instead of accumulating.
    /// A pending inversion can no longer be undone afterwards.
    pub fn begin_gesture(&mut self, tag: OwnerTag) {
        debug_assert!(tag > 0, "owner tag 0 means unselected");
        if self.snapshot_stale || self.last_gesture_tag != Some(tag) {
            self.previous_owner.copy_from_slice(&self.owner);
            self.snapshot_stale = false;
        }
        self.last_gesture_tag = Some(tag);
        self.inverted = false;
    }

    /// Merge one gesture update. `newly_selected[i]` is the gesture's tag
    /// for rows inside the brush and 0 elsewhere.
    ///
    /// With `extend` the rows keep their current owner when not brushed;
    /// otherwise they revert to the gesture-start snapshot.
    pub fn apply_gesture(&mut self, newly_selected: &[OwnerTag], extend: bool) {
        assert_eq!(
            newly_selected.len(),
            self.owner.len(),
            "gesture mask length must match the table"
        );
        if extend {
            for (o, &n) in self.owner.iter_mut().zip(newly_selected) {
                if n != 0 {
                    *o = n;
                }
            }
        } else {
            for ((o, &n), &p) in self
                .owner
                .iter_mut()
                .zip(newly_selected)
                .zip(&self.previous_owner)
            {
                *o = if n != 0 { n } else { p };
            }
        }
        self.recount();
    }

    fn recount(&mut self) {
        self.nselected = self.owner.iter().filter(|&&o| o != 0).count();
    }

    /// Toggle between the selection and its complement.
    ///
    /// The first call saves the current owners and marks every unselected
    /// row with the last gesture's tag, or `fallback_tag` when no gesture
    /// ran since the last clear. The second call restores the saved owners
    /// exactly.
    pub fn invert(&mut self, fallback_tag: OwnerTag) {
        if self.inverted {
            self.owner.copy_from_slice(&self.saved_owner);
            self.inverted = false;
        } else {
            let tag = self.last_gesture_tag.unwrap_or(fallback_tag).max(1);
            self.saved_owner.copy_from_slice(&self.owner);
            for (o, &s) in self.owner.iter_mut().zip(&self.saved_owner) {
                *o = if s == 0 { tag } else { 0 };
            }
            self.inverted = true;
        }
        self.nselected = self.owner.len() - self.nselected;
        self.snapshot_stale = true;
    }

    /// Deselect everything and forget all snapshots.
    pub fn clear(&mut self) {
        self.owner.fill(0);
        self.previous_owner.fill(0);
        self.saved_owner.fill(0);
        self.nselected = 0;
        self.inverted = false;
        self.last_gesture_tag = None;
        self.snapshot_stale = true;
    }

    /// Row mask of rows that survive a "delete selected" pass.
    pub fn unselected_mask(&self) -> Vec<bool> {
        self.owner.iter().map(|&o| o == 0).collect()
    }

    /// Reset to an all-clear state for a table of `npoints` rows.
    pub fn resize(&mut self, npoints: usize) {
        *self = Self::new(npoints);
    }
}
