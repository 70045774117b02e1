//! Layout composition: turns a layout name into subplots, compositors and default overlays.

/// Layout composer and replication snapshots.
pub mod composer;
