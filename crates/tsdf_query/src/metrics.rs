//! Query statistics for rendering and meshing passes.
//!
//! Recording is compiled in with the `metrics` feature and can be switched
//! off at runtime through [`COLLECT_METRICS`].
//!
//! # Usage
//!
//! ```ignore
//! use tsdf_query::metrics::{QueryMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let mut metrics = QueryMetrics::new();
//! metrics.record_render(&stats);
//! metrics.record_mesh(&mesh_stats);
//! ```

#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Most recent pass timings in microseconds, oldest overwritten first.
#[derive(Debug, Clone)]
pub struct TimingWindow {
    samples: Vec<u64>,
    capacity: usize,
    /// Slot the next sample is written to once the window is full.
    head: usize,
}

impl TimingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            head: 0,
        }
    }

    pub fn push(&mut self, elapsed_us: u64) {
        if self.samples.len() < self.capacity {
            self.samples.push(elapsed_us);
        } else {
            self.samples[self.head] = elapsed_us;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.head = 0;
    }

    /// Most recently pushed sample.
    pub fn last(&self) -> Option<u64> {
        if self.samples.len() < self.capacity {
            self.samples.last().copied()
        } else {
            let newest = (self.head + self.capacity - 1) % self.capacity;
            Some(self.samples[newest])
        }
    }

    /// Mean of the window, 0 when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<u64>() as f64 / self.samples.len() as f64
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.samples.iter().min()?;
        let max = *self.samples.iter().max()?;
        Some((min, max))
    }
}

/// Per-frame counters of a render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Allocated blocks that passed the frustum test.
    pub visible_blocks: usize,
    /// Screen tiles written to the tile list.
    pub rendering_tiles: usize,
    /// Screen tiles rejected because the tile list was full.
    pub dropped_tiles: usize,
    /// Pixels whose ray met the surface.
    pub found_pixels: usize,
    /// Wall time of the whole pass in microseconds.
    pub elapsed_us: u64,
}

/// Per-pass counters of a meshing or point-cloud pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub triangles: usize,
    pub dropped_triangles: usize,
    pub vertices: usize,
    pub dropped_vertices: usize,
    /// Wall time of the pass in microseconds.
    pub elapsed_us: u64,
}

/// Statistics accumulated across query passes.
#[derive(Debug, Clone)]
pub struct QueryMetrics {
    /// Rolling window of render pass times in microseconds.
    pub render_timings: TimingWindow,
    /// Rolling window of meshing pass times in microseconds.
    pub mesh_timings: TimingWindow,

    /// Counters of the most recent render pass.
    pub last_render: RenderStats,
    /// Counters of the most recent meshing pass.
    pub last_mesh: MeshStats,

    /// Output items dropped on full buffers this session.
    pub total_dropped: u64,
    /// Render passes recorded this session.
    pub total_frames: u64,
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self {
            render_timings: TimingWindow::new(128),
            mesh_timings: TimingWindow::new(128),
            last_render: RenderStats::default(),
            last_mesh: MeshStats::default(),
            total_dropped: 0,
            total_frames: 0,
        }
    }
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-pass state. Session totals are cumulative.
    pub fn reset(&mut self) {
        self.render_timings.clear();
        self.mesh_timings.clear();
        self.last_render = RenderStats::default();
        self.last_mesh = MeshStats::default();
    }

    pub fn record_render(&mut self, stats: &RenderStats) {
        if !is_enabled() {
            return;
        }
        self.render_timings.push(stats.elapsed_us);
        self.last_render = *stats;
        self.total_dropped += stats.dropped_tiles as u64;
        self.total_frames += 1;
    }

    pub fn record_mesh(&mut self, stats: &MeshStats) {
        if !is_enabled() {
            return;
        }
        self.mesh_timings.push(stats.elapsed_us);
        self.last_mesh = *stats;
        self.total_dropped += (stats.dropped_triangles + stats.dropped_vertices) as u64;
    }

    pub fn avg_render_timing_us(&self) -> f64 {
        self.render_timings.average()
    }

    pub fn avg_mesh_timing_us(&self) -> f64 {
        self.mesh_timings.average()
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_timing_window_evicts_oldest() {
        let mut window = TimingWindow::new(3);
        assert!(window.is_empty());

        window.push(10);
        window.push(20);
        window.push(30);
        assert_eq!(window.average(), 20.0);

        // Oldest value is evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.average(), 30.0);
        assert_eq!(window.min_max(), Some((20, 40)));
        assert_eq!(window.last(), Some(40));

        window.push(50);
        assert_eq!(window.last(), Some(50));
        assert_eq!(window.min_max(), Some((30, 50)));
    }

    #[test]
    fn test_render_recording() {
        let mut metrics = QueryMetrics::new();
        metrics.record_render(&RenderStats {
            visible_blocks: 10,
            rendering_tiles: 12,
            dropped_tiles: 2,
            found_pixels: 300,
            elapsed_us: 1000,
        });
        metrics.record_render(&RenderStats {
            elapsed_us: 3000,
            ..RenderStats::default()
        });

        assert_eq!(metrics.total_frames, 2);
        assert_eq!(metrics.total_dropped, 2);
        assert_eq!(metrics.avg_render_timing_us(), 2000.0);
        assert_eq!(metrics.last_render.found_pixels, 0);
    }

    #[test]
    fn test_mesh_recording_and_reset() {
        let mut metrics = QueryMetrics::new();
        metrics.record_mesh(&MeshStats {
            triangles: 5,
            dropped_triangles: 3,
            elapsed_us: 500,
            ..MeshStats::default()
        });
        assert_eq!(metrics.last_mesh.triangles, 5);
        assert_eq!(metrics.total_dropped, 3);

        metrics.reset();
        assert!(metrics.mesh_timings.is_empty());
        assert_eq!(metrics.total_dropped, 3);
    }
}
