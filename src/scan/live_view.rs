/// Fire-and-forget sink for in-progress scan traces. Pushes hand over owned
/// snapshots, so a renderer can never observe a half-written buffer; it must
/// not block for a meaningful fraction of the fast-mode sample period.
pub trait LiveView {
    /// Incremental update, called once per acquired sample.
    fn update(&mut self, positions: Vec<f64>, values: Vec<f64>);

    /// Final complete trace, called exactly once at scan end.
    fn finalize(&mut self, positions: Vec<f64>, values: Vec<f64>);
}

/// Sink that drops everything.
pub struct NullView;

impl LiveView for NullView {
    fn update(&mut self, _positions: Vec<f64>, _values: Vec<f64>) {}
    fn finalize(&mut self, _positions: Vec<f64>, _values: Vec<f64>) {}
}

/// Logs coarse progress; stands in for the plot window when running
/// headless.
pub struct LogView {
    updates: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self { updates: 0 }
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveView for LogView {
    fn update(&mut self, positions: Vec<f64>, values: Vec<f64>) {
        self.updates += 1;
        if self.updates % 10 == 0 {
            if let (Some(p), Some(v)) = (positions.last(), values.last()) {
                log::info!("sample {}: pos {p:.4} mm, X {v:.3e}", self.updates);
            }
        }
    }

    fn finalize(&mut self, positions: Vec<f64>, _values: Vec<f64>) {
        log::info!("scan finished with {} samples", positions.len());
    }
}

/// Retains every push; used by tests.
#[derive(Default)]
pub struct CollectingView {
    pub updates: Vec<(Vec<f64>, Vec<f64>)>,
    pub finalized: Option<(Vec<f64>, Vec<f64>)>,
}

impl LiveView for CollectingView {
    fn update(&mut self, positions: Vec<f64>, values: Vec<f64>) {
        self.updates.push((positions, values));
    }

    fn finalize(&mut self, positions: Vec<f64>, values: Vec<f64>) {
        self.finalized = Some((positions, values));
    }
}
