/// One acquisition tick. A missing quadrature or aux value is NaN.
#[derive(Clone, Copy, Debug)]
pub struct RawSample {
    pub position_mm: f64,
    pub primary: f64,
    pub quadrature: f64,
    pub aux: f64,
}

/// Preallocated column store for one scan. Slots hold NaN until written;
/// `truncate` discards the unfilled tail after a fast-mode early stop.
#[derive(Clone, Debug)]
pub struct ScanBuffer {
    position: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    aux: Vec<f64>,
    filled: usize,
}

impl ScanBuffer {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            position: vec![f64::NAN; n],
            x: vec![f64::NAN; n],
            y: vec![f64::NAN; n],
            aux: vec![f64::NAN; n],
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.position.len()
    }

    /// Number of slots written so far.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn write(&mut self, i: usize, sample: RawSample) {
        self.position[i] = sample.position_mm;
        self.x[i] = sample.primary;
        self.y[i] = sample.quadrature;
        self.aux[i] = sample.aux;
        self.filled = self.filled.max(i + 1);
    }

    pub fn truncate(&mut self, len: usize) {
        self.position.truncate(len);
        self.x.truncate(len);
        self.y.truncate(len);
        self.aux.truncate(len);
        self.filled = self.filled.min(len);
    }

    pub fn positions(&self) -> &[f64] {
        &self.position[..self.filled]
    }

    pub fn x(&self) -> &[f64] {
        &self.x[..self.filled]
    }

    pub fn y(&self) -> &[f64] {
        &self.y[..self.filled]
    }

    pub fn aux(&self) -> &[f64] {
        &self.aux[..self.filled]
    }
}
