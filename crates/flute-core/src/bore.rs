use crate::elements::{cone_matrix, tube_matrix};
use crate::transfer_matrix::TransferMatrix;
use crate::AcousticElement;
use serde::{Deserialize, Serialize};

/// Wall losses applied along the main bore.
pub const BORE_ALPHA_CORRECTION: f64 = 1.0;

/// A straight (cylindrical) or conical slice of the bore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoreSegment {
    /// Input radius in metres.
    pub radius1: f64,
    /// Output radius in metres.
    pub radius2: f64,
    /// Length in metres.
    pub length: f64,
    /// Speed of sound (m/s), set by the environment step.
    #[serde(skip)]
    pub c: f64,
    /// Air density (kg/m³), set by the environment step.
    #[serde(skip)]
    pub rho: f64,
}

impl BoreSegment {
    pub fn new(radius1: f64, radius2: f64, length: f64) -> Self {
        Self {
            radius1,
            radius2,
            length,
            c: 0.0,
            rho: 0.0,
        }
    }

    pub fn cylinder(radius: f64, length: f64) -> Self {
        Self::new(radius, radius, length)
    }

    /// Radius at distance `x` from the input, linearly interpolated.
    pub fn radius_at(&self, x: f64) -> f64 {
        (self.radius2 * x + self.radius1 * (self.length - x)) / self.length
    }

    /// Transfer matrix of the first `x` metres of the segment (all of it if
    /// `x` reaches the output).
    pub fn matrix_to(&self, f: f64, x: f64) -> TransferMatrix {
        let (length, radius2) = if x >= self.length {
            (self.length, self.radius2)
        } else {
            (x, self.radius_at(x))
        };
        if self.radius1 == radius2 {
            tube_matrix(
                f,
                self.c,
                self.rho,
                length,
                self.radius1,
                BORE_ALPHA_CORRECTION,
            )
        } else {
            cone_matrix(
                f,
                self.c,
                self.rho,
                length,
                self.radius1,
                radius2,
                BORE_ALPHA_CORRECTION,
            )
        }
    }
}

impl AcousticElement for BoreSegment {
    fn transfer_matrix(&self, f: f64) -> TransferMatrix {
        self.matrix_to(f, self.length)
    }
}

/// An ordered run of bore segments, upstream first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bore {
    segments: Vec<BoreSegment>,
}

impl Bore {
    pub fn new(segments: Vec<BoreSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[BoreSegment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [BoreSegment] {
        &mut self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&BoreSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&BoreSegment> {
        self.segments.last()
    }

    /// Total length in metres.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Transfer matrix of the first `x` metres of the bore.
    pub fn matrix_to(&self, f: f64, mut x: f64) -> TransferMatrix {
        let mut m = TransferMatrix::identity();
        for segment in &self.segments {
            if x <= 0.0 {
                break;
            }
            m.right_multiply(&segment.matrix_to(f, x));
            x -= segment.length;
        }
        m
    }

    /// Transfer matrix of the whole bore.
    pub fn matrix(&self, f: f64) -> TransferMatrix {
        self.matrix_to(f, self.length())
    }

    /// Split every segment longer than `max_length` into
    /// `ceil(length / max_length)` equal pieces with linearly interpolated
    /// radii. Returns the number of segments added.
    pub fn discretise(&mut self, max_length: f64) -> usize {
        let before = self.segments.len();
        let mut pieces = Vec::with_capacity(before);
        for segment in self.segments.drain(..) {
            if segment.length <= max_length {
                pieces.push(segment);
                continue;
            }
            let n = (segment.length / max_length).ceil() as usize;
            let length = segment.length / n as f64;
            let mut radius1 = segment.radius1;
            for i in 1..=n {
                // the last piece ends exactly on the original output radius
                let radius2 = if i == n {
                    segment.radius2
                } else {
                    (i as f64 * segment.radius2 + (n - i) as f64 * segment.radius1) / n as f64
                };
                pieces.push(BoreSegment {
                    radius1,
                    radius2,
                    length,
                    ..segment
                });
                radius1 = radius2;
            }
        }
        self.segments = pieces;
        self.segments.len() - before
    }
}

impl From<Vec<BoreSegment>> for Bore {
    fn from(segments: Vec<BoreSegment>) -> Self {
        Self::new(segments)
    }
}
