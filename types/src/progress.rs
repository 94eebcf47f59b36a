//! Byte transfer progress.

use std::sync::Arc;

/// How far a transfer has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_done: u64,
    /// `None` when the peer did not announce a length.
    pub bytes_overall: Option<u64>,
}

impl Progress {
    #[must_use]
    pub const fn new(bytes_done: u64, bytes_overall: Option<u64>) -> Self {
        Self {
            bytes_done,
            bytes_overall,
        }
    }

    /// Value between 0.0 and 1.0. Zero when the total is unknown or zero.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        match self.bytes_overall {
            Some(overall) if overall > 0 => {
                (self.bytes_done as f64 / overall as f64).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bytes_overall
            .is_some_and(|overall| self.bytes_done >= overall)
    }
}

pub type ProgressHandler = Arc<dyn Fn(Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_known_total() {
        assert!((Progress::new(256, Some(1024)).fraction() - 0.25).abs() < f32::EPSILON);
        assert!((Progress::new(1024, Some(1024)).fraction() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fraction_is_zero_without_total() {
        assert!(Progress::new(10, None).fraction().abs() < f32::EPSILON);
        assert!(Progress::new(10, Some(0)).fraction().abs() < f32::EPSILON);
    }

    #[test]
    fn completion() {
        assert!(Progress::new(5, Some(5)).is_complete());
        assert!(!Progress::new(4, Some(5)).is_complete());
        assert!(!Progress::new(5, None).is_complete());
    }
}
