use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationMode {
    Linear,
    Step,
}

/// Keyframes for one animated property. Times are in milliseconds and sorted
/// ascending; `values[i]` is the value at `times[i]`.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// A track with no keyframes; sampling it yields `None`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            interpolation: InterpolationMode::Linear,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty() || self.values.is_empty()
    }

    /// Time of the last keyframe, or 0 for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Value at `time`, clamped to the first/last keyframe outside the track range.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let len = self.times.len().min(self.values.len());
        // partition_point finds the first keyframe strictly after `time`
        let next_idx = self.times[..len].partition_point(|&t| t <= time);

        if next_idx == 0 {
            return Some(self.values[0]);
        }
        if next_idx >= len {
            return Some(self.values[len - 1]);
        }

        let index = next_idx - 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;
        let t = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        Some(match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                T::interpolate_linear(self.values[index], self.values[next_idx], t)
            }
        })
    }
}
