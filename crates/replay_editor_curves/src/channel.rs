// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channels: named scalar curves made of time-sorted keyframes.

use crate::bezier::{set_x_keep_direction, CubicBezier};
use crate::error::{CurveError, Result};
use crate::keyframe::{HandleSide, HandleType, Keyframe};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Tolerance when inverting time into a curve parameter
const PARAM_EPSILON: f64 = 1e-6;

/// Tangent policy for the first and last keyframe of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndTangents {
    /// Zero slope at both ends
    #[default]
    Flat,
    /// Forward difference at the start, backward difference at the end
    Difference,
}

/// A single scalar curve.
///
/// Serialized as a plain keyframe list. Decoding restores time order and
/// rejects negative times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Keyframe>", try_from = "Vec<Keyframe>")]
pub struct Channel {
    keyframes: Vec<Keyframe>,
}

impl TryFrom<Vec<Keyframe>> for Channel {
    type Error = CurveError;

    fn try_from(keyframes: Vec<Keyframe>) -> Result<Self> {
        if let Some(key) = keyframes.iter().find(|k| k.time < 0) {
            return Err(CurveError::InvalidArgument(format!(
                "keyframe time must not be negative, got {}",
                key.time
            )));
        }
        Ok(Self::from_keyframes(keyframes))
    }
}

impl From<Channel> for Vec<Keyframe> {
    fn from(channel: Channel) -> Self {
        channel.keyframes
    }
}

impl Channel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel from keyframes in any order
    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Self {
        let mut channel = Self { keyframes };
        channel.resort();
        channel
    }

    /// Get all keyframes
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Mutable access for in-place drags. Call [`Channel::resort`] when done.
    pub fn keyframes_mut(&mut self) -> &mut [Keyframe] {
        &mut self.keyframes
    }

    /// Get keyframe count
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the channel has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Get keyframe by index
    pub fn get(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    /// Get mutable keyframe by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Keyframe> {
        self.keyframes.get_mut(index)
    }

    /// Insert a keyframe at its sorted position.
    ///
    /// A keyframe already sitting at the same time is replaced. Returns the
    /// index of the inserted keyframe.
    pub fn insert(&mut self, keyframe: Keyframe) -> Result<usize> {
        if keyframe.time < 0 {
            return Err(CurveError::InvalidArgument(format!(
                "keyframe time must not be negative, got {}",
                keyframe.time
            )));
        }

        match self.keyframes.binary_search_by_key(&keyframe.time, |k| k.time) {
            Ok(index) => {
                self.keyframes[index] = keyframe;
                Ok(index)
            }
            Err(index) => {
                self.keyframes.insert(index, keyframe);
                Ok(index)
            }
        }
    }

    /// Remove a keyframe by index
    pub fn remove(&mut self, index: usize) -> Option<Keyframe> {
        if index < self.keyframes.len() {
            Some(self.keyframes.remove(index))
        } else {
            None
        }
    }

    /// Restore time order after in-place edits.
    ///
    /// Returns the mapping `old index -> new index`. Keyframes sharing a time
    /// keep their relative order.
    pub fn resort(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keyframes.len()).collect();
        order.sort_by_key(|&i| self.keyframes[i].time);

        let mut mapping = vec![0; order.len()];
        for (new_index, &old_index) in order.iter().enumerate() {
            mapping[old_index] = new_index;
        }

        if order.iter().enumerate().any(|(new, &old)| new != old) {
            let mut slots: Vec<Option<Keyframe>> =
                std::mem::take(&mut self.keyframes).into_iter().map(Some).collect();
            self.keyframes = order.iter().filter_map(|&i| slots[i].take()).collect();
        }

        mapping
    }

    /// Index of the keyframe at exactly `time`
    pub fn index_of_time(&self, time: i64) -> Option<usize> {
        self.keyframes.binary_search_by_key(&time, |k| k.time).ok()
    }

    /// Get keyframe at time (if exists)
    pub fn keyframe_at(&self, time: i64) -> Option<&Keyframe> {
        self.index_of_time(time).map(|i| &self.keyframes[i])
    }

    /// Get nearest keyframe to time
    pub fn nearest_keyframe(&self, time: i64) -> Option<&Keyframe> {
        self.keyframes.iter().min_by_key(|k| (k.time - time).abs())
    }

    /// Get keyframes in a time range (inclusive)
    pub fn keyframes_in_range(&self, start: i64, end: i64) -> impl Iterator<Item = (usize, &Keyframe)> {
        self.keyframes
            .iter()
            .enumerate()
            .filter(move |(_, k)| k.time >= start && k.time <= end)
    }

    /// First and last keyframe time
    pub fn time_range(&self) -> Option<(i64, i64)> {
        Some((self.keyframes.first()?.time, self.keyframes.last()?.time))
    }

    /// Offset all keyframes by a time delta, clamping at zero
    pub fn offset_time(&mut self, delta: i64) -> Vec<usize> {
        for key in &mut self.keyframes {
            key.time = (key.time + delta).max(0);
        }
        self.resort()
    }

    /// Evaluate the channel value at `timestamp` (milliseconds)
    pub fn sample(&self, timestamp: f64) -> f64 {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if timestamp <= first.time as f64 {
            return first.value;
        }
        if timestamp >= last.time as f64 {
            return last.value;
        }

        // First keyframe strictly after the timestamp; bounds checked above
        let next = self.keyframes.partition_point(|k| (k.time as f64) <= timestamp);
        let left = &self.keyframes[next - 1];
        let right = &self.keyframes[next];
        sample_segment(left, right, timestamp)
    }

    /// Recompute handles according to their handle types
    pub fn compute_auto_handles(&mut self, dragged: Option<(usize, HandleSide)>) {
        compute_auto_handles(&mut self.keyframes, EndTangents::Flat, dragged);
    }
}

fn sample_segment(left: &Keyframe, right: &Keyframe, timestamp: f64) -> f64 {
    if left.time == right.time {
        return right.value;
    }

    let curve = CubicBezier::from_keyframes(left, right);
    let param = curve
        .intersect_x(timestamp)
        .into_iter()
        .flatten()
        .find(|t| (-PARAM_EPSILON..=1.0 + PARAM_EPSILON).contains(t));

    match param {
        Some(t) => curve.sample(t.clamp(0.0, 1.0)).y,
        None => {
            // Degenerate handles: fall back to a straight segment
            let t = (timestamp - left.time as f64) / (right.time - left.time) as f64;
            left.value + (right.value - left.value) * t
        }
    }
}

/// Per keyframe slope used by the auto handle policies
fn tangents(keyframes: &[Keyframe], ends: EndTangents) -> Vec<f64> {
    let n = keyframes.len();
    let slope = |a: &Keyframe, b: &Keyframe| {
        let dt = (b.time - a.time) as f64;
        if dt == 0.0 {
            0.0
        } else {
            (b.value - a.value) / dt
        }
    };

    (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 {
                match ends {
                    EndTangents::Flat => 0.0,
                    EndTangents::Difference if n < 2 => 0.0,
                    EndTangents::Difference if i == 0 => slope(&keyframes[0], &keyframes[1]),
                    EndTangents::Difference => slope(&keyframes[n - 2], &keyframes[n - 1]),
                }
            } else {
                slope(&keyframes[i - 1], &keyframes[i + 1])
            }
        })
        .collect()
}

/// Recompute handle offsets of time-sorted keyframes from their handle types.
///
/// `dragged` names a handle being moved interactively; an aligned handle in
/// that slot is left alone.
pub fn compute_auto_handles(
    keyframes: &mut [Keyframe],
    ends: EndTangents,
    dragged: Option<(usize, HandleSide)>,
) {
    let n = keyframes.len();
    if n < 2 {
        return;
    }
    let slopes = tangents(keyframes, ends);

    for i in 0..n {
        let mut sides = Vec::with_capacity(2);
        if i > 0 {
            sides.push(HandleSide::A);
        }
        if i + 1 < n {
            sides.push(HandleSide::B);
        }

        // Aligned handles mirror the final position of the other handle
        sides.sort_by_key(|side| keyframes[i].handle_type(*side) == HandleType::Aligned);

        for side in sides {
            let neighbor = match side {
                HandleSide::A => i - 1,
                HandleSide::B => i + 1,
            };
            let sign = match side {
                HandleSide::A => -1.0,
                HandleSide::B => 1.0,
            };
            let dt = (keyframes[neighbor].time - keyframes[i].time).abs() as f64;
            let third = dt / 3.0;

            match keyframes[i].handle_type(side) {
                // TODO: clamp AutoClamped against overshoot once the clamping rule is settled
                HandleType::Auto | HandleType::AutoClamped => {
                    *keyframes[i].handle_mut(side) =
                        DVec2::new(sign * third, sign * slopes[i] * third);
                }
                HandleType::Aligned => {
                    if dragged == Some((i, side)) {
                        continue;
                    }
                    let other = keyframes[i].handle(side.opposite());
                    let length = keyframes[i].handle(side).length();
                    if other.length_squared() > 0.0 {
                        *keyframes[i].handle_mut(side) = -other.normalize() * length;
                    }
                }
                HandleType::Vector => {
                    let direction = keyframes[neighbor].center() - keyframes[i].center();
                    match set_x_keep_direction(direction, sign * third) {
                        Ok(handle) => *keyframes[i].handle_mut(side) = handle,
                        Err(err) => {
                            tracing::warn!(index = i, ?side, "Skipping vector handle: {err}");
                        }
                    }
                }
                HandleType::Free => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn channel(points: &[(i64, f64)]) -> Channel {
        Channel::from_keyframes(points.iter().map(|&(t, v)| Keyframe::new(t, v)).collect())
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut ch = Channel::new();
        assert_eq!(ch.insert(Keyframe::new(10, 1.0)).unwrap(), 0);
        assert_eq!(ch.insert(Keyframe::new(0, 0.0)).unwrap(), 0);
        assert_eq!(ch.insert(Keyframe::new(5, 2.0)).unwrap(), 1);
        let times: Vec<i64> = ch.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0, 5, 10]);

        // Same time replaces
        assert_eq!(ch.insert(Keyframe::new(5, 7.0)).unwrap(), 1);
        assert_eq!(ch.len(), 3);
        assert_eq!(ch.get(1).unwrap().value, 7.0);
    }

    #[test]
    fn test_insert_rejects_negative_time() {
        let mut ch = Channel::new();
        assert!(matches!(
            ch.insert(Keyframe::new(-1, 0.0)),
            Err(CurveError::InvalidArgument(_))
        ));
        assert!(ch.is_empty());
    }

    #[test]
    fn test_resort_mapping() {
        let mut ch = channel(&[(0, 0.0), (10, 1.0), (20, 2.0)]);
        ch.keyframes_mut()[0].time = 15;
        let mapping = ch.resort();
        assert_eq!(mapping, vec![1, 0, 2]);
        let values: Vec<f64> = ch.keyframes().iter().map(|k| k.value).collect();
        assert_eq!(values, vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_sample_edges() {
        assert_eq!(Channel::new().sample(3.0), 0.0);
        assert_eq!(channel(&[(5, 4.0)]).sample(100.0), 4.0);

        let ch = channel(&[(10, 1.0), (20, 3.0)]);
        assert_eq!(ch.sample(0.0), 1.0);
        assert_eq!(ch.sample(10.0), 1.0);
        assert_eq!(ch.sample(25.0), 3.0);
    }

    #[test]
    fn test_flat_line_stays_flat() {
        let mut ch = channel(&[(0, 0.0), (10, 0.0)]);
        ch.compute_auto_handles(None);
        assert!(ch.sample(5.0).abs() < EPS);
    }

    #[test]
    fn test_sample_follows_handles() {
        // Handles at thirds along a straight line make the segment linear
        let mut ch = Channel::new();
        ch.insert(Keyframe::new(0, 0.0).with_handles(DVec2::ZERO, DVec2::new(10.0, 1.0)))
            .unwrap();
        ch.insert(Keyframe::new(30, 3.0).with_handles(DVec2::new(-10.0, -1.0), DVec2::ZERO))
            .unwrap();
        assert!((ch.sample(15.0) - 1.5).abs() < 1e-6);
        assert!((ch.sample(6.0) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_auto_handles_interior_tangent() {
        let mut ch = channel(&[(0, 0.0), (30, 3.0), (60, 6.0)]);
        ch.compute_auto_handles(None);

        let first = ch.get(0).unwrap();
        assert_eq!(first.handle_a, DVec2::ZERO);
        assert!((first.handle_b - DVec2::new(10.0, 0.0)).length() < EPS);

        let middle = ch.get(1).unwrap();
        assert!((middle.handle_a - DVec2::new(-10.0, -1.0)).length() < EPS);
        assert!((middle.handle_b - DVec2::new(10.0, 1.0)).length() < EPS);

        let last = ch.get(2).unwrap();
        assert!((last.handle_a - DVec2::new(-10.0, 0.0)).length() < EPS);
        assert_eq!(last.handle_b, DVec2::ZERO);
    }

    #[test]
    fn test_difference_end_tangents() {
        let mut keys = vec![Keyframe::new(0, 0.0), Keyframe::new(30, 3.0)];
        compute_auto_handles(&mut keys, EndTangents::Difference, None);
        assert!((keys[0].handle_b - DVec2::new(10.0, 1.0)).length() < EPS);
        assert!((keys[1].handle_a - DVec2::new(-10.0, -1.0)).length() < EPS);
    }

    #[test]
    fn test_vector_handles_point_at_neighbors() {
        let mut ch = channel(&[(0, 0.0), (30, 6.0)]);
        for key in ch.keyframes_mut() {
            key.handle_a_type = HandleType::Vector;
            key.handle_b_type = HandleType::Vector;
        }
        ch.compute_auto_handles(None);
        assert!((ch.get(0).unwrap().handle_b - DVec2::new(10.0, 2.0)).length() < EPS);
        assert!((ch.get(1).unwrap().handle_a - DVec2::new(-10.0, -2.0)).length() < EPS);
    }

    #[test]
    fn test_aligned_mirrors_other_handle() {
        let mut ch = Channel::new();
        ch.insert(Keyframe::new(0, 0.0)).unwrap();
        ch.insert(
            Keyframe::new(30, 0.0)
                .with_handles(DVec2::new(-4.0, 3.0), DVec2::new(1.0, 1.0))
                .with_handle_types(HandleType::Free, HandleType::Aligned),
        )
        .unwrap();
        ch.insert(Keyframe::new(60, 0.0)).unwrap();

        ch.compute_auto_handles(None);
        let middle = ch.get(1).unwrap();
        assert_eq!(middle.handle_a, DVec2::new(-4.0, 3.0));
        let expected = DVec2::new(4.0, -3.0).normalize() * DVec2::new(1.0, 1.0).length();
        assert!((middle.handle_b - expected).length() < EPS);
    }

    #[test]
    fn test_aligned_skips_dragged_handle() {
        let mut ch = Channel::new();
        ch.insert(Keyframe::new(0, 0.0)).unwrap();
        ch.insert(
            Keyframe::new(30, 0.0)
                .with_handles(DVec2::new(-4.0, 3.0), DVec2::new(1.0, 1.0))
                .with_handle_types(HandleType::Free, HandleType::Aligned),
        )
        .unwrap();
        ch.insert(Keyframe::new(60, 0.0)).unwrap();

        ch.compute_auto_handles(Some((1, HandleSide::B)));
        assert_eq!(ch.get(1).unwrap().handle_b, DVec2::new(1.0, 1.0));
    }

    #[test]
    fn test_range_queries() {
        let mut ch = channel(&[(0, 0.0), (10, 1.0), (20, 2.0)]);
        assert_eq!(ch.time_range(), Some((0, 20)));
        assert_eq!(ch.keyframes_in_range(5, 20).count(), 2);
        assert_eq!(ch.nearest_keyframe(14).unwrap().time, 10);
        assert_eq!(ch.keyframe_at(20).unwrap().value, 2.0);

        ch.offset_time(-5);
        let times: Vec<i64> = ch.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0, 5, 15]);
    }

    #[test]
    fn test_serializes_as_list() {
        let ch = channel(&[(0, 1.0)]);
        let json = serde_json::to_value(&ch).unwrap();
        assert!(json.is_array());
        let back: Channel = serde_json::from_value(json).unwrap();
        assert_eq!(back, ch);
    }

    #[test]
    fn test_decoding_restores_order() {
        let json = serde_json::json!([{"time": 100, "value": 10.0}, {"time": 0, "value": 0.0}]);
        let ch: Channel = serde_json::from_value(json).unwrap();
        let times: Vec<_> = ch.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [0, 100]);
        assert!(ch.sample(0.0).abs() < EPS);
        assert!((ch.sample(100.0) - 10.0).abs() < EPS);
    }

    #[test]
    fn test_decoding_rejects_negative_time() {
        let json = serde_json::json!([{"time": -5, "value": 1.0}]);
        assert!(serde_json::from_value::<Channel>(json).is_err());
    }
}
