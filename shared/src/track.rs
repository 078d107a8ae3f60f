//! Keyframe tracks
//!
//! A [`Track`] is a named curve made of [`Key`]s sorted by row. Evaluating a
//! track between two keys interpolates with the *left* key's
//! [`Interpolation`]; outside the key range the nearest key's value is held.

/// How the value moves from one key to the next.
///
/// The discriminants are the values used on the wire and in track files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Interpolation {
    /// Hold the key's value until the next key
    #[default]
    Step = 0,
    /// Straight line to the next key
    Linear = 1,
    /// Ease in and out (`t²(3 - 2t)`)
    Smooth = 2,
    /// Ease in only (`t²`)
    Ramp = 3,
}

impl Interpolation {
    /// Decode a wire byte. Returns `None` for unknown kinds.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Step),
            1 => Some(Self::Linear),
            2 => Some(Self::Smooth),
            3 => Some(Self::Ramp),
            _ => None,
        }
    }

    /// Wire byte for this kind
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Shape a normalized segment position `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Step => 0.0,
            Self::Linear => t,
            Self::Smooth => t * t * (3.0 - 2.0 * t),
            Self::Ramp => t * t,
        }
    }
}

/// A single key point on a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    /// Row the key sits on
    pub row: f64,
    /// Value at that row
    pub value: f32,
    /// Interpolation towards the following key
    pub interpolation: Interpolation,
}

impl Key {
    pub fn new(row: f64, value: f32, interpolation: Interpolation) -> Self {
        Self {
            row,
            value,
            interpolation,
        }
    }
}

/// A named keyframe curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    name: String,
    keys: Vec<Key>,
}

impl Track {
    /// Create an empty track. An empty track evaluates to `0.0` everywhere.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
        }
    }

    /// Create a track from unordered keys.
    ///
    /// Keys are sorted by row; when two keys share a row the later one wins.
    pub fn from_keys(name: impl Into<String>, keys: impl IntoIterator<Item = Key>) -> Self {
        let mut track = Self::new(name);
        for key in keys {
            track.set_key(key);
        }
        track
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Insert a key, replacing any key already on the same row.
    pub fn set_key(&mut self, key: Key) {
        let idx = self.keys.partition_point(|k| k.row < key.row);
        match self.keys.get_mut(idx) {
            Some(existing) if existing.row == key.row => *existing = key,
            _ => self.keys.insert(idx, key),
        }
    }

    /// Remove the key on `row`. Returns `false` if there was none.
    pub fn delete_key(&mut self, row: f64) -> bool {
        let idx = self.keys.partition_point(|k| k.row < row);
        if self.keys.get(idx).is_some_and(|k| k.row == row) {
            self.keys.remove(idx);
            true
        } else {
            false
        }
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Evaluate the track at a fractional row.
    ///
    /// Rows before the first key yield the first value, rows at or past the
    /// last key yield the last value.
    pub fn evaluate(&self, row: f64) -> f32 {
        let Some(first) = self.keys.first() else {
            return 0.0;
        };
        if row.is_nan() || row <= first.row {
            return first.value;
        }

        // row > first.row, so at least one key satisfies the predicate
        let idx = self.keys.partition_point(|k| k.row <= row) - 1;
        let from = self.keys[idx];
        let Some(to) = self.keys.get(idx + 1) else {
            return from.value;
        };

        let t = (row - from.row) / (to.row - from.row);
        let t = from.interpolation.apply(t) as f32;
        from.value + (to.value - from.value) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn linear(row: f64, value: f32) -> Key {
        Key::new(row, value, Interpolation::Linear)
    }

    #[test]
    fn test_empty_track_is_zero() {
        let track = Track::new("empty");
        assert_eq!(track.evaluate(-10.0), 0.0);
        assert_eq!(track.evaluate(0.0), 0.0);
        assert_eq!(track.evaluate(1e6), 0.0);
    }

    #[test]
    fn test_linear_interpolation() {
        let track = Track::from_keys("fade", [linear(0.0, 0.0), linear(10.0, 100.0)]);
        assert_eq!(track.evaluate(5.0), 50.0);
        assert_eq!(track.evaluate(2.5), 25.0);
    }

    #[test]
    fn test_clamps_outside_key_range() {
        let track = Track::from_keys(
            "clamped",
            [linear(4.0, 3.0), linear(8.0, 7.0), linear(12.0, -1.0)],
        );
        for row in [-100.0, 0.0, 3.99, 4.0] {
            assert_eq!(track.evaluate(row), 3.0, "row {row}");
        }
        for row in [12.0, 12.01, 500.0] {
            assert_eq!(track.evaluate(row), -1.0, "row {row}");
        }
    }

    #[test]
    fn test_step_holds_until_next_key() {
        let track = Track::from_keys(
            "step",
            [
                Key::new(0.0, 1.0, Interpolation::Step),
                Key::new(4.0, 2.0, Interpolation::Step),
            ],
        );
        assert_eq!(track.evaluate(0.0), 1.0);
        assert_eq!(track.evaluate(3.999), 1.0);
        assert_eq!(track.evaluate(4.0), 2.0);
    }

    #[test]
    fn test_smooth_and_ramp_curves() {
        let smooth = Track::from_keys(
            "smooth",
            [Key::new(0.0, 0.0, Interpolation::Smooth), linear(2.0, 1.0)],
        );
        assert!(approx(smooth.evaluate(1.0), 0.5));
        assert!(approx(smooth.evaluate(0.5), 0.15625));

        let ramp = Track::from_keys(
            "ramp",
            [Key::new(0.0, 0.0, Interpolation::Ramp), linear(2.0, 1.0)],
        );
        assert!(approx(ramp.evaluate(1.0), 0.25));
    }

    #[test]
    fn test_interpolation_of_left_key_is_used() {
        let track = Track::from_keys(
            "mixed",
            [
                linear(0.0, 0.0),
                Key::new(10.0, 10.0, Interpolation::Step),
                linear(20.0, 20.0),
            ],
        );
        assert_eq!(track.evaluate(5.0), 5.0);
        assert_eq!(track.evaluate(15.0), 10.0);
    }

    #[test]
    fn test_from_keys_sorts() {
        let track = Track::from_keys("unordered", [linear(8.0, 2.0), linear(0.0, 0.0)]);
        assert_eq!(track.keys()[0].row, 0.0);
        assert_eq!(track.keys()[1].row, 8.0);
        assert_eq!(track.evaluate(4.0), 1.0);
    }

    #[test]
    fn test_set_key_replaces_same_row() {
        let mut track = Track::new("edit");
        track.set_key(linear(2.0, 1.0));
        track.set_key(linear(2.0, 5.0));
        assert_eq!(track.len(), 1);
        assert_eq!(track.evaluate(2.0), 5.0);
    }

    #[test]
    fn test_delete_key() {
        let mut track = Track::from_keys("edit", [linear(0.0, 0.0), linear(4.0, 4.0)]);
        assert!(track.delete_key(4.0));
        assert!(!track.delete_key(4.0));
        assert_eq!(track.len(), 1);
        assert_eq!(track.evaluate(10.0), 0.0);
    }

    #[test]
    fn test_nan_row_holds_first_value() {
        let track = Track::from_keys("nan", [linear(0.0, 3.0), linear(1.0, 4.0)]);
        assert_eq!(track.evaluate(f64::NAN), 3.0);
    }

    #[test]
    fn test_interpolation_wire_values() {
        for kind in [
            Interpolation::Step,
            Interpolation::Linear,
            Interpolation::Smooth,
            Interpolation::Ramp,
        ] {
            assert_eq!(Interpolation::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(Interpolation::from_u8(4), None);
    }
}
