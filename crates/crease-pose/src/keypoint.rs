//! Keypoints and skeleton topology
//!
//! Positions live on a normalized plane: x and y are percentages of the
//! frame width and height, both in [0, 100], y pointing down.

use std::ops::Sub;

use rand::Rng;

/// Lower bound of the normalized plane
pub const PLANE_MIN: f32 = 0.0;
/// Upper bound of the normalized plane
pub const PLANE_MAX: f32 = 100.0;

/// Keypoint identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypointLabel {
    Head,
    Neck,
    RightShoulder,
    LeftShoulder,
    RightElbow,
    LeftElbow,
    RightHand,
    Spine,
    Hips,
    RightKnee,
    LeftKnee,
    RightAnkle,
    LeftAnkle,
}

impl KeypointLabel {
    /// All keypoints in index order
    pub fn all() -> &'static [KeypointLabel] {
        &[
            KeypointLabel::Head,
            KeypointLabel::Neck,
            KeypointLabel::RightShoulder,
            KeypointLabel::LeftShoulder,
            KeypointLabel::RightElbow,
            KeypointLabel::LeftElbow,
            KeypointLabel::RightHand,
            KeypointLabel::Spine,
            KeypointLabel::Hips,
            KeypointLabel::RightKnee,
            KeypointLabel::LeftKnee,
            KeypointLabel::RightAnkle,
            KeypointLabel::LeftAnkle,
        ]
    }

    /// Number of keypoints
    pub const fn count() -> usize {
        KEYPOINT_COUNT
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display label
    pub fn name(self) -> &'static str {
        match self {
            KeypointLabel::Head => "Head",
            KeypointLabel::Neck => "Neck",
            KeypointLabel::RightShoulder => "R-Shoulder",
            KeypointLabel::LeftShoulder => "L-Shoulder",
            KeypointLabel::RightElbow => "R-Elbow",
            KeypointLabel::LeftElbow => "L-Elbow",
            KeypointLabel::RightHand => "R-Hand",
            KeypointLabel::Spine => "Spine",
            KeypointLabel::Hips => "Hips",
            KeypointLabel::RightKnee => "R-Knee",
            KeypointLabel::LeftKnee => "L-Knee",
            KeypointLabel::RightAnkle => "R-Ankle",
            KeypointLabel::LeftAnkle => "L-Ankle",
        }
    }

    /// Inverse of `name`
    pub fn from_name(name: &str) -> Option<KeypointLabel> {
        Self::all().iter().copied().find(|label| label.name() == name)
    }
}

pub const KEYPOINT_COUNT: usize = 13;

/// Skeleton segments
pub const SKELETON_EDGES: [(KeypointLabel, KeypointLabel); 12] = [
    (KeypointLabel::Head, KeypointLabel::Neck),
    (KeypointLabel::Neck, KeypointLabel::RightShoulder),
    (KeypointLabel::Neck, KeypointLabel::LeftShoulder),
    (KeypointLabel::RightShoulder, KeypointLabel::RightElbow),
    (KeypointLabel::RightElbow, KeypointLabel::RightHand),
    (KeypointLabel::LeftShoulder, KeypointLabel::LeftElbow),
    (KeypointLabel::Neck, KeypointLabel::Spine),
    (KeypointLabel::Spine, KeypointLabel::Hips),
    (KeypointLabel::Hips, KeypointLabel::RightKnee),
    (KeypointLabel::RightKnee, KeypointLabel::RightAnkle),
    (KeypointLabel::Hips, KeypointLabel::LeftKnee),
    (KeypointLabel::LeftKnee, KeypointLabel::LeftAnkle),
];

/// Reference batting stance, indexed like `KeypointLabel::all()`
const SEED_POSE: [(f32, f32); KEYPOINT_COUNT] = [
    (50.0, 20.0),
    (50.0, 32.0),
    (42.0, 35.0),
    (58.0, 35.0),
    (35.0, 50.0),
    (65.0, 48.0),
    (30.0, 65.0),
    (50.0, 55.0),
    (48.0, 70.0),
    (42.0, 85.0),
    (58.0, 82.0),
    (40.0, 95.0),
    (62.0, 95.0),
];

/// 2D position on the normalized plane
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance to another position
    pub fn distance(self, other: Point2) -> f32 {
        (self - other).length()
    }

    /// Clamp into the normalized plane
    pub fn clamped(self) -> Point2 {
        Point2 {
            x: self.x.clamp(PLANE_MIN, PLANE_MAX),
            y: self.y.clamp(PLANE_MIN, PLANE_MAX),
        }
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A named landmark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub label: KeypointLabel,
    pub position: Point2,
}

/// The full keypoint set. Fixed cardinality; only positions change.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    points: [Point2; KEYPOINT_COUNT],
}

impl Skeleton {
    /// Skeleton in the reference stance
    pub fn seed() -> Self {
        let mut points = [Point2::default(); KEYPOINT_COUNT];
        for (p, &(x, y)) in points.iter_mut().zip(SEED_POSE.iter()) {
            *p = Point2::new(x, y);
        }
        Skeleton { points }
    }

    pub fn get(&self, label: KeypointLabel) -> Point2 {
        self.points[label.index()]
    }

    pub fn set(&mut self, label: KeypointLabel, position: Point2) {
        self.points[label.index()] = position.clamped();
    }

    /// Keypoints in index order
    pub fn keypoints(&self) -> impl Iterator<Item = Keypoint> + '_ {
        KeypointLabel::all()
            .iter()
            .zip(self.points.iter())
            .map(|(&label, &position)| Keypoint { label, position })
    }

    /// Segment endpoints for drawing
    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        SKELETON_EDGES
            .iter()
            .map(move |&(a, b)| (self.get(a), self.get(b)))
    }

    /// Move every point by an independent offset drawn from
    /// `[-magnitude, magnitude]` on each axis, staying on the plane
    pub fn perturb<R: Rng + ?Sized>(&mut self, rng: &mut R, magnitude: f32) {
        let m = magnitude.abs();
        for p in self.points.iter_mut() {
            let dx = rng.gen_range(-m..=m);
            let dy = rng.gen_range(-m..=m);
            *p = Point2::new(p.x + dx, p.y + dy).clamped();
        }
    }

    /// Largest per-axis offset of any point from `other`
    pub fn max_axis_offset(&self, other: &Skeleton) -> f32 {
        self.points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| (a.x - b.x).abs().max((a.y - b.y).abs()))
            .fold(0.0, f32::max)
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_label_indices_match_order() {
        assert_eq!(KeypointLabel::all().len(), KeypointLabel::count());
        for (i, label) in KeypointLabel::all().iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn test_topology_shape() {
        assert_eq!(SKELETON_EDGES.len(), 12);
        // Every keypoint is reachable through some segment
        for label in KeypointLabel::all() {
            assert!(SKELETON_EDGES.iter().any(|&(a, b)| a == *label || b == *label));
        }
    }

    #[test]
    fn test_seed_pose() {
        let skeleton = Skeleton::seed();
        assert_eq!(skeleton.get(KeypointLabel::Head), Point2::new(50.0, 20.0));
        assert_eq!(skeleton.get(KeypointLabel::RightElbow), Point2::new(35.0, 50.0));
        assert_eq!(skeleton.keypoints().count(), 13);
        assert_eq!(skeleton.segments().count(), 12);
    }

    #[test]
    fn test_perturb_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let seed = Skeleton::seed();
        let mut skeleton = seed.clone();
        skeleton.perturb(&mut rng, 0.25);
        assert!(skeleton.max_axis_offset(&seed) <= 0.25);
        assert_ne!(skeleton, seed);
    }

    #[test]
    fn test_positions_stay_on_plane() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut skeleton = Skeleton::seed();
        skeleton.set(KeypointLabel::LeftAnkle, Point2::new(99.9, 99.9));
        for _ in 0..100 {
            skeleton.perturb(&mut rng, 5.0);
        }
        for kp in skeleton.keypoints() {
            assert!((PLANE_MIN..=PLANE_MAX).contains(&kp.position.x));
            assert!((PLANE_MIN..=PLANE_MAX).contains(&kp.position.y));
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(KeypointLabel::RightShoulder.name(), "R-Shoulder");
        assert_eq!(KeypointLabel::LeftAnkle.name(), "L-Ankle");
        for &label in KeypointLabel::all() {
            assert_eq!(KeypointLabel::from_name(label.name()), Some(label));
        }
        assert_eq!(KeypointLabel::from_name("R-Wrist"), None);
    }
}
