use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::queue::{LogicalKey, PressedKeys};

const DIAGONAL: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Eight-way heading. World axes are y-up: `Up` is `+y`, `Right` is `+x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    #[default]
    None,
}

impl Direction {
    /// Derive a heading from the pressed keys.
    /// Opposite keys cancel first, then the remaining axes combine.
    pub fn from_keys(keys: &PressedKeys) -> Self {
        let up = keys.contains(LogicalKey::Up);
        let down = keys.contains(LogicalKey::Down);
        let left = keys.contains(LogicalKey::Left);
        let right = keys.contains(LogicalKey::Right);

        let vertical = match (up, down) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        };
        let horizontal = match (left, right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };

        match (horizontal, vertical) {
            (0, 1) => Direction::Up,
            (0, -1) => Direction::Down,
            (-1, 0) => Direction::Left,
            (1, 0) => Direction::Right,
            (-1, 1) => Direction::UpLeft,
            (1, 1) => Direction::UpRight,
            (-1, -1) => Direction::DownLeft,
            (1, -1) => Direction::DownRight,
            _ => Direction::None,
        }
    }

    /// Unit vector for this heading; diagonals are normalized, `None` is zero.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
            Direction::UpLeft => Vec2::new(-DIAGONAL, DIAGONAL),
            Direction::UpRight => Vec2::new(DIAGONAL, DIAGONAL),
            Direction::DownLeft => Vec2::new(-DIAGONAL, -DIAGONAL),
            Direction::DownRight => Vec2::new(DIAGONAL, -DIAGONAL),
            Direction::None => Vec2::ZERO,
        }
    }

    pub fn is_none(self) -> bool {
        self == Direction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[LogicalKey]) -> PressedKeys {
        list.iter().fold(PressedKeys::new(), |k, &key| k.with(key))
    }

    #[test]
    fn single_and_diagonal_keys() {
        assert_eq!(Direction::from_keys(&keys(&[LogicalKey::Up])), Direction::Up);
        assert_eq!(
            Direction::from_keys(&keys(&[LogicalKey::Down, LogicalKey::Left])),
            Direction::DownLeft
        );
        assert_eq!(Direction::from_keys(&PressedKeys::new()), Direction::None);
    }

    #[test]
    fn opposites_cancel_before_combining() {
        assert_eq!(
            Direction::from_keys(&keys(&[LogicalKey::Up, LogicalKey::Down])),
            Direction::None
        );
        assert_eq!(
            Direction::from_keys(&keys(&[LogicalKey::Up, LogicalKey::Down, LogicalKey::Right])),
            Direction::Right
        );
        assert_eq!(
            Direction::from_keys(&keys(&[
                LogicalKey::Up,
                LogicalKey::Down,
                LogicalKey::Left,
                LogicalKey::Right
            ])),
            Direction::None
        );
    }

    #[test]
    fn units_have_length_one() {
        for dir in [Direction::Up, Direction::UpRight, Direction::DownLeft, Direction::Left] {
            assert!((dir.unit().length() - 1.0).abs() < 1e-6, "{dir:?}");
        }
        assert_eq!(Direction::None.unit(), Vec2::ZERO);
    }
}
