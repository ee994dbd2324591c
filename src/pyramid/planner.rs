/// Largest extent the smallest pyramid level may have
pub const TARGET_SIZE: usize = 96;

/// Number of resolution levels for an image of `size_x` × `size_y`, halving
/// until the longest side is at most [`TARGET_SIZE`].
pub fn level_count(size_x: usize, size_y: usize) -> usize {
    level_count_with_target(size_x, size_y, TARGET_SIZE)
}

/// Like [`level_count`] with a custom target. A target of zero is treated as one.
pub fn level_count_with_target(size_x: usize, size_y: usize, target: usize) -> usize {
    let target = target.max(1);
    let mut longest = size_x.max(size_y);
    let mut levels = 1;
    while longest > target {
        longest /= 2;
        levels += 1;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_count_boundaries() {
        assert_eq!(level_count(96, 96), 1);
        assert_eq!(level_count(97, 10), 2);
        assert_eq!(level_count(192, 192), 2);
        assert_eq!(level_count(193, 1), 2);
        assert_eq!(level_count(194, 1), 3);
        assert_eq!(level_count(1, 1), 1);
        assert_eq!(level_count(0, 0), 1);
        assert_eq!(level_count(10, 1000), 5);
    }

    #[test]
    fn test_custom_target() {
        assert_eq!(level_count_with_target(4, 4, 1), 3);
        assert_eq!(level_count_with_target(4, 4, 0), 3);
        assert_eq!(level_count_with_target(1024, 512, 256), 3);
    }

    proptest! {
        #[test]
        fn prop_smallest_level_fits_target(x in 1usize..100_000, y in 1usize..100_000) {
            let levels = level_count(x, y);
            let longest = x.max(y);
            prop_assert!(levels >= 1);
            prop_assert!(longest >> (levels - 1) <= TARGET_SIZE);
            if levels > 1 {
                prop_assert!(longest >> (levels - 2) > TARGET_SIZE);
            }
        }
    }
}
