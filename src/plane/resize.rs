//! Order-0 halving used to derive each pyramid level from the one above it.
//!
//! Every output pixel copies exactly one input pixel, so label images keep
//! their label values and no new values are introduced.

use super::{map_plane_data, Plane};

/// Extent of a spatial dimension at the next level: floor(n / 2), at least 1.
pub fn halved_extent(extent: usize) -> usize {
    (extent / 2).max(1)
}

/// Nearest source coordinate for `dst` when resampling `src_len` onto `dst_len`
/// samples: floor((dst + 0.5) * src_len / dst_len), clamped to the source.
fn source_coordinate(dst: usize, src_len: usize, dst_len: usize) -> usize {
    ((2 * dst + 1) * src_len / (2 * dst_len)).min(src_len - 1)
}

fn select_nearest<T: Copy>(
    src: &[T],
    src_height: usize,
    src_width: usize,
    dst_height: usize,
    dst_width: usize,
) -> Vec<T> {
    let columns: Vec<usize> = (0..dst_width)
        .map(|x| source_coordinate(x, src_width, dst_width))
        .collect();

    let mut out = Vec::with_capacity(dst_height * dst_width);
    for y in 0..dst_height {
        let row_start = source_coordinate(y, src_height, dst_height) * src_width;
        let row = &src[row_start..row_start + src_width];
        out.extend(columns.iter().map(|&x| row[x]));
    }
    out
}

/// Halve both spatial dimensions of `plane` with nearest-neighbour selection.
///
/// The element type is preserved and no smoothing is applied.
pub fn halve(plane: &Plane) -> Plane {
    let (height, width) = plane.shape();
    let (out_height, out_width) = (halved_extent(height), halved_extent(width));
    let data = map_plane_data!(plane.data(), buf => {
        select_nearest(buf, height, width, out_height, out_width)
    });
    Plane {
        height: out_height,
        width: out_width,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::PixelType;
    use proptest::prelude::*;

    #[test]
    fn test_halved_extent() {
        assert_eq!(halved_extent(512), 256);
        assert_eq!(halved_extent(97), 48);
        assert_eq!(halved_extent(3), 1);
        assert_eq!(halved_extent(1), 1);
    }

    #[test]
    fn test_halve_even_plane_picks_odd_samples() {
        // 4x4 ramp: value = 10 * y + x
        let values: Vec<u16> = (0..4).flat_map(|y| (0..4).map(move |x| 10 * y + x)).collect();
        let plane = Plane::from_elements(4, 4, values).unwrap();

        let half = halve(&plane);
        assert_eq!(half.shape(), (2, 2));
        assert_eq!(half.as_slice::<u16>().unwrap(), &[11, 13, 31, 33]);
    }

    #[test]
    fn test_halve_odd_plane() {
        let values: Vec<u8> = (0..15).collect();
        let plane = Plane::from_elements(3, 5, values).unwrap();

        let half = halve(&plane);
        assert_eq!(half.shape(), (1, 2));
        // row floor(0.5 * 3) = 1, columns floor(0.5 * 2.5) = 1 and floor(1.5 * 2.5) = 3
        assert_eq!(half.as_slice::<u8>().unwrap(), &[6, 8]);
    }

    #[test]
    fn test_halve_single_pixel_row() {
        let plane = Plane::from_elements(1, 4, vec![1.5f32, 2.5, 3.5, 4.5]).unwrap();
        let half = halve(&plane);
        assert_eq!(half.shape(), (1, 2));
        assert_eq!(half.pixel_type(), PixelType::Float32);
        assert_eq!(half.as_slice::<f32>().unwrap(), &[2.5, 4.5]);
    }

    proptest! {
        #[test]
        fn prop_constant_plane_stays_constant(
            height in 1usize..64,
            width in 1usize..64,
            value in any::<i16>(),
        ) {
            let plane = Plane::filled(height, width, value).unwrap();
            let half = halve(&plane);
            prop_assert_eq!(half.shape(), (halved_extent(height), halved_extent(width)));
            prop_assert!(half.as_slice::<i16>().unwrap().iter().all(|&v| v == value));
        }

        #[test]
        fn prop_halving_only_selects_existing_values(
            height in 1usize..40,
            width in 1usize..40,
        ) {
            let values: Vec<u32> = (0..(height * width) as u32).collect();
            let plane = Plane::from_elements(height, width, values).unwrap();
            let half = halve(&plane);
            let len = (height * width) as u32;
            prop_assert!(half.as_slice::<u32>().unwrap().iter().all(|&v| v < len));
        }
    }
}
