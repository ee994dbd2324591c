#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Cache entries are read back from disk: any byte sequence must either
    // decode into a plane or fail with an error, never panic.
    if let Ok(plane) = ngff_export::cache::npy::read_plane(&mut Cursor::new(data)) {
        let mut encoded = Vec::new();
        ngff_export::cache::npy::write_plane(&mut encoded, &plane).unwrap();
        let decoded = ngff_export::cache::npy::read_plane(&mut Cursor::new(&encoded)).unwrap();
        assert_eq!(decoded.shape(), plane.shape());
        assert_eq!(decoded.pixel_type(), plane.pixel_type());
    }
});
