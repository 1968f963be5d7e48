#![no_main]

use confdefine::define::{MetaChars, ScanOutcome, find_all, find_next};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let mut pos = 0;
        let mut found = 0;
        while let ScanOutcome::Found(var) = find_next(text, pos, MetaChars::default()) {
            assert!(var.end() <= text.len());
            pos = var.end();
            found += 1;
        }
        assert_eq!(find_all(text, MetaChars::default()).len(), found);
    }
});
