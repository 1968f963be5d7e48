#![no_main]

use std::collections::HashMap;
use std::sync::Arc;

use confdefine::config::ConfigCycle;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Parse and substitute arbitrary configuration text
        // We don't care about the result, just that it doesn't panic or hang
        let mut cycle = ConfigCycle::with_environment(Arc::new(HashMap::new()));
        if let Ok(mut tree) = cycle.load_str(text, "fuzz.conf") {
            let _ = cycle.substitute(&mut tree);
        }
    }
});
