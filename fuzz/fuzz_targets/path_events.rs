#![no_main]
use libfuzzer_sys::fuzz_target;
use pathxml::{build, parse, MapBuilder};

fuzz_target!(|data: &[u8]| {
    let mut open = 0usize;
    for event in parse(data) {
        let Ok(event) = event else { break };
        if event.is_start() {
            open += 1;
        } else if event.is_end() {
            assert!(open > 0, "end without start at {}", event.path);
            open -= 1;
        }
    }
    let _ = build::<MapBuilder, _>(parse(data));
});
