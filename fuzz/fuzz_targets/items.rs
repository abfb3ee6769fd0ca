#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the path depth, the rest is the document.
    let Some((&depth, doc)) = data.split_first() else { return };
    let path = ["a", "b", "c", "d"]
        .iter()
        .take(usize::from(depth % 4) + 1)
        .copied()
        .collect::<Vec<_>>()
        .join(".");
    for item in pathxml::items(doc, &path) {
        if item.is_err() {
            break;
        }
    }
});
