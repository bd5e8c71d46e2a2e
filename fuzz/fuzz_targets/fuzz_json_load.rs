#![no_main]

use libfuzzer_sys::fuzz_target;
use xkeystore::key_management::container;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(contents) = container::read_json(text) {
            // Whatever parses must render and parse back to the same contents
            let rendered = container::write_json(&contents).unwrap();
            let reparsed = container::read_json(&rendered).unwrap();
            assert_eq!(reparsed.salt, contents.salt);
            assert_eq!(reparsed.store, contents.store);

            // Both forms accept the same aliases
            let zipped = container::write_container(&contents).unwrap();
            let unzipped = container::read_container(&mut zipped.as_slice()).unwrap();
            assert_eq!(unzipped, contents);
        }
    }
});
