#![no_main]

use flagger_interactions::{ComponentId, MAX_COMPONENT_ID_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Some(decoded) = ComponentId::decode(&raw) else {
        return;
    };
    if let Ok(encoded) = decoded.encode() {
        assert!(encoded.chars().count() <= MAX_COMPONENT_ID_LEN);
        assert_eq!(ComponentId::decode(&encoded), Some(decoded));
    }
});
