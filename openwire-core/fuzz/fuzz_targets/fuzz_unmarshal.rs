#![no_main]

use libfuzzer_sys::fuzz_target;

use openwire_core::marshal::{marshal, unmarshal};
use openwire_core::protocol::{MAX_VERSION, MIN_VERSION};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let version = MIN_VERSION + u32::from(selector) % MAX_VERSION;

    if let Ok(command) = unmarshal(payload, version) {
        let _ = command.describe();
        let _ = command.clone_data_structure();
        if let Ok(bytes) = marshal(command.as_ref(), version) {
            // NaN properties make value equality unreliable, so only decodability is checked.
            assert!(unmarshal(&bytes, version).is_ok());
        }
    }
});
