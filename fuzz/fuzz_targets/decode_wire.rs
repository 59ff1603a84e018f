#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(parts) = bastion_envelope::wire::decode_wire(data) {
        assert_eq!(parts.prefix.len() + parts.body.len(), data.len());
    }
});
