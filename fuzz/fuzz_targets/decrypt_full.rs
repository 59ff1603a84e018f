#![no_main]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bastion_envelope::{
    accept_user_secret, Algorithm, EncryptedArtifact, Engine, Error, KdfParams, KeyMaterial,
};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static KEY: Lazy<KeyMaterial> = Lazy::new(|| {
    KeyMaterial::symmetric(Algorithm::Aes, accept_user_secret("fuzz").unwrap()).unwrap()
});

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the label; the rest is the raw payload.
    let algorithm = if data[0] & 1 == 0 { Algorithm::Aes } else { Algorithm::Des };
    let artifact = EncryptedArtifact::new(
        STANDARD.encode(&data[1..]),
        algorithm,
        "",
        0,
        chrono::Utc::now(),
    );

    let engine = Engine::with_kdf_params(KdfParams::insecure_fast());
    match engine.decrypt(&artifact, &KEY) {
        Ok(_) | Err(Error::DecryptionFailed) => {}
        Err(e) => panic!("non-uniform error: {e:?}"),
    }
});
