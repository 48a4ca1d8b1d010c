#![no_main]

use lexfuzz_core::fragment::FragmentGenerator;
use lexfuzz_core::rng::FuzzRng;
use lexfuzz_core::sample::SampleBuilder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 11 {
        return;
    }

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&data[..8]);
    let max_length = u16::from_le_bytes([data[8], data[9]]) as usize % 4096 + 1;
    let use_unicode = data[10] & 1 == 1;

    let generator = FragmentGenerator::with_unicode(use_unicode);
    let mut rng = FuzzRng::from_seed(u64::from_le_bytes(seed));
    let sample = SampleBuilder::new(max_length).build_random(&generator, &mut rng);

    assert!(sample.len() <= max_length);
});
