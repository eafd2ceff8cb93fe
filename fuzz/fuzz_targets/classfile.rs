#![no_main]

use std::sync::{Arc, OnceLock};

use classreader::{ClassFileReader, ReaderConfig, Runtime};
use libfuzzer_sys::fuzz_target;

static READER: OnceLock<ClassFileReader> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let reader = READER.get_or_init(|| {
        ClassFileReader::new(Arc::new(Runtime::new()), ReaderConfig::permissive())
    });

    if let Ok(expected) = reader.runtime().type_for_class_name("Fuzz") {
        let _ = reader.read_class(expected, data);
    }
});
