//! Concurrent reads against one shared runtime.

mod common;

use std::{sync::Arc, thread};

use classreader::{ClassFileReader, ReaderConfig, Runtime};
use common::*;

fn class_with_shared_refs(name: &str) -> Vec<u8> {
    let mut builder = ClassBuilder::new(name).with_interface("java/lang/Runnable");
    builder.pool.string("shared constant");
    builder.pool.method_ref("java/lang/Object", "<init>", "()V");
    builder.build()
}

#[test]
fn batch_read_shares_ids() {
    let reader = reader();
    let names: Vec<String> = (0..32).map(|i| format!("pkg/Widget{i}")).collect();
    let files: Vec<Vec<u8>> = names.iter().map(|n| class_with_shared_refs(n)).collect();
    let batch: Vec<_> = names
        .iter()
        .zip(&files)
        .map(|(name, data)| {
            let expected = reader.runtime().type_for_class_name(name).unwrap();
            (expected, data.as_slice())
        })
        .collect();

    let results = reader.read_classes(&batch);
    assert_eq!(results.len(), 32);

    let descriptors: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    for (descriptor, name) in descriptors.iter().zip(&names) {
        assert_eq!(descriptor.name(), name);
    }

    let first = &descriptors[0];
    for other in &descriptors[1..] {
        assert_eq!(first.super_type.as_ref().unwrap().id, other.super_type.as_ref().unwrap().id);
        assert_eq!(first.interfaces[0].id, other.interfaces[0].id);
    }
}

#[test]
fn one_failure_does_not_poison_the_batch() {
    let reader = reader();
    let good = ClassBuilder::new("pkg/Good").build();
    let bad = ClassBuilder::new("pkg/Bad").with_magic(0).build();
    let batch = [
        (reader.runtime().type_for_class_name("pkg/Good").unwrap(), good.as_slice()),
        (reader.runtime().type_for_class_name("pkg/Bad").unwrap(), bad.as_slice()),
    ];

    let results = reader.read_classes(&batch);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(classreader::Error::BadMagic(0))));
}

#[test]
fn threads_converge_on_one_literal() {
    let runtime = Arc::new(Runtime::new());
    let reader = Arc::new(ClassFileReader::new(runtime.clone(), ReaderConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let reader = reader.clone();
            thread::spawn(move || {
                let name = format!("pkg/Thread{i}");
                let mut builder = ClassBuilder::new(&name);
                let index = builder.pool.string("shared constant");
                let expected = reader.runtime().type_for_class_name(&name).unwrap();
                let descriptor = reader.read_class(expected, &builder.build()).unwrap();
                descriptor.constant_pool.literal_offset(index).unwrap()
            })
        })
        .collect();

    let offsets: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(offsets.windows(2).all(|w| w[0] == w[1]));
}
