//! # Store Benchmarks
//!
//! Write and listing throughput of the redb-backed catalog.
//!
//! Run with: `cargo bench -p educa-core`

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use educa_core::{Course, ItemBody, NewCourse, NewItem, NewModule, Role, Store, User};
use std::hint::black_box;

/// In-memory store with one instructor and one empty course.
fn setup() -> (Store, User, Course) {
    let store = Store::in_memory().expect("store");
    let instructor = store
        .create_user("bench", "bench-pass-1", Role::Instructor)
        .expect("user");
    let subject = store.create_subject("Bench", None).expect("subject");
    let course = store
        .create_course(
            instructor.id,
            NewCourse {
                subject: subject.id,
                title: "Bench course".to_string(),
                slug: None,
                overview: String::new(),
            },
        )
        .expect("course");
    (store, instructor, course)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_module_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("module_append");

    for size in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                setup,
                |(store, instructor, course)| {
                    for i in 0..size {
                        store
                            .add_module(
                                instructor.id,
                                course.id,
                                NewModule {
                                    title: format!("Module {i}"),
                                    ..NewModule::default()
                                },
                            )
                            .expect("module");
                    }
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_contents_listing(c: &mut Criterion) {
    let (store, instructor, course) = setup();
    let module = store
        .add_module(
            instructor.id,
            course.id,
            NewModule {
                title: "Listing".to_string(),
                ..NewModule::default()
            },
        )
        .expect("module");
    for i in 0..200 {
        store
            .add_content(
                instructor.id,
                module.id,
                NewItem {
                    title: format!("Item {i}"),
                    body: ItemBody::Text {
                        content: "Lorem ipsum dolor sit amet".to_string(),
                    },
                },
            )
            .expect("content");
    }

    c.bench_function("contents_listing_200", |b| {
        b.iter(|| black_box(store.contents(module.id).expect("list")));
    });
}

fn bench_chat_history(c: &mut Criterion) {
    let (store, instructor, course) = setup();
    for i in 0..500 {
        store
            .append_message(instructor.id, course.id, &format!("message {i}"))
            .expect("message");
    }

    c.bench_function("latest_messages_5_of_500", |b| {
        b.iter(|| black_box(store.latest_messages(course.id, 5).expect("latest")));
    });
}

criterion_group!(
    benches,
    bench_module_append,
    bench_contents_listing,
    bench_chat_history
);
criterion_main!(benches);
