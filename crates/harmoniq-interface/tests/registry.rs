mod common;

use std::collections::HashSet;
use std::io;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{context, counting_factory, LoaderEvent, MockLoader};
use harmoniq_interface::{Environment, InterfaceContext, InterfaceError, InterfaceSettings};
use harmoniq_playlist::{Playlist, PlaylistError};
use pretty_assertions::assert_eq;

#[test]
fn created_interfaces_are_listed_most_recent_first() {
    let loader = MockLoader::new(&["a", "b", "c"]);
    let context = context(&loader);

    let a = context.create("a").unwrap();
    let b = context.create("b").unwrap();
    let c = context.create("c{opt=1}").unwrap();

    assert_eq!(context.len(), 3);
    assert_eq!(context.interface_ids(), vec![c, b, a]);
    assert_eq!(context.module_name(c).as_deref(), Some("c"));
    let unique: HashSet<_> = context.interface_ids().into_iter().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn unknown_module_leaves_registry_unchanged() {
    let loader = MockLoader::new(&["a"]);
    let context = context(&loader);
    let a = context.create("a").unwrap();

    assert_eq!(
        context.create("missing"),
        Err(InterfaceError::NoSuitableModule)
    );
    assert_eq!(context.interface_ids(), vec![a]);
    assert_eq!(loader.loaded(), 1);
}

#[test]
fn destroy_all_unloads_each_interface_once_in_reverse_order() {
    let loader = MockLoader::new(&["a", "b", "c"]);
    let context = context(&loader);
    let a = context.create("a").unwrap();
    let b = context.create("b").unwrap();
    let c = context.create("c").unwrap();

    assert_eq!(context.destroy_all(), 3);
    assert_eq!(loader.unloaded(), vec![c, b, a]);
    assert!(context.is_empty());

    assert_eq!(context.destroy_all(), 0);
    assert_eq!(loader.unloaded().len(), 3);
}

#[test]
fn destroy_all_on_empty_registry_is_a_no_op() {
    let loader = MockLoader::new(&[]);
    let context = context(&loader);
    assert_eq!(context.destroy_all(), 0);
    assert!(loader.events().is_empty());
}

#[test]
fn dropping_the_context_stops_remaining_interfaces() {
    let loader = MockLoader::new(&["a", "b"]);
    let context = context(&loader);
    let a = context.create("a").unwrap();
    let b = context.create("b").unwrap();

    drop(context);
    assert_eq!(
        loader.events()[2..].to_vec(),
        vec![
            LoaderEvent::Unloaded(b, "b".into()),
            LoaderEvent::Unloaded(a, "a".into()),
        ]
    );
}

#[test]
fn playlist_is_built_once_across_threads() {
    let loader = MockLoader::new(&[]);
    let created = Arc::new(AtomicUsize::new(0));
    let context = InterfaceContext::builder(loader.clone())
        .name("shared")
        .playlist_factory(counting_factory(&created))
        .build();

    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| context.playlist() as *const _ as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(context.playlist().owner(), "shared");
}

#[test]
fn playlist_outlives_interface_teardown() {
    let loader = MockLoader::new(&["a"]);
    let created = Arc::new(AtomicUsize::new(0));
    let context = InterfaceContext::builder(loader.clone())
        .playlist_factory(counting_factory(&created))
        .environment(Environment::default)
        .build();

    context.create("a").unwrap();
    context.playlist().enqueue("file:///music/track.flac", None);
    context.destroy_all();

    assert_eq!(context.playlist().len(), 1);
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_creates_are_all_registered() {
    let loader = MockLoader::new(&["a"]);
    let context = context(&loader);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..10 {
                    context.create("a").unwrap();
                }
            });
        }
    });

    let ids = context.interface_ids();
    assert_eq!(ids.len(), 80);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 80);
    assert_eq!(context.destroy_all(), 80);
    assert_eq!(loader.unloaded().len(), 80);
}

#[test]
fn secondary_interface_failures_are_skipped() {
    let loader = MockLoader::new(&["default", "b"]);
    let context = context(&loader);
    let settings = InterfaceSettings {
        primary: None,
        extra: vec!["missing".into(), "b".into()],
        control: vec!["other".into()],
    };

    let started = context.start_interfaces(&settings).unwrap();
    assert_eq!(started.len(), 2);
    assert_eq!(context.module_name(started[0]).as_deref(), Some("default"));
    assert_eq!(context.module_name(started[1]).as_deref(), Some("b"));
}

#[test]
fn primary_interface_failure_is_reported() {
    let loader = MockLoader::new(&["b"]);
    let context = context(&loader);
    let settings = InterfaceSettings {
        primary: Some("missing".into()),
        extra: vec!["b".into()],
        control: Vec::new(),
    };

    assert_eq!(
        context.start_interfaces(&settings),
        Err(InterfaceError::NoSuitableModule)
    );
    assert!(context.is_empty());
}

const ABORT_CHILD: &str = "HARMONIQ_PLAYLIST_FAILURE_CHILD";

#[test]
fn playlist_construction_failure_aborts_the_process() {
    if std::env::var_os(ABORT_CHILD).is_some() {
        let loader = MockLoader::new(&[]);
        let context = InterfaceContext::builder(loader)
            .playlist_factory(|_: &str| -> Result<Playlist, PlaylistError> {
                Err(io::Error::new(io::ErrorKind::Other, "storage unavailable").into())
            })
            .build();
        context.playlist();
        return;
    }

    let status = Command::new(std::env::current_exe().unwrap())
        .args([
            "playlist_construction_failure_aborts_the_process",
            "--exact",
            "--test-threads=1",
        ])
        .env(ABORT_CHILD, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}
