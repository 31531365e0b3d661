#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tuner_core::{vehicle_manifest, InMemoryHost, TunerConfig, TunerSession};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// A fresh, empty profile directory unique to this test process and call.
pub fn scratch_profile_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tuner_it_{}_{}_{}",
        name,
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

pub fn demo_session(profile_dir: &Path) -> (InMemoryHost, TunerSession) {
    let host = InMemoryHost::vehicle_demo();
    let session = TunerSession::new(
        &vehicle_manifest(),
        Arc::new(host.clone()),
        profile_dir,
        Arc::new(TunerConfig::default()),
    );
    (host, session)
}
