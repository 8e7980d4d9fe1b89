#![allow(dead_code)]

pub mod fixtures;
pub mod transport;

use std::sync::Arc;

use impress_pids::{Creator, InMemoryPidStore, PidManager, PidStore, PidsConfig, Record};

use transport::ScriptedTransport;

/// Install a test subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub manager: PidManager,
    pub store: Arc<InMemoryPidStore>,
    pub transport: Arc<ScriptedTransport>,
}

pub fn harness_with(config: &PidsConfig, transport: ScriptedTransport) -> Harness {
    init_tracing();
    let store = Arc::new(InMemoryPidStore::new());
    let transport = Arc::new(transport);
    let manager = PidManager::from_config(
        config,
        store.clone() as Arc<dyn PidStore>,
        transport.clone(),
    )
    .expect("test configuration builds a manager");
    Harness {
        manager,
        store,
        transport,
    }
}

/// Manager over the `pids.toml` fixture with a deposit endpoint that succeeds
pub fn harness() -> Harness {
    harness_with(&fixtures::load_config("pids.toml"), ScriptedTransport::success())
}

pub fn draft(id: &str) -> Record {
    Record::draft(id, "Ocean temperatures 1990-2020")
        .with_publisher("Impress Data")
        .with_creator(Creator::person("Ada", "Lovelace"))
        .with_publication_date("2024-03-01")
}
