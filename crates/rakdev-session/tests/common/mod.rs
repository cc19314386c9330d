//! Shared fixtures: a scripted stand-in for the module and session helpers.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use rakdev_session::{LineTransport, ManualClock, Session, SessionConfig, SessionState};

pub const DEV_EUI: &str = "70B3D57ED0000001";
pub const APP_EUI: &str = "0000000000000000";
pub const APP_KEY: &str = "00112233445566778899AABBCCDDEEFF";
pub const DEV_ADDR: &str = "26011B2C";

#[derive(Default)]
struct Inner {
    incoming: VecDeque<String>,
    sent: Vec<String>,
    /// One-shot replies per command name, used before the defaults.
    scripts: HashMap<String, VecDeque<Vec<String>>>,
    /// Values returned by `AT+<NAME>=?`.
    values: HashMap<String, String>,
}

/// Answers requests the way the module does: `OK` for sets and actions,
/// `AT+<NAME>=<value>` then `OK` for queries.
///
/// Clones share state, so a test keeps one clone to script replies and
/// inspect traffic while the session owns the other.
#[derive(Clone)]
pub struct FakeModule {
    inner: Arc<Mutex<Inner>>,
}

impl FakeModule {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        for (name, value) in [
            ("VER", "4.0.6"),
            ("HWMODEL", "rak3172"),
            ("HWID", "stm32wle5xx"),
            ("SN", "AC1F09FFFE000001"),
            ("APIVER", "3.2.5"),
            ("NJS", "0"),
            ("DEVADDR", DEV_ADDR),
            ("RSSI", "-85"),
            ("SNR", "7"),
            ("ARSSI", "0:-110,1:-112,2:-109"),
            ("LTIME", "04h36m00s on 11/27/2023"),
            ("CFS", "1"),
            ("RECV", "0"),
        ] {
            values.insert(name.to_string(), value.to_string());
        }
        FakeModule {
            inner: Arc::new(Mutex::new(Inner {
                values,
                ..Default::default()
            })),
        }
    }

    /// Reply to the next request for `name` with `lines` instead of the default.
    pub fn script(&self, name: &str, lines: &[&str]) {
        self.inner
            .lock()
            .scripts
            .entry(name.to_string())
            .or_default()
            .push_back(lines.iter().map(|line| line.to_string()).collect());
    }

    pub fn set_value(&self, name: &str, value: &str) {
        self.inner
            .lock()
            .values
            .insert(name.to_string(), value.to_string());
    }

    /// Queue an unsolicited line from the module.
    pub fn push_line(&self, line: &str) {
        self.inner.lock().incoming.push_back(line.to_string());
    }

    /// Requests sent so far, excluding wake pokes.
    pub fn sent(&self) -> Vec<String> {
        self.inner
            .lock()
            .sent
            .iter()
            .filter(|line| !line.is_empty())
            .cloned()
            .collect()
    }

    /// Number of empty wake lines sent.
    pub fn pokes(&self) -> usize {
        self.inner
            .lock()
            .sent
            .iter()
            .filter(|line| line.is_empty())
            .count()
    }

    pub fn clear_sent(&self) {
        self.inner.lock().sent.clear();
    }

    pub fn sent_count(&self, request: &str) -> usize {
        self.sent().iter().filter(|line| *line == request).count()
    }
}

impl LineTransport for FakeModule {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.sent.push(line.to_string());
        let Some(command) = line.strip_prefix("AT+") else {
            return Ok(());
        };
        let (name, argument) = command.split_once('=').unwrap_or((command, ""));

        if let Some(reply) = inner.scripts.get_mut(name).and_then(VecDeque::pop_front) {
            inner.incoming.extend(reply);
            return Ok(());
        }
        if argument == "?" {
            let reply = match inner.values.get(name) {
                Some(value) => vec![format!("AT+{}={}", name, value), "OK".to_string()],
                None => vec!["AT_ERROR".to_string()],
            };
            inner.incoming.extend(reply);
        } else {
            inner.incoming.push_back("OK".to_string());
        }
        Ok(())
    }

    fn read_line(&mut self, _blocking: bool) -> io::Result<Option<String>> {
        Ok(self.inner.lock().incoming.pop_front())
    }

    fn available(&mut self) -> bool {
        !self.inner.lock().incoming.is_empty()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// OTAA on EU868 with short, distinct intervals.
pub fn test_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.identifiers.dev_eui = DEV_EUI.to_string();
    config.identifiers.app_eui = APP_EUI.to_string();
    config.identifiers.app_key = APP_KEY.to_string();
    config.intervals.rejoin_ms = 60_000;
    config.intervals.status_ms = 10_000;
    config.intervals.link_check_ms = 25_000;
    config.intervals.network_time_ms = 600_000;
    config
}

pub fn new_session(config: SessionConfig) -> (Session<FakeModule, ManualClock>, FakeModule, ManualClock) {
    init_tracing();
    let module = FakeModule::new();
    let clock = ManualClock::new();
    let session = Session::new(config, module.clone(), clock.clone());
    (session, module, clock)
}

/// A session that has completed setup and received `+EVT:JOINED`.
pub fn joined_session() -> (Session<FakeModule, ManualClock>, FakeModule, ManualClock) {
    let (mut session, module, clock) = new_session(test_config());
    session.setup().unwrap();
    module.push_line("+EVT:JOINED");
    session.process();
    assert_eq!(session.state(), SessionState::JoinSuccess);
    module.clear_sent();
    (session, module, clock)
}
