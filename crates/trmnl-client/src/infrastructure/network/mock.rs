//! Scripted connector for tests.
//!
//! `ScriptedConnector` never touches the network.  Each `connect` call pops
//! the next scripted outcome: either a [`ScriptedSink`] that replays a fixed
//! chunk sequence, or a refused connection.  Every request is recorded so
//! tests can assert how many connections were opened and with what timeout.
//!
//! # Usage in tests
//!
//! ```
//! use std::time::Duration;
//! use trmnl_client::application::fetch_image::{Connector, Endpoint};
//! use trmnl_client::infrastructure::network::mock::ScriptedConnector;
//! use trmnl_core::protocol::ScriptedSink;
//!
//! let connector = ScriptedConnector::new()
//!     .serve(ScriptedSink::new().bytes(vec![1, 2, 3]))
//!     .refuse();
//! let endpoint = Endpoint::new("10.0.1.26", 1337);
//!
//! assert!(connector.connect(&endpoint, Duration::from_secs(1)).is_ok());
//! assert!(connector.connect(&endpoint, Duration::from_secs(1)).is_err());
//! assert_eq!(connector.attempts(), 2);
//! ```

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use trmnl_core::protocol::ScriptedSink;

use crate::application::fetch_image::{ConnectError, Connector, Endpoint};

/// A connector that replays scripted connection outcomes.
///
/// Once the script is exhausted every further attempt is refused.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Option<ScriptedSink>>>,
    requests: Mutex<Vec<(Endpoint, Duration)>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful connection that delivers `sink`'s script.
    pub fn serve(self, sink: ScriptedSink) -> Self {
        self.push(Some(sink));
        self
    }

    /// Appends a refused connection attempt.
    pub fn refuse(self) -> Self {
        self.push(None);
        self
    }

    /// Number of `connect` calls so far.
    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Endpoint and timeout of every `connect` call, in order.
    pub fn requests(&self) -> Vec<(Endpoint, Duration)> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, outcome: Option<ScriptedSink>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }
}

impl Connector for ScriptedConnector {
    type Sink = ScriptedSink;

    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<ScriptedSink, ConnectError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint.clone(), timeout));

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten();

        next.ok_or_else(|| ConnectError::Failed {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, endpoint.port)),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        })
    }
}
