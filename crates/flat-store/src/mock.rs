//! # Mock Store & Testing Guide
//!
//! `MockStore` hands out a real [`StoreClient`] whose requests are answered
//! from a queue of expectations instead of by a [`StoreActor`](crate::StoreActor).
//! Use it to drive code that sits *on top of* the store into failure paths the
//! in-memory actor cannot produce on demand (forbidden, internal errors, a
//! parent update that fails after the child was created).
//!
//! | Feature | MockStore | StoreActor |
//! |---------|-----------|------------|
//! | **State** | None (scripted replies) | Real objects |
//! | **Error Injection** | `return_err(..)` | Only natural errors |
//! | **Call inspection** | [`MockStore::calls`] | Logs only |
//!
//! ```rust
//! use flat_store::mock::MockStore;
//! use flat_store::{ObjectStore, StoreError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockStore::new();
//!     mock.expect_get("leaders.orgchart.vmware.org", "abc")
//!         .return_err(StoreError::Internal("etcd timeout".into()));
//!
//!     let client = mock.client();
//!     let err = client.get("leaders.orgchart.vmware.org", "abc").await.unwrap_err();
//!     assert_eq!(err, StoreError::Internal("etcd timeout".into()));
//!     mock.verify();
//! }
//! ```
//!
//! A request that arrives with no matching expectation is answered with
//! [`StoreError::Internal`] and still recorded, so tests can assert that code
//! *didn't* reach the store by checking [`MockStore::calls`] is empty.

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::object::{ListOptions, ObjectList, StoredObject};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Get,
    List,
    Create,
    Update,
    Patch,
    Delete,
}

enum Reply {
    Object(Result<StoredObject, StoreError>),
    List(Result<ObjectList, StoreError>),
    Unit(Result<(), StoreError>),
}

struct Expectation {
    op: Op,
    kind: String,
    name: Option<String>,
    reply: Reply,
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

/// Scripted stand-in for the store actor.
pub struct MockStore {
    client: StoreClient,
    expectations: Queue,
    calls: Arc<Mutex<Vec<String>>>,
    list_options: Arc<Mutex<Vec<ListOptions>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a mock with an empty expectation queue. Must be called inside a
    /// Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest>(100);
        let expectations: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let list_options = Arc::new(Mutex::new(Vec::new()));
        let recorder = calls.clone();
        let options_recorder = list_options.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                recorder.lock().push(request.describe());
                if let StoreRequest::List { options, .. } = &request {
                    options_recorder.lock().push(options.clone());
                }
                let expectation = queue.lock().pop_front();
                answer(request, expectation);
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            calls,
            list_options,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    /// Every request seen so far, as `"<op> <kind>[/<name>]"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Options of every list request seen so far, in arrival order.
    pub fn list_options(&self) -> Vec<ListOptions> {
        self.list_options.lock().clone()
    }

    pub fn expect_get(&mut self, kind: &str, name: &str) -> ObjectExpectationBuilder {
        self.object_builder(Op::Get, kind, Some(name))
    }

    pub fn expect_create(&mut self, kind: &str) -> ObjectExpectationBuilder {
        self.object_builder(Op::Create, kind, None)
    }

    pub fn expect_update(&mut self, kind: &str) -> ObjectExpectationBuilder {
        self.object_builder(Op::Update, kind, None)
    }

    pub fn expect_patch(&mut self, kind: &str, name: &str) -> ObjectExpectationBuilder {
        self.object_builder(Op::Patch, kind, Some(name))
    }

    pub fn expect_list(&mut self, kind: &str) -> ListExpectationBuilder {
        ListExpectationBuilder {
            kind: kind.to_string(),
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_delete(&mut self, kind: &str, name: &str) -> DeleteExpectationBuilder {
        DeleteExpectationBuilder {
            kind: kind.to_string(),
            name: name.to_string(),
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if any expectation is still queued.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    fn object_builder(&mut self, op: Op, kind: &str, name: Option<&str>) -> ObjectExpectationBuilder {
        ObjectExpectationBuilder {
            op,
            kind: kind.to_string(),
            name: name.map(str::to_string),
            expectations: self.expectations.clone(),
        }
    }
}

fn answer(request: StoreRequest, expectation: Option<Expectation>) {
    let described = request.describe();
    let mismatch = |why: &str| StoreError::Internal(format!("mock: {why} for {described}"));

    let Some(exp) = expectation else {
        reply_err(request, mismatch("no expectation queued"));
        return;
    };
    let (op, kind, name) = match &request {
        StoreRequest::Get { kind, name, .. } => (Op::Get, kind, Some(name)),
        StoreRequest::List { kind, .. } => (Op::List, kind, None),
        StoreRequest::Create { kind, .. } => (Op::Create, kind, None),
        StoreRequest::Update { kind, .. } => (Op::Update, kind, None),
        StoreRequest::Patch { kind, name, .. } => (Op::Patch, kind, Some(name)),
        StoreRequest::Delete { kind, name, .. } => (Op::Delete, kind, Some(name)),
    };
    let name_ok = match (&exp.name, name) {
        (Some(want), Some(have)) => want == have,
        _ => true,
    };
    if exp.op != op || &exp.kind != kind || !name_ok {
        let err = mismatch(&format!("expected {:?} {}", exp.op, exp.kind));
        reply_err(request, err);
        return;
    }

    match (request, exp.reply) {
        (StoreRequest::Get { respond_to, .. }, Reply::Object(r))
        | (StoreRequest::Create { respond_to, .. }, Reply::Object(r))
        | (StoreRequest::Update { respond_to, .. }, Reply::Object(r))
        | (StoreRequest::Patch { respond_to, .. }, Reply::Object(r)) => {
            let _ = respond_to.send(r);
        }
        (StoreRequest::List { respond_to, .. }, Reply::List(r)) => {
            let _ = respond_to.send(r);
        }
        (StoreRequest::Delete { respond_to, .. }, Reply::Unit(r)) => {
            let _ = respond_to.send(r);
        }
        (request, _) => reply_err(request, StoreError::Internal("mock: reply shape mismatch".into())),
    }
}

fn reply_err(request: StoreRequest, err: StoreError) {
    match request {
        StoreRequest::Get { respond_to, .. }
        | StoreRequest::Create { respond_to, .. }
        | StoreRequest::Update { respond_to, .. }
        | StoreRequest::Patch { respond_to, .. } => {
            let _ = respond_to.send(Err(err));
        }
        StoreRequest::List { respond_to, .. } => {
            let _ = respond_to.send(Err(err));
        }
        StoreRequest::Delete { respond_to, .. } => {
            let _ = respond_to.send(Err(err));
        }
    }
}

/// Builder for expectations answered with a [`StoredObject`].
pub struct ObjectExpectationBuilder {
    op: Op,
    kind: String,
    name: Option<String>,
    expectations: Queue,
}

impl ObjectExpectationBuilder {
    pub fn return_ok(self, object: StoredObject) {
        self.push(Ok(object));
    }

    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, reply: Result<StoredObject, StoreError>) {
        self.expectations.lock().push_back(Expectation {
            op: self.op,
            kind: self.kind,
            name: self.name,
            reply: Reply::Object(reply),
        });
    }
}

/// Builder for `list` expectations.
pub struct ListExpectationBuilder {
    kind: String,
    expectations: Queue,
}

impl ListExpectationBuilder {
    pub fn return_ok(self, page: ObjectList) {
        self.push(Ok(page));
    }

    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, reply: Result<ObjectList, StoreError>) {
        self.expectations.lock().push_back(Expectation {
            op: Op::List,
            kind: self.kind,
            name: None,
            reply: Reply::List(reply),
        });
    }
}

/// Builder for `delete` expectations.
pub struct DeleteExpectationBuilder {
    kind: String,
    name: String,
    expectations: Queue,
}

impl DeleteExpectationBuilder {
    pub fn return_ok(self) {
        self.push(Ok(()));
    }

    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, reply: Result<(), StoreError>) {
        self.expectations.lock().push_back(Expectation {
            op: Op::Delete,
            kind: self.kind,
            name: Some(self.name),
            reply: Reply::Unit(reply),
        });
    }
}
