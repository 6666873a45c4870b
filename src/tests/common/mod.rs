// src/tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::{CacheKey, InMemoryTokenCache, TokenCache};
use crate::errors::CacheError;
use crate::token::{Fingerprint, IssuedToken, ProofKeyType, TokenReference, TokenRequirement, TrustRequest};
use crate::transport::{
    IssuedTokenEntry, Lifetime, ProofTokenEntry, ProtocolTransport, TransportError, TrustResponse,
};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn svc_requirement() -> TokenRequirement {
    TokenRequirement::new("https://svc.example", ProofKeyType::Bearer, "saml2").unwrap()
}

pub fn fingerprint_of(requirement: &TokenRequirement) -> Fingerprint {
    requirement.to_trust_request().unwrap().fingerprint()
}

pub fn token_between(id: &str, valid_from: DateTime<Utc>, valid_to: DateTime<Utc>) -> IssuedToken {
    IssuedToken::new(format!("payload-{}", id), TokenReference::new(id), valid_from, valid_to).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerBehavior {
    /// token without lifetime element
    Issue,
    /// lifetime [now, now + secs]
    IssueFor(i64),
    IssueWithProof,
    Fail,
    Hang,
    Empty,
    WrongContext,
}

/// In-process issuer: numbers tokens `token-1`, `token-2`, ... and counts calls.
#[derive(Debug)]
pub struct MockTransport {
    behavior: Mutex<IssuerBehavior>,
    calls: AtomicUsize,
    cancels: AtomicUsize,
}

impl MockTransport {
    pub fn new(behavior: IssuerBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: IssuerBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    fn behavior(&self) -> IssuerBehavior {
        *self.behavior.lock().unwrap()
    }
}

fn entry(n: usize) -> IssuedTokenEntry {
    IssuedTokenEntry {
        requested_security_token: Some(format!("token-{}", n)),
        requested_attached_reference: Some(format!("ref-{}", n)),
        ..Default::default()
    }
}

impl ProtocolTransport for MockTransport {
    async fn issue(&self, request: &TrustRequest) -> Result<TrustResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let context = Some(request.context().to_owned());

        match self.behavior() {
            IssuerBehavior::Issue => Ok(TrustResponse { context, entries: vec![entry(n)] }),
            IssuerBehavior::IssueFor(secs) => {
                let now = Utc::now();
                let lifetime = Lifetime {
                    created: Some(now),
                    expires: Some(now + TimeDelta::seconds(secs)),
                };
                let entry = IssuedTokenEntry { lifetime: Some(lifetime), ..entry(n) };
                Ok(TrustResponse { context, entries: vec![entry] })
            }
            IssuerBehavior::IssueWithProof => {
                let entry = IssuedTokenEntry {
                    requested_proof_token: Some(ProofTokenEntry {
                        binary_secret: "c2VjcmV0".to_owned(),
                    }),
                    ..entry(n)
                };
                Ok(TrustResponse { context, entries: vec![entry] })
            }
            IssuerBehavior::Fail => Err(TransportError::Status(503)),
            IssuerBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Request("hung issuer woke up".to_owned()))
            }
            IssuerBehavior::Empty => Ok(TrustResponse { context, entries: vec![] }),
            IssuerBehavior::WrongContext => Ok(TrustResponse {
                context: Some("urn:uuid:someone-else".to_owned()),
                entries: vec![entry(n)],
            }),
        }
    }

    async fn cancel(&self, _token: &IssuedToken) -> Result<(), TransportError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache whose backend is always down.
#[derive(Debug, Default)]
pub struct FailingCache {
    pub operations: AtomicUsize,
}

impl TokenCache for FailingCache {
    async fn get(&self, _fingerprint: &Fingerprint) -> Result<Option<IssuedToken>, CacheError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("backend down".to_owned()))
    }

    async fn put(&self, _fingerprint: Fingerprint, _token: IssuedToken) -> Result<(), CacheError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("backend down".to_owned()))
    }

    async fn remove(&self, _key: CacheKey<'_>) -> Result<bool, CacheError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("backend down".to_owned()))
    }
}

/// In-memory cache that counts every operation.
#[derive(Debug, Default)]
pub struct RecordingCache {
    pub inner: InMemoryTokenCache,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub removes: AtomicUsize,
}

impl RecordingCache {
    pub fn operations(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.puts.load(Ordering::SeqCst)
            + self.removes.load(Ordering::SeqCst)
    }
}

impl TokenCache for RecordingCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<IssuedToken>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(fingerprint).await
    }

    async fn put(&self, fingerprint: Fingerprint, token: IssuedToken) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(fingerprint, token).await
    }

    async fn remove(&self, key: CacheKey<'_>) -> Result<bool, CacheError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}
