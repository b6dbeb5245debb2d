//! # Enclave Endpoint
//!
//! Trusted side of the boundary. The untrusted side reaches verifier
//! instances only through handles and only through the calls below, each of
//! which answers with a `BoundaryStatus`. The trusted side reaches the host
//! through [`HostProxy`], which copies every host-allocated buffer and then
//! releases it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::buffer::Domain;
use super::channel::BoundaryChannel;
use super::handle::{BoundaryHandle, HandleTable};
use super::host::{decode_receipts_list, HostEndpoint};
use crate::domain::{BlockHeight, BoundaryStatus, RelayError, TxHash};
use crate::ports::outbound::BlockVerifier;
use crate::trusted::{HostServices, ReceiptsRootCalculator, TrustedVerifier, VerifiedBlockSink};

/// Host calls as seen from inside the trusted domain.
pub struct HostProxy {
    host: Arc<HostEndpoint>,
    relay: BoundaryHandle,
}

impl HostProxy {
    /// Proxy for the relay registered on `host` under `relay`.
    pub fn new(host: Arc<HostEndpoint>, relay: BoundaryHandle) -> Self {
        Self { host, relay }
    }
}

#[async_trait]
impl HostServices for HostProxy {
    async fn receipts_by_height(&self, height: BlockHeight) -> Result<Vec<Vec<u8>>, RelayError> {
        let buffer = self.host.get_receipts_by_height(self.relay, height).await?;
        let bytes = self.host.arena().take(buffer, Domain::Trusted)?;
        decode_receipts_list(&bytes)
    }

    async fn latest_height(&self) -> Result<BlockHeight, RelayError> {
        Ok(self.host.get_latest_height(self.relay).await?)
    }

    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        Ok(self.host.send_raw_transaction(self.relay, raw_txn).await?)
    }
}

/// Trusted-side call table.
pub struct EnclaveEndpoint {
    handles: HandleTable<TrustedVerifier>,
    instances: Mutex<HashMap<BoundaryHandle, Arc<TrustedVerifier>>>,
    channel: BoundaryChannel,
}

impl Default for EnclaveEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl EnclaveEndpoint {
    /// Endpoint with no verifier instances.
    pub fn new() -> Self {
        Self {
            handles: HandleTable::new(),
            instances: Mutex::new(HashMap::new()),
            channel: BoundaryChannel::new("enclave"),
        }
    }

    /// Init: create a verifier instance that calls back into `relay` on
    /// `host`.
    pub fn init(
        &self,
        host: Arc<HostEndpoint>,
        relay: BoundaryHandle,
        roots: Arc<dyn ReceiptsRootCalculator>,
        sink: Arc<dyn VerifiedBlockSink>,
        receipt_rate: f64,
    ) -> Result<BoundaryHandle, BoundaryStatus> {
        let proxy = Arc::new(HostProxy::new(host, relay));
        let verifier = TrustedVerifier::new(proxy, roots, sink, receipt_rate)
            .map_err(|_| BoundaryStatus::InvalidParameter)?;
        let verifier = Arc::new(verifier);
        let handle = self.handles.register(&verifier);
        self.instances.lock().insert(handle, verifier);
        info!("[enclave] Verifier {} initialized (relay {})", handle, relay);
        Ok(handle)
    }

    /// Tear down a verifier instance. Later calls on `handle` answer
    /// `InvalidHandle`.
    pub fn destroy(&self, handle: BoundaryHandle) -> BoundaryStatus {
        self.handles.revoke(handle);
        match self.instances.lock().remove(&handle) {
            Some(_) => {
                debug!("[enclave] Verifier {} destroyed", handle);
                BoundaryStatus::Success
            }
            None => BoundaryStatus::InvalidHandle,
        }
    }

    /// Live verifier instances.
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// PushHeader: the header bytes are copied before use.
    pub async fn push_header(&self, handle: BoundaryHandle, header: &[u8]) -> BoundaryStatus {
        let header = header.to_vec();
        let result = self
            .channel
            .call("push_header", async {
                let verifier = self.handles.resolve(handle)?;
                verifier.append_block(&header).await.map(|_| ())
            })
            .await;
        result.err().unwrap_or(BoundaryStatus::Success)
    }

    /// Change the sampling rate of the instance behind `handle`. A rate
    /// outside `[0, 1]` is `InvalidParameter`.
    pub async fn set_receipt_rate(&self, handle: BoundaryHandle, rate: f64) -> BoundaryStatus {
        let result = self
            .channel
            .call("set_receipt_rate", async {
                let verifier = self.handles.resolve(handle)?;
                verifier
                    .set_receipt_rate(rate)
                    .map_err(|_| RelayError::Boundary(BoundaryStatus::InvalidParameter))
            })
            .await;
        result.err().unwrap_or(BoundaryStatus::Success)
    }

    /// SendRawTransaction issued from the trusted side; answers with the
    /// fixed-size transaction hash.
    pub async fn send_raw_transaction(
        &self,
        handle: BoundaryHandle,
        raw_txn: &[u8],
    ) -> Result<TxHash, BoundaryStatus> {
        let raw_txn = raw_txn.to_vec();
        self.channel
            .call("send_raw_transaction", async {
                let verifier = self.handles.resolve(handle)?;
                verifier.send_raw_transaction(&raw_txn).await
            })
            .await
    }
}

/// Untrusted-side stand-in for one verifier instance.
///
/// Dropping it destroys the instance behind the boundary.
pub struct EnclaveVerifier {
    enclave: Arc<EnclaveEndpoint>,
    handle: BoundaryHandle,
}

impl EnclaveVerifier {
    /// Wrap the instance `handle` of `enclave`.
    pub fn new(enclave: Arc<EnclaveEndpoint>, handle: BoundaryHandle) -> Self {
        Self { enclave, handle }
    }

    /// Handle of the wrapped instance.
    pub fn handle(&self) -> BoundaryHandle {
        self.handle
    }

    /// Change the receipt sampling rate of the wrapped instance.
    pub async fn set_receipt_rate(&self, rate: f64) -> Result<(), RelayError> {
        self.enclave
            .set_receipt_rate(self.handle, rate)
            .await
            .into_result()
            .map_err(RelayError::Boundary)
    }

    /// Submit a transaction from inside the trusted domain.
    pub async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        Ok(self.enclave.send_raw_transaction(self.handle, raw_txn).await?)
    }
}

#[async_trait]
impl BlockVerifier for EnclaveVerifier {
    async fn recv_block(&self, header: Vec<u8>) -> Result<(), RelayError> {
        self.enclave
            .push_header(self.handle, &header)
            .await
            .into_result()
            .map_err(RelayError::Boundary)
    }
}

impl Drop for EnclaveVerifier {
    fn drop(&mut self) {
        self.enclave.destroy(self.handle);
    }
}
