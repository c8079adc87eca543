//! End-to-end flows: compile, deploy, persist and operate contracts.

use alloy_primitives::{ChainId, TxHash};
use std::sync::Arc;
use vellum_backend::{
    BackendClient, BackendError, CompileError, CompileRequest, CompiledArtifact, Compiler,
    types::{DeployedContractRef, SaveRequest},
};
use vellum_common::{CanonicalAddress, ErrorKind, Network, network::UnknownNetwork};
use vellum_wallets::{SessionError, WalletSession};

use crate::{
    abi::{AbiRegistry, ContractInvoker},
    deploy::{DeployError, DeploymentHandle, DeploymentOrchestrator},
    envelope::{AuthorizationEnvelopeBuilder, ContextFields, EnvelopeError, Intent},
    tx::TransactionTracker,
};

#[derive(Clone, Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Network(#[from] UnknownNetwork),
    #[error("wallet is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: ChainId, actual: ChainId },
    #[error("contract {0} has not been saved yet")]
    NotPersisted(CanonicalAddress),
}

impl StudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Compile(err) => err.kind(),
            Self::Deploy(err) => err.kind(),
            Self::Envelope(err) => err.kind(),
            Self::Backend(err) => err.kind(),
            Self::Session(err) => err.kind(),
            Self::Network(_) | Self::WrongNetwork { .. } => ErrorKind::WrongNetwork,
            Self::NotPersisted(_) => ErrorKind::NotFound,
        }
    }
}

/// Result of [`Studio::deploy_and_save`].
///
/// The deployment itself succeeded. A failed save leaves the address usable and the
/// reference can be saved again with [`Studio::save_reference`].
#[derive(Clone, Debug)]
pub struct DeploymentOutcome {
    pub contract_address: CanonicalAddress,
    pub transaction_hash: TxHash,
    /// The reference as saved, or as it would have been saved.
    pub reference: DeployedContractRef,
    pub save_error: Option<StudioError>,
}

impl DeploymentOutcome {
    pub fn is_saved(&self) -> bool {
        self.save_error.is_none() && self.reference.is_persisted()
    }
}

/// User-facing operations over one wallet session.
#[derive(Clone)]
pub struct Studio {
    session: Arc<WalletSession>,
    tracker: Arc<TransactionTracker>,
    compiler: Arc<dyn Compiler>,
    backend: BackendClient,
    network: Network,
    deployer: DeploymentOrchestrator,
    envelopes: AuthorizationEnvelopeBuilder,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("backend", self.backend.base_url())
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl Studio {
    pub fn new(
        session: Arc<WalletSession>,
        compiler: Arc<dyn Compiler>,
        backend: BackendClient,
        network: Network,
        confirmations: u64,
    ) -> Result<Self, StudioError> {
        let provider = session.provider()?.clone();
        let tracker = Arc::new(TransactionTracker::with_confirmations(provider, confirmations));
        Ok(Self {
            deployer: DeploymentOrchestrator::new(session.clone(), tracker.clone()),
            envelopes: AuthorizationEnvelopeBuilder::new(session.clone()),
            session,
            tracker,
            compiler,
            backend,
            network,
        })
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        &self.tracker
    }

    /// The network deployments target.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Compiles a source file. Warnings are logged and kept on the artifact.
    pub async fn compile(&self, request: &CompileRequest) -> Result<CompiledArtifact, StudioError> {
        let artifact = self.compiler.compile(request).await?;
        for warning in &artifact.warnings {
            warn!(file = %request.file_name, "{warning}");
        }
        info!(contract = %artifact.contract_name, "compiled");
        Ok(artifact)
    }

    /// Submits a deployment of `artifact` on the configured network.
    pub async fn deploy<S: AsRef<str>>(
        &self,
        artifact: &CompiledArtifact,
        args: &[S],
    ) -> Result<DeploymentHandle, StudioError> {
        Ok(self.deployer.deploy(artifact, args, self.network.chain_id()).await?)
    }

    /// Deploys `artifact`, waits for confirmation, then signs and saves the reference.
    ///
    /// Only deployment failures are errors; a failed save is reported on the outcome. If
    /// the account changed since the deployment was sent, nothing is saved and the outcome
    /// carries [`SessionError::SessionInvalidated`].
    pub async fn deploy_and_save<S: AsRef<str>>(
        &self,
        artifact: &CompiledArtifact,
        args: &[S],
        name: &str,
        description: &str,
    ) -> Result<DeploymentOutcome, StudioError> {
        let handle = self.deploy(artifact, args).await?;
        let address = handle.contract_address().await?;
        handle.wait_for_confirmation().await?;
        let contract_address = CanonicalAddress::from(address);
        info!(%contract_address, hash = %handle.transaction_hash(), "contract deployed");

        let reference = DeployedContractRef {
            contract_address,
            abi: artifact.abi.clone(),
            network: self.network.name().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            contract_name_sol: Some(artifact.contract_name.clone()),
            firestore_id: None,
            created_at: None,
        };

        // the reference is signed by whoever is connected now, which must be the deployer
        let saved = match self.session.revalidate(handle.guard()) {
            Ok(()) => self.save_reference(&reference).await,
            Err(err) => Err(err.into()),
        };
        let (reference, save_error) = match saved {
            Ok(saved) => (saved, None),
            Err(err) => {
                error!(%contract_address, %err, "contract deployed but saving its reference failed");
                (reference, Some(err))
            }
        };
        Ok(DeploymentOutcome {
            contract_address,
            transaction_hash: handle.transaction_hash(),
            reference,
            save_error,
        })
    }

    /// Signs and saves `reference`, returning it with the backend identifier set.
    pub async fn save_reference(
        &self,
        reference: &DeployedContractRef,
    ) -> Result<DeployedContractRef, StudioError> {
        let envelope = self
            .envelopes
            .build(
                Intent::SaveReference,
                &reference.contract_address.to_string(),
                &context(reference),
            )
            .await?;
        let request = SaveRequest { contract_data: reference.clone(), auth: envelope.into_payload() };
        let saved = self.backend.save_reference(&request).await?;
        debug!(id = %saved.firestore_id, "{}", saved.message);

        let mut reference = request.contract_data;
        reference.network = reference.network.to_lowercase();
        reference.firestore_id = Some(saved.firestore_id);
        Ok(reference)
    }

    /// Lists the references owned by the connected account, connecting if needed.
    pub async fn list_contracts(&self) -> Result<Vec<DeployedContractRef>, StudioError> {
        let owner = match self.session.current_address() {
            Some(address) => address,
            None => self.session.connect().await?,
        };
        Ok(self.backend.list_references(owner.into()).await?)
    }

    /// Deletes a saved reference after the owner signed the request.
    ///
    /// The wallet must be on the network the contract was deployed to.
    pub async fn delete_contract(&self, reference: &DeployedContractRef) -> Result<(), StudioError> {
        let id = reference
            .firestore_id
            .as_deref()
            .ok_or(StudioError::NotPersisted(reference.contract_address))?;
        let expected = reference.network.parse::<Network>()?.chain_id();
        let actual = self.session.fetch_chain_id().await?;
        if actual != expected {
            warn!(expected, actual, %id, "refusing to delete on the wrong network");
            return Err(StudioError::WrongNetwork { expected, actual });
        }
        let envelope =
            self.envelopes.build(Intent::DeleteReference, id, &context(reference)).await?;
        let resp = self.backend.delete_reference(id, &envelope.into_payload()).await?;
        info!(%id, address = %reference.contract_address, "{}", resp.message);
        Ok(())
    }

    /// An invoker for the contract behind `reference`.
    pub fn interface(&self, reference: &DeployedContractRef) -> Result<ContractInvoker, StudioError> {
        let network: Network = reference.network.parse()?;
        Ok(ContractInvoker::new(
            reference.contract_address.address(),
            network.chain_id(),
            AbiRegistry::parse(&reference.abi),
            self.session.clone(),
            self.tracker.clone(),
        ))
    }
}

fn context(reference: &DeployedContractRef) -> ContextFields {
    ContextFields {
        name: Some(reference.name.clone()),
        contract: reference.contract_name_sol.clone(),
        network: Some(reference.network.clone()),
    }
}
