use async_trait::async_trait;
use ethers::signers::Signer;
use ethers::types::transaction::eip712::{EIP712Domain, Eip712, Eip712DomainType, TypedData, Types};
use ethers::types::{H256, U256};
use serde_json::Value;

use crate::error::{BackendFailure, ConfigurationError, EncodingError, Error, Result};
use crate::models::order::{CanonicalOrder, Order};
use crate::models::types::{Address, Signature, TypedDataDomain};
use crate::services::order_service::canonicalize;
use crate::services::signature::split;

pub const DOMAIN_NAME: &str = "Swivel Finance";
pub const DOMAIN_VERSION: &str = "3.0.0";
pub const PRIMARY_TYPE: &str = "Order";

/// EIP712Domain field list, in declaration order.
pub const DOMAIN_SCHEMA: &[(&str, &str)] = &[
    ("name", "string"),
    ("version", "string"),
    ("chainId", "uint256"),
    ("verifyingContract", "address"),
];

/// Order field list. Must match the verifier's struct byte for byte,
/// including order.
pub const ORDER_SCHEMA: &[(&str, &str)] = &[
    ("key", "bytes32"),
    ("protocol", "uint8"),
    ("maker", "address"),
    ("underlying", "address"),
    ("vault", "bool"),
    ("exit", "bool"),
    ("principal", "uint256"),
    ("premium", "uint256"),
    ("maturity", "uint256"),
    ("expiry", "uint256"),
];

impl TypedDataDomain {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        TypedDataDomain {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    /// Builds the domain, failing if either caller supplied part is missing.
    pub fn resolve(
        chain_id: Option<u64>,
        verifying_contract: Option<Address>,
    ) -> Result<Self, ConfigurationError> {
        let chain_id = chain_id.ok_or(ConfigurationError::MissingChainId)?;
        let verifying_contract =
            verifying_contract.ok_or(ConfigurationError::MissingVerifyingContract)?;
        Ok(TypedDataDomain::new(chain_id, verifying_contract))
    }

    fn to_eip712(&self) -> EIP712Domain {
        EIP712Domain {
            name: Some(self.name.clone()),
            version: Some(self.version.clone()),
            chain_id: Some(U256::from(self.chain_id)),
            verifying_contract: Some(self.verifying_contract),
            salt: None,
        }
    }
}

fn schema(fields: &[(&str, &str)]) -> Vec<Eip712DomainType> {
    fields
        .iter()
        .map(|(name, ty)| Eip712DomainType {
            name: name.to_string(),
            r#type: ty.to_string(),
        })
        .collect()
}

pub fn type_schema() -> Types {
    let mut types = Types::new();
    types.insert("EIP712Domain".to_string(), schema(DOMAIN_SCHEMA));
    types.insert(PRIMARY_TYPE.to_string(), schema(ORDER_SCHEMA));
    types
}

/// Full typed-data payload for `order` under `domain`.
pub fn typed_data(order: &CanonicalOrder, domain: &TypedDataDomain) -> TypedData {
    TypedData {
        domain: domain.to_eip712(),
        types: type_schema(),
        primary_type: PRIMARY_TYPE.to_string(),
        message: order.to_message(),
    }
}

/// EIP-712 digest (`keccak256(0x1901 || domainSeparator || hashStruct(order))`).
pub fn order_digest(order: &CanonicalOrder, domain: &TypedDataDomain) -> Result<H256, EncodingError> {
    typed_data(order, domain)
        .encode_eip712()
        .map(H256::from)
        .map_err(|e| EncodingError::TypedData(e.to_string()))
}

/// Produces a hex signature over a typed-data payload. Key custody stays
/// with the implementor.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    async fn sign_typed(&self, payload: &TypedData) -> Result<String, BackendFailure>;
}

#[async_trait]
impl<S> SigningCapability for S
where
    S: Signer,
{
    async fn sign_typed(&self, payload: &TypedData) -> Result<String, BackendFailure> {
        let signature = Signer::sign_typed_data(self, payload)
            .await
            .map_err(|e| BackendFailure::new(e.to_string(), Value::String(e.to_string())))?;
        Ok(format!("0x{}", ethers::utils::hex::encode(signature.to_vec())))
    }
}

/// Signs `order` for the verifying contract on `chain_id`.
///
/// Both domain parameters are required and checked before any signing I/O.
pub async fn sign_order<S>(
    order: &Order,
    signer: &S,
    chain_id: Option<u64>,
    verifying_contract: Option<Address>,
) -> Result<Signature>
where
    S: SigningCapability + ?Sized,
{
    let domain = TypedDataDomain::resolve(chain_id, verifying_contract)?;
    let canonical = canonicalize(order)?;
    let payload = typed_data(&canonical, &domain);

    log::debug!(
        "signing order {} for chain {} contract {:?}",
        order.key, domain.chain_id, domain.verifying_contract
    );
    let raw = signer.sign_typed(&payload).await?;
    Ok(split(&raw)?)
}

/// Recovers the address that produced `signature` over `order` in `domain`.
pub fn recover_signer(
    order: &CanonicalOrder,
    signature: &Signature,
    domain: &TypedDataDomain,
) -> Result<Address> {
    let digest = order_digest(order, domain)?;
    ethers::types::Signature::from(*signature)
        .recover(digest)
        .map_err(|e| Error::Encoding(EncodingError::TypedData(e.to_string())))
}
