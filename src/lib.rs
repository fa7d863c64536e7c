//! Client-side order pipeline for the Swivel lending contracts.
//!
//! An [`Order`](models::order::Order) is canonicalized into its on-chain
//! encoding, signed as EIP-712 typed data, submitted through a
//! [`GasSafetyExecutor`](services::executor::GasSafetyExecutor), and any
//! revert can be turned back into a [`ProtocolError`](models::exception::ProtocolError)
//! by the [`ExceptionDecoder`](services::exception_service::ExceptionDecoder).

pub mod backend;
pub mod config;
pub mod eip712;
pub mod error;
pub mod models;
pub mod services;

pub use error::{BackendFailure, ConfigurationError, EncodingError, Error, MalformedSignatureError};
pub use models::exception::{Exception, ProtocolError};
pub use models::order::{CanonicalOrder, Order, OrderKind, Protocol};
pub use models::types::{CallOverrides, PendingCall, Signature, TransactionHandle, TypedDataDomain};
