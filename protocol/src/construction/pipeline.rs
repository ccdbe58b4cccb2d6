//! # Construction Pipeline
//!
//! The `/construction/*` stages. Each stage is an independent call: it
//! re-derives everything from the typed records and opaque block payloads
//! the client carries between stages, and holds no state of its own.
//!
//! ```text
//! derive      public key → address
//! preprocess  operations → options + required signers
//! metadata    options → chain position, send hash, PoW        (online)
//! payloads    operations + metadata + key → unsigned block + payload
//! combine     unsigned block + signature → signed block
//! hash        signed block → transaction identifier
//! parse       block → operations + metadata (+ signers)
//! submit      signed block → broadcast                       (online)
//! ```
//!
//! Lower-layer errors are mapped to the API catalog here, with their text
//! kept in `details.context`.

use std::sync::Arc;

use tracing::{debug, info};

use super::options::{use_pow_flag, ConstructionMetadata, ConstructionOptions, ParseMetadata};
use super::resolver::{ResolverError, TransferQuery, UnreceivedBlockResolver};
use crate::client::{NodeClient, PowDifficultyParams};
use crate::config::Configuration;
use crate::crypto::{blake2b_256_multi, VitePublicKey};
use crate::error::{ApiError, ErrorKind};
use crate::ledger::{decode_block, encode_block, AccountBlock, Address, Hash, TokenTypeId};
use crate::model::api::{
    ConstructionCombineRequest, ConstructionCombineResponse, ConstructionDeriveRequest,
    ConstructionDeriveResponse, ConstructionHashRequest, ConstructionMetadataRequest,
    ConstructionMetadataResponse, ConstructionParseRequest, ConstructionParseResponse,
    ConstructionPayloadsRequest, ConstructionPayloadsResponse, ConstructionPreprocessRequest,
    ConstructionPreprocessResponse, ConstructionSubmitRequest, TransactionIdentifierResponse,
};
use crate::model::{
    AccountIdentifier, CurveType, OperationType, PublicKey, SignatureType, SigningPayload,
    TransactionIdentifier,
};
use crate::services::{check_network, require_online};
use crate::transaction::{
    apply_signature, create_account_block, match_transaction, operation_type_to_block_type,
    operations_for_block, verify_signed_block, BuildError,
};

pub struct ConstructionService {
    config: Arc<Configuration>,
    client: Arc<dyn NodeClient>,
}

impl ConstructionService {
    pub fn new(config: Arc<Configuration>, client: Arc<dyn NodeClient>) -> Self {
        Self { config, client }
    }

    // -----------------------------------------------------------------------
    // Offline stages
    // -----------------------------------------------------------------------

    pub fn derive(
        &self,
        request: &ConstructionDeriveRequest,
    ) -> Result<ConstructionDeriveResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let key = decode_public_key(&request.public_key)?;
        Ok(ConstructionDeriveResponse {
            account_identifier: AccountIdentifier::new(key.address()),
        })
    }

    pub fn preprocess(
        &self,
        request: &ConstructionPreprocessRequest,
    ) -> Result<ConstructionPreprocessResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let description = match_transaction(&request.operations)
            .map_err(|e| ApiError::wrap(ErrorKind::UnclearIntent, e))?;
        if description.operation_type == OperationType::Burn {
            return Err(ApiError::wrap(
                ErrorKind::UnclearIntent,
                "burn operations cannot be constructed",
            ));
        }

        let use_pow = use_pow_flag(request.metadata.as_ref());
        debug!(
            op = %description.operation_type,
            account = %description.account.address,
            use_pow,
            "preprocessed operations"
        );
        Ok(ConstructionPreprocessResponse {
            options: ConstructionOptions::from_description(&description, use_pow),
            required_public_keys: vec![description.account],
        })
    }

    pub fn payloads(
        &self,
        request: &ConstructionPayloadsRequest,
    ) -> Result<ConstructionPayloadsResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let public_key = request
            .public_keys
            .first()
            .ok_or_else(|| ApiError::wrap(ErrorKind::UnclearIntent, "missing public key"))?;
        let public_key = decode_public_key(public_key)?;

        let description = match_transaction(&request.operations)
            .map_err(|e| ApiError::wrap(ErrorKind::UnclearIntent, e))?;
        let block = create_account_block(&description, &request.metadata, &public_key)
            .map_err(build_error)?;
        let unsigned_transaction = encode(&block)?;

        debug!(hash = %block.hash, height = block.height, "built unsigned block");
        Ok(ConstructionPayloadsResponse {
            unsigned_transaction,
            payloads: vec![SigningPayload {
                account_identifier: Some(description.account),
                hex_bytes: block.hash.to_string(),
                signature_type: Some(SignatureType::Ed25519),
            }],
        })
    }

    pub fn combine(
        &self,
        request: &ConstructionCombineRequest,
    ) -> Result<ConstructionCombineResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let mut block = decode(&request.unsigned_transaction)?;

        let [signature] = request.signatures.as_slice() else {
            return Err(ApiError::wrap(
                ErrorKind::SignatureInvalid,
                format!(
                    "expected exactly one signature, got {}",
                    request.signatures.len()
                ),
            ));
        };
        if signature.signature_type != SignatureType::Ed25519 {
            return Err(ApiError::wrap(
                ErrorKind::SignatureInvalid,
                format!("unsupported signature type {:?}", signature.signature_type),
            ));
        }
        let invalid = |e: hex::FromHexError| ApiError::wrap(ErrorKind::SignatureInvalid, e);
        let public_key = hex::decode(&signature.public_key.hex_bytes).map_err(invalid)?;
        let signature_bytes = hex::decode(&signature.hex_bytes).map_err(invalid)?;

        let hash = apply_signature(&mut block, &public_key, &signature_bytes)
            .map_err(|e| ApiError::wrap(ErrorKind::SignatureInvalid, e))?;

        debug!(%hash, "combined signature");
        Ok(ConstructionCombineResponse {
            signed_transaction: encode(&block)?,
        })
    }

    pub fn hash(
        &self,
        request: &ConstructionHashRequest,
    ) -> Result<TransactionIdentifierResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let block = decode(&request.signed_transaction)?;
        Ok(TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier::new(block.hash),
            metadata: None,
        })
    }

    pub fn parse(
        &self,
        request: &ConstructionParseRequest,
    ) -> Result<ConstructionParseResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        let block = decode(&request.transaction)?;
        let operations = operations_for_block(&block, false)
            .map_err(|e| ApiError::wrap(ErrorKind::UnableToParseIntermediateResult, e))?;

        let account_identifier_signers = if request.signed {
            vec![AccountIdentifier::new(block.address)]
        } else {
            Vec::new()
        };

        Ok(ConstructionParseResponse {
            operations,
            account_identifier_signers,
            metadata: parse_metadata(&block),
        })
    }

    // -----------------------------------------------------------------------
    // Online stages
    // -----------------------------------------------------------------------

    pub async fn metadata(
        &self,
        request: &ConstructionMetadataRequest,
    ) -> Result<ConstructionMetadataResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;
        let options = &request.options;

        let address = parse_address(&options.account_identifier)?;
        let block_type = operation_type_to_block_type(options.operation_type)
            .map_err(|e| ApiError::wrap(ErrorKind::UnclearIntent, e))?;

        let (height, previous_hash) = if options.fetch_previous_block {
            self.client
                .latest_account_block(&address)
                .await
                .map_err(|e| ApiError::wrap(ErrorKind::Node, e))?
                .map(|block| (block.height, block.hash))
                .unwrap_or((0, Hash::ZERO))
        } else {
            (0, Hash::ZERO)
        };

        let send_block_hash = if block_type.is_receive() {
            Some(self.resolve_send_block(options).await?)
        } else {
            None
        };

        let mut metadata = ConstructionMetadata {
            height,
            previous_hash,
            difficulty: None,
            nonce: None,
            send_block_hash,
            data: options.data.clone(),
        };

        if options.use_pow {
            let params = PowDifficultyParams {
                address,
                previous_hash,
                block_type,
                to_address: parse_address(&options.to_account)?,
                data: options.data.clone(),
            };
            let difficulty = self
                .client
                .pow_difficulty(&params)
                .await
                .map_err(|e| ApiError::wrap(ErrorKind::Node, e))?;

            if let Some(difficulty) = difficulty {
                let nonce_hash = Hash::new(blake2b_256_multi(&[
                    &address.as_bytes()[..],
                    &previous_hash.as_bytes()[..],
                ]));
                let nonce = self
                    .client
                    .pow_nonce(&difficulty, &nonce_hash)
                    .await
                    .map_err(|e| ApiError::wrap(ErrorKind::Node, e))?;
                metadata.difficulty = Some(difficulty);
                metadata.nonce = Some(nonce);
            }
        }

        debug!(%address, height, pow = metadata.difficulty.is_some(), "fetched metadata");
        Ok(ConstructionMetadataResponse {
            metadata,
            suggested_fee: None,
        })
    }

    async fn resolve_send_block(&self, options: &ConstructionOptions) -> Result<Hash, ApiError> {
        if let Some(hash) = options.send_block_hash {
            return Ok(hash);
        }
        let query = TransferQuery::from_options(options).map_err(resolver_error)?;
        UnreceivedBlockResolver::new(self.client.as_ref())
            .with_max_pages(self.config.max_unreceived_pages)
            .resolve(&query)
            .await
            .map_err(resolver_error)
    }

    pub async fn submit(
        &self,
        request: &ConstructionSubmitRequest,
    ) -> Result<TransactionIdentifierResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;
        let mut block = decode(&request.signed_transaction)?;
        verify_signed_block(&block).map_err(|e| ApiError::wrap(ErrorKind::SignatureInvalid, e))?;

        // The node derives these from the acknowledged send.
        if block.is_receive() {
            block.token_id = TokenTypeId::ZERO;
            block.token_info = None;
            block.amount = None;
            block.fee = None;
            block.to_address = Address::ZERO;
        }

        self.client
            .send_raw_transaction(&block)
            .await
            .map_err(|e| ApiError::wrap(ErrorKind::BroadcastFailed, e))?;

        info!(hash = %block.hash, address = %block.address, "broadcast account block");
        Ok(TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier::new(block.hash),
            metadata: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Ed25519 key from a Rosetta public key. Anything else is reported as
/// undecompressable.
pub fn decode_public_key(key: &PublicKey) -> Result<VitePublicKey, ApiError> {
    if key.curve_type != CurveType::Edwards25519 {
        return Err(ApiError::wrap(
            ErrorKind::UnableToDecompressPubkey,
            format!("unsupported curve {:?}", key.curve_type),
        ));
    }
    let bytes = hex::decode(&key.hex_bytes)
        .map_err(|e| ApiError::wrap(ErrorKind::UnableToDecompressPubkey, e))?;
    VitePublicKey::try_from_slice(&bytes)
        .map_err(|e| ApiError::wrap(ErrorKind::UnableToDecompressPubkey, e))
}

fn parse_address(account: &AccountIdentifier) -> Result<Address, ApiError> {
    account
        .address
        .parse()
        .map_err(|e| ApiError::wrap(ErrorKind::UnableToParseIntermediateResult, e))
}

fn encode(block: &AccountBlock) -> Result<String, ApiError> {
    encode_block(block).map_err(|e| ApiError::wrap(ErrorKind::UnableToParseIntermediateResult, e))
}

/// Decodes a payload carried between stages. Token info that disagrees
/// with the hashed `token_id` is refused.
fn decode(payload: &str) -> Result<AccountBlock, ApiError> {
    let block = decode_block(payload)
        .map_err(|e| ApiError::wrap(ErrorKind::UnableToParseIntermediateResult, e))?;
    if !block.token_info_consistent() {
        return Err(ApiError::wrap(
            ErrorKind::CallParametersInvalid,
            format!("token info does not match token id {}", block.token_id),
        ));
    }
    Ok(block)
}

fn build_error(err: BuildError) -> ApiError {
    match err {
        BuildError::BlockType(_) | BuildError::MissingSendBlockHash => {
            ApiError::wrap(ErrorKind::UnclearIntent, err)
        }
        _ => ApiError::wrap(ErrorKind::UnableToParseIntermediateResult, err),
    }
}

fn resolver_error(err: ResolverError) -> ApiError {
    match err {
        ResolverError::Node(e) => ApiError::wrap(ErrorKind::Node, e),
        other => ApiError::wrap(ErrorKind::UnclearIntent, other),
    }
}

fn parse_metadata(block: &AccountBlock) -> ParseMetadata {
    ParseMetadata {
        height: block.height,
        previous_hash: block.previous_hash,
        block_type: block.block_type.as_byte(),
        difficulty: block.difficulty,
        nonce: block.nonce.clone(),
        fee: block.fee,
        data: block.data.clone(),
        send_block_hash: block.is_receive().then_some(block.send_block_hash),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
