use crate::error::PrivateKeyError;
use alloy_primitives::{B256, hex::FromHex};
use alloy_signer_local::PrivateKeySigner;

fn ensure_pk_not_env(pk: &str) -> Result<(), PrivateKeyError> {
    if !pk.starts_with("0x") && std::env::var(pk).is_ok() {
        return Err(PrivateKeyError::ExistsAsEnvVar(pk.to_string()));
    }
    Ok(())
}

/// Validates and sanitizes a raw private key, returning a local signer.
pub fn create_private_key_signer(
    private_key_str: &str,
) -> Result<PrivateKeySigner, PrivateKeyError> {
    let private_key_str = private_key_str.trim();
    let private_key = match B256::from_hex(private_key_str) {
        Ok(private_key) => private_key,
        Err(err) => {
            ensure_pk_not_env(private_key_str)?;
            return Err(err.into());
        }
    };
    PrivateKeySigner::from_bytes(&private_key).map_err(|err| {
        ensure_pk_not_env(private_key_str)
            .err()
            .unwrap_or_else(|| PrivateKeyError::Local(err.into()))
    })
}
