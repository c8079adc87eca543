//! Calling deployed contracts through the ABI registry.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use std::sync::Arc;
use vellum::{AbiError, AbiRegistry, ContractInvoker, InvokeError, TxStatus};
use vellum_common::ErrorKind;
use vellum_test_utils::{MockCall, MockProvider, fixtures};
use vellum_wallets::ProviderError;

use crate::utils::{NO_ARGS, connected, session};

const SEPOLIA: u64 = 11155111;

fn contract() -> Address {
    "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
}

fn invoker(mock: &Arc<MockProvider>, abi: &alloy_json_abi::JsonAbi) -> ContractInvoker {
    let (session, tracker) = session(mock);
    ContractInvoker::new(contract(), SEPOLIA, AbiRegistry::parse(abi), session, tracker)
}

async fn connected_invoker(mock: &Arc<MockProvider>, chain_id: u64) -> ContractInvoker {
    let (session, tracker) = connected(mock).await;
    ContractInvoker::new(
        contract(),
        chain_id,
        AbiRegistry::parse(&fixtures::counter_abi()),
        session,
        tracker,
    )
}

#[tokio::test]
async fn invalid_address_fails_before_provider() {
    let mock = Arc::new(MockProvider::new());
    let invoker = invoker(&mock, &fixtures::token_abi());

    let err = invoker.invoke_read("balanceOf", &["not-an-address"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentEncoding);
    assert!(matches!(&err, InvokeError::Abi(AbiError::InvalidArgument { .. })), "{err:?}");
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn reads_and_renders_decimal() {
    let mock = Arc::new(MockProvider::new());
    let big = U256::from(10).pow(U256::from(30));
    mock.set_call_result(Ok(DynSolValue::Uint(big, 256).abi_encode().into()));
    let invoker = invoker(&mock, &fixtures::counter_abi());

    let values = invoker.invoke_read("count", &NO_ARGS).await.unwrap();
    assert_eq!(values, vec!["1000000000000000000000000000000".to_string()]);

    let calls = mock.calls();
    let [MockCall::Call(tx)] = calls.as_slice() else { panic!("expected one call: {calls:?}") };
    assert_eq!(tx.to, Some(TxKind::Call(contract())));
    let function = invoker.registry().function("count").unwrap().function().clone();
    assert_eq!(tx.input.input().unwrap()[..4], function.selector()[..]);
}

#[tokio::test]
async fn reads_addresses_lowercase() {
    let mock = Arc::new(MockProvider::new());
    let owner = mock.address();
    mock.set_call_result(Ok(DynSolValue::Address(owner).abi_encode().into()));
    let invoker = invoker(&mock, &fixtures::counter_abi());

    let values = invoker.invoke_read("owner", &NO_ARGS).await.unwrap();
    assert_eq!(values, vec![owner.to_string().to_lowercase()]);
}

#[tokio::test]
async fn revert_reason_is_surfaced() {
    let mock = Arc::new(MockProvider::new());
    mock.set_call_result(Err(ProviderError::Rpc {
        code: 3,
        message: "execution reverted: overflow".into(),
        data: None,
    }));
    let invoker = invoker(&mock, &fixtures::counter_abi());

    let err = invoker.invoke_read("add", &["1", "2"]).await.unwrap_err();
    assert!(matches!(&err, InvokeError::CallReverted(Some(reason)) if reason == "overflow"));
    assert_eq!(err.kind(), ErrorKind::CallReverted);
}

#[tokio::test]
async fn undecodable_output() {
    let mock = Arc::new(MockProvider::new());
    mock.set_call_result(Ok(Bytes::from_static(&[1, 2, 3])));
    let invoker = invoker(&mock, &fixtures::counter_abi());

    let err = invoker.invoke_read("count", &NO_ARGS).await.unwrap_err();
    assert!(matches!(err, InvokeError::Abi(AbiError::Decode(_))), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(!err.kind().is_retryable_by_user());
}

#[tokio::test]
async fn rejects_wrong_function_kind() {
    let mock = Arc::new(MockProvider::new());
    let invoker = invoker(&mock, &fixtures::counter_abi());

    let err = invoker.invoke_read("increment", &NO_ARGS).await.unwrap_err();
    assert!(matches!(err, InvokeError::NotReadable(_)), "{err:?}");
    let err = invoker.invoke_write("count", &NO_ARGS, None).await.unwrap_err();
    assert!(matches!(err, InvokeError::NotWritable(_)), "{err:?}");
    let err = invoker.invoke_write("increment", &NO_ARGS, Some("1")).await.unwrap_err();
    assert!(matches!(err, InvokeError::NotPayable(_)), "{err:?}");
    let err = invoker.invoke_read("missing", &NO_ARGS).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn writes_through_the_tracker() {
    let mock = Arc::new(MockProvider::new());
    let invoker = connected_invoker(&mock, SEPOLIA).await;

    let tx = invoker.invoke_write("setCount", &["7"], None).await.unwrap();
    let record = tx.wait().await.unwrap();
    assert_eq!(record.status, TxStatus::Confirmed);

    let sent = mock
        .calls()
        .into_iter()
        .find_map(|call| match call {
            MockCall::SendTransaction(tx) => Some(tx),
            _ => None,
        })
        .unwrap();
    assert_eq!(sent.from, Some(mock.address()));
    assert_eq!(sent.to, Some(TxKind::Call(contract())));
    assert_eq!(sent.value, None);
    assert_eq!(sent.input.input().unwrap().len(), 4 + 32);
}

#[tokio::test]
async fn payable_value_in_wei() {
    let mock = Arc::new(MockProvider::new());
    let invoker = connected_invoker(&mock, SEPOLIA).await;

    invoker.invoke_write("deposit", &NO_ARGS, Some("0.01")).await.unwrap().wait().await.unwrap();
    let value = mock.calls().into_iter().find_map(|call| match call {
        MockCall::SendTransaction(tx) => tx.value,
        _ => None,
    });
    assert_eq!(value, Some(U256::from(10_000_000_000_000_000u64)));

    let err = invoker.invoke_write("deposit", &NO_ARGS, Some("-1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentEncoding);
}

#[tokio::test]
async fn write_on_wrong_network() {
    let mock = Arc::new(MockProvider::new());
    let invoker = connected_invoker(&mock, 1).await;
    mock.clear_calls();

    let err = invoker.invoke_write("increment", &NO_ARGS, None).await.unwrap_err();
    assert!(matches!(err, InvokeError::WrongNetwork { expected: 1, actual: SEPOLIA }), "{err:?}");
    assert_eq!(mock.calls(), vec![MockCall::ChainId]);
}

#[tokio::test]
async fn overloads_need_a_signature() {
    let mock = Arc::new(MockProvider::new());
    let (session, tracker) = connected(&mock).await;
    let token = ContractInvoker::new(
        contract(),
        SEPOLIA,
        AbiRegistry::parse(&fixtures::token_abi()),
        session,
        tracker,
    );
    let to = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    let err = token.invoke_write("transfer", &[to, "1"], None).await.unwrap_err();
    assert!(matches!(err, InvokeError::Abi(AbiError::AmbiguousFunction { .. })), "{err:?}");

    token.invoke_write("transfer(address,uint256)", &[to, "1"], None).await.unwrap();
    token.invoke_write("transfer(address)", &[to], None).await.unwrap();
}

#[tokio::test]
async fn reads_from_argument_slots() {
    let mock = Arc::new(MockProvider::new());
    mock.set_call_result(Ok(DynSolValue::Uint(U256::from(5), 256).abi_encode().into()));
    let mut invoker = invoker(&mock, &fixtures::counter_abi());

    let add = invoker.registry_mut().function_mut("add").unwrap();
    add.set_arg(0, "2").unwrap();
    let err = invoker.invoke_read_slots("add").await.unwrap_err();
    assert!(matches!(err, InvokeError::Abi(AbiError::MissingArgument { index: 1, .. })));

    invoker.registry_mut().function_mut("add").unwrap().set_arg(1, "3").unwrap();
    assert_eq!(invoker.invoke_read_slots("add").await.unwrap(), vec!["5"]);
}
