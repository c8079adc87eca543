//! Contract fixtures shared by the test suites.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Bytes, bytes};
use vellum_backend::CompiledArtifact;

/// A counter with a constructor, two views, a pure helper, two mutating functions, a payable
/// function, an event and an error.
pub const COUNTER_ABI: &str = r#"[
  {"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"initial","type":"uint256"}]},
  {"type":"function","name":"count","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"owner","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"address"}]},
  {"type":"function","name":"add","stateMutability":"pure","inputs":[{"name":"a","type":"uint256"},{"name":"b","type":"uint256"}],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"increment","stateMutability":"nonpayable","inputs":[],"outputs":[]},
  {"type":"function","name":"setCount","stateMutability":"nonpayable","inputs":[{"name":"value","type":"uint256"}],"outputs":[]},
  {"type":"function","name":"deposit","stateMutability":"payable","inputs":[],"outputs":[]},
  {"type":"event","name":"Incremented","anonymous":false,"inputs":[{"name":"count","type":"uint256","indexed":false}]},
  {"type":"error","name":"NotOwner","inputs":[]}
]"#;

/// Overloaded `transfer` plus a view taking an address array.
pub const TOKEN_ABI: &str = r#"[
  {"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"balanceOf","stateMutability":"view","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"balancesOf","stateMutability":"view","inputs":[{"name":"owners","type":"address[]"}],"outputs":[{"name":"","type":"uint256[]"}]},
  {"type":"function","name":"name","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string"}]}
]"#;

/// Functions taking tuples and function pointers, next to one plain function.
pub const UNSUPPORTED_ABI: &str = r#"[
  {"type":"function","name":"setPoint","stateMutability":"nonpayable","inputs":[{"name":"p","type":"tuple","components":[{"name":"x","type":"uint256"},{"name":"y","type":"uint256"}]}],"outputs":[]},
  {"type":"function","name":"setCallback","stateMutability":"nonpayable","inputs":[{"name":"cb","type":"function"}],"outputs":[]},
  {"type":"function","name":"ping","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"bool"}]}
]"#;

/// Creation bytecode used for the counter fixture.
pub const COUNTER_BYTECODE: Bytes = bytes!("6080604052348015600f57600080fd5b50603f80601d6000396000f3fe");

fn parse(abi: &str) -> JsonAbi {
    serde_json::from_str(abi).expect("fixture ABI is valid")
}

pub fn counter_abi() -> JsonAbi {
    parse(COUNTER_ABI)
}

pub fn token_abi() -> JsonAbi {
    parse(TOKEN_ABI)
}

pub fn unsupported_abi() -> JsonAbi {
    parse(UNSUPPORTED_ABI)
}

/// The counter as a compiler would return it.
pub fn counter_artifact() -> CompiledArtifact {
    CompiledArtifact {
        abi: counter_abi(),
        bytecode: COUNTER_BYTECODE,
        contract_name: "Counter".to_string(),
        warnings: Vec::new(),
    }
}

/// The Solidity source of the counter.
pub const COUNTER_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

contract Counter {
    uint256 public count;
    address public owner;

    event Incremented(uint256 count);
    error NotOwner();

    constructor(uint256 initial) {
        count = initial;
        owner = msg.sender;
    }

    function add(uint256 a, uint256 b) external pure returns (uint256) {
        return a + b;
    }

    function increment() external {
        count += 1;
        emit Incremented(count);
    }

    function setCount(uint256 value) external {
        if (msg.sender != owner) revert NotOwner();
        count = value;
    }

    function deposit() external payable {}
}
"#;
