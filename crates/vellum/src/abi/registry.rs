use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy_primitives::Bytes;
use serde::Serialize;

use super::{AbiError, ParamKind};

/// How a function may be invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FunctionKind {
    /// `view` or `pure`: answered by an `eth_call`.
    Read,
    /// `nonpayable`: needs a transaction.
    Write,
    /// `payable`: needs a transaction and may carry native value.
    Payable,
}

impl FunctionKind {
    pub fn from_mutability(mutability: StateMutability) -> Self {
        match mutability {
            StateMutability::Pure | StateMutability::View => Self::Read,
            StateMutability::NonPayable => Self::Write,
            StateMutability::Payable => Self::Payable,
        }
    }

    pub fn is_read(self) -> bool {
        self == Self::Read
    }
}

/// A named, typed parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AbiParam {
    pub name: String,
    /// The Solidity type as written in the ABI.
    pub ty: String,
    #[serde(skip)]
    pub kind: ParamKind,
}

impl AbiParam {
    fn from_param(param: &Param) -> Result<Self, AbiError> {
        let ty = param.selector_type().into_owned();
        let kind = ParamKind::parse(&ty)?;
        Ok(Self { name: param.name.clone(), ty, kind })
    }
}

/// A function of the ABI that can be called with text arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvocableFunction {
    pub name: String,
    pub kind: FunctionKind,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    /// One slot per input, `None` until set.
    args: Vec<Option<String>>,
    #[serde(skip)]
    function: Function,
}

impl InvocableFunction {
    fn new(function: &Function) -> Result<Self, AbiError> {
        let inputs =
            function.inputs.iter().map(AbiParam::from_param).collect::<Result<Vec<_>, _>>()?;
        let outputs =
            function.outputs.iter().map(AbiParam::from_param).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: function.name.clone(),
            kind: FunctionKind::from_mutability(function.state_mutability),
            args: vec![None; inputs.len()],
            inputs,
            outputs,
            function: function.clone(),
        })
    }

    /// `name(type,...)`, unique within an ABI.
    pub fn signature(&self) -> String {
        self.function.signature()
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn args(&self) -> &[Option<String>] {
        &self.args
    }

    /// Sets the argument slot at `index`.
    pub fn set_arg(&mut self, index: usize, value: impl Into<String>) -> Result<(), AbiError> {
        let expected = self.args.len();
        let slot = self
            .args
            .get_mut(index)
            .ok_or(AbiError::ArgumentCount { expected, got: index + 1 })?;
        *slot = Some(value.into());
        Ok(())
    }

    pub fn clear_args(&mut self) {
        self.args.iter_mut().for_each(|slot| *slot = None);
    }

    /// The arguments set so far, failing on the first unset slot.
    pub fn filled_args(&self) -> Result<Vec<String>, AbiError> {
        self.args
            .iter()
            .zip(&self.inputs)
            .enumerate()
            .map(|(index, (slot, input))| {
                slot.clone()
                    .ok_or_else(|| AbiError::MissingArgument { index, name: input.name.clone() })
            })
            .collect()
    }

    /// Coerces `args` into values of the declared input types.
    pub fn coerce_args<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<DynSolValue>, AbiError> {
        coerce_params(&self.inputs, args)
    }

    /// Encodes a call with selector.
    pub fn encode_call<S: AsRef<str>>(&self, args: &[S]) -> Result<Bytes, AbiError> {
        let values = self.coerce_args(args)?;
        self.function
            .abi_encode_input(&values)
            .map(Into::into)
            .map_err(|err| AbiError::Encode(err.to_string()))
    }

    /// Decodes the return data of a call.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        self.function.abi_decode_output(data).map_err(|err| AbiError::Decode(err.to_string()))
    }
}

fn coerce_params<S: AsRef<str>>(
    params: &[AbiParam],
    args: &[S],
) -> Result<Vec<DynSolValue>, AbiError> {
    if params.len() != args.len() {
        return Err(AbiError::ArgumentCount { expected: params.len(), got: args.len() });
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            param.kind.coerce(arg.as_ref()).map_err(|err| AbiError::InvalidArgument {
                name: param.name.clone(),
                source: Box::new(err),
            })
        })
        .collect()
}

/// A function left out of the registry because one of its types is unsupported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedFunction {
    pub signature: String,
    pub reason: String,
}

/// Functions of an ABI, partitioned by how they are invoked.
///
/// Overloads are distinct entries keyed by name and input types. Both lists are sorted by name,
/// then signature.
#[derive(Clone, Debug, Default)]
pub struct AbiRegistry {
    reads: Vec<InvocableFunction>,
    writes: Vec<InvocableFunction>,
    rejected: Vec<RejectedFunction>,
}

impl AbiRegistry {
    /// Derives the registry from `abi`. Anything that is not a function is ignored.
    pub fn parse(abi: &JsonAbi) -> Self {
        let mut registry = Self::default();
        for function in abi.functions() {
            match InvocableFunction::new(function) {
                Ok(invocable) if invocable.kind.is_read() => registry.reads.push(invocable),
                Ok(invocable) => registry.writes.push(invocable),
                Err(err) => {
                    let signature = function.signature();
                    warn!(%signature, %err, "skipping function");
                    registry.rejected.push(RejectedFunction { signature, reason: err.to_string() });
                }
            }
        }
        let by_name = |a: &InvocableFunction, b: &InvocableFunction| {
            a.name.cmp(&b.name).then_with(|| a.signature().cmp(&b.signature()))
        };
        registry.reads.sort_by(by_name);
        registry.writes.sort_by(by_name);
        trace!(
            reads = registry.reads.len(),
            writes = registry.writes.len(),
            rejected = registry.rejected.len(),
            "parsed ABI"
        );
        registry
    }

    /// `view` and `pure` functions.
    pub fn reads(&self) -> &[InvocableFunction] {
        &self.reads
    }

    /// `nonpayable` and `payable` functions.
    pub fn writes(&self) -> &[InvocableFunction] {
        &self.writes
    }

    pub fn rejected(&self) -> &[RejectedFunction] {
        &self.rejected
    }

    pub fn functions(&self) -> impl Iterator<Item = &InvocableFunction> {
        self.reads.iter().chain(&self.writes)
    }

    /// Looks a function up by full signature, or by name when the name is not overloaded.
    pub fn function(&self, key: &str) -> Result<&InvocableFunction, AbiError> {
        let index = self.position(key)?;
        self.functions().nth(index).ok_or_else(|| AbiError::UnknownFunction(key.to_string()))
    }

    /// Mutable access for filling argument slots.
    pub fn function_mut(&mut self, key: &str) -> Result<&mut InvocableFunction, AbiError> {
        let index = self.position(key)?;
        let reads = self.reads.len();
        Ok(if index < reads { &mut self.reads[index] } else { &mut self.writes[index - reads] })
    }

    fn position(&self, key: &str) -> Result<usize, AbiError> {
        let key = key.trim();
        if key.contains('(') {
            let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
            return self
                .functions()
                .position(|f| f.signature() == key)
                .ok_or(AbiError::UnknownFunction(key));
        }

        let matches: Vec<usize> = self
            .functions()
            .enumerate()
            .filter(|(_, f)| f.name == key)
            .map(|(index, _)| index)
            .collect();
        match matches.as_slice() {
            [] => Err(AbiError::UnknownFunction(key.to_string())),
            [index] => Ok(*index),
            _ => Err(AbiError::AmbiguousFunction {
                name: key.to_string(),
                candidates: matches
                    .iter()
                    .filter_map(|index| self.functions().nth(*index))
                    .map(InvocableFunction::signature)
                    .collect(),
            }),
        }
    }
}

/// Appends the encoded constructor arguments to `bytecode`.
///
/// Arguments without a constructor in the ABI are an error.
pub fn encode_deploy_code<S: AsRef<str>>(
    abi: &JsonAbi,
    bytecode: &Bytes,
    args: &[S],
) -> Result<Bytes, AbiError> {
    let Some(constructor) = &abi.constructor else {
        if !args.is_empty() {
            return Err(AbiError::ArgumentCount { expected: 0, got: args.len() });
        }
        return Ok(bytecode.clone());
    };

    let params =
        constructor.inputs.iter().map(AbiParam::from_param).collect::<Result<Vec<_>, _>>()?;
    let values = coerce_params(&params, args)?;
    let encoded =
        constructor.abi_encode_input(&values).map_err(|err| AbiError::Encode(err.to_string()))?;
    Ok(bytecode.iter().copied().chain(encoded).collect())
}
