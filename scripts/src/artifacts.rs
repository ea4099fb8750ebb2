//! Loading of compiled contract artifacts, and typing of constructor
//! arguments against their ABIs

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    json_abi::{JsonAbi, Param},
    primitives::{Bytes, I256, U256},
};
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    constants::{ARTIFACT_EXTENSION, BUILD_INFO_DIR, DEBUG_ARTIFACT_SUFFIX},
    errors::ScriptError,
    plan::ConstructorArg,
};

/// A compiled contract, in the Hardhat artifact format
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The name of the contract
    pub contract_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }

    /// The constructor's parameters, empty if the contract declares no
    /// constructor
    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default()
    }

    /// Type the given resolved constructor arguments against the
    /// constructor's ABI
    pub fn constructor_values(
        &self,
        args: &[ConstructorArg],
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let inputs = self.constructor_inputs();
        if inputs.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "{} constructor takes {} arguments, plan provides {}",
                self.contract_name,
                inputs.len(),
                args.len()
            )));
        }

        inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = DynSolType::parse(&param.ty)
                    .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
                typed_value(arg, &ty).map_err(|reason| {
                    ScriptError::CalldataConstruction(format!(
                        "{} constructor argument `{}`: {}",
                        self.contract_name, param.name, reason
                    ))
                })
            })
            .collect()
    }
}

/// Convert a resolved argument into a value of the given Solidity type
fn typed_value(arg: &ConstructorArg, ty: &DynSolType) -> Result<DynSolValue, String> {
    match (arg, ty) {
        (ConstructorArg::Address(address), DynSolType::Address) => {
            Ok(DynSolValue::Address(*address))
        }
        (ConstructorArg::Integer(value), DynSolType::Uint(bits)) => {
            if value.bit_len() > *bits {
                return Err(format!("{} does not fit in uint{}", value, bits));
            }
            Ok(DynSolValue::Uint(*value, *bits))
        }
        (ConstructorArg::Integer(value), DynSolType::Int(bits)) => {
            let signed = I256::try_from(*value).map_err(|e| e.to_string())?;
            if value.bit_len() >= *bits {
                return Err(format!("{} does not fit in int{}", value, bits));
            }
            Ok(DynSolValue::Int(signed, *bits))
        }
        (ConstructorArg::Integer(value), DynSolType::Bool) if *value <= U256::from(1) => {
            Ok(DynSolValue::Bool(!value.is_zero()))
        }
        (ConstructorArg::String(s), DynSolType::String) => Ok(DynSolValue::String(s.clone())),
        (ConstructorArg::Deployed(name), _) => Err(format!("unresolved reference to {}", name)),
        (arg, ty) => Err(format!("cannot pass {} as {}", arg, ty.sol_type_name())),
    }
}

/// The compiled artifacts of the contracts in a deployment
#[derive(Debug, Default)]
pub struct ArtifactStore {
    /// The artifacts, keyed by contract name
    artifacts: HashMap<String, ContractArtifact>,
}

impl ArtifactStore {
    /// Build a store from already-parsed artifacts
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ContractArtifact>) -> Self {
        Self {
            artifacts: artifacts
                .into_iter()
                .map(|a| (a.contract_name.clone(), a))
                .collect(),
        }
    }

    /// Load the artifacts of the named contracts from a Hardhat artifacts
    /// directory, i.e. `<dir>/**/<Name>.sol/<Name>.json`
    pub fn load<'a>(
        artifacts_dir: &Path,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ScriptError> {
        let mut paths = HashMap::new();
        index_artifacts(artifacts_dir, &mut paths)?;

        let artifacts = names
            .into_iter()
            .map(|name| {
                let path = match paths.get(name).map(Vec::as_slice) {
                    Some([path]) => path,
                    Some(found) if !found.is_empty() => {
                        let found = found.iter().map(|p| p.display().to_string()).join(", ");
                        return Err(ScriptError::ArtifactParsing(format!(
                            "{} is ambiguous, found at: {}",
                            name, found
                        )));
                    }
                    _ => {
                        return Err(ScriptError::ArtifactParsing(format!(
                            "no artifact for {} in {}",
                            name,
                            artifacts_dir.display()
                        )))
                    }
                };
                let json = fs::read_to_string(path)
                    .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
                ContractArtifact::from_json(&json)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_artifacts(artifacts))
    }

    /// Get the artifact of the named contract
    pub fn get(&self, name: &str) -> Result<&ContractArtifact, ScriptError> {
        self.artifacts
            .get(name)
            .ok_or_else(|| ScriptError::ArtifactParsing(format!("no artifact loaded for {}", name)))
    }
}

/// Recursively index the artifact files under `dir` by contract name.
/// A name compiled from more than one source maps to every path found.
fn index_artifacts(
    dir: &Path,
    paths: &mut HashMap<String, Vec<PathBuf>>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ScriptError::ArtifactParsing(format!("error reading {}: {}", dir.display(), e))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
            .path();

        if path.is_dir() {
            if !path.ends_with(BUILD_INFO_DIR) {
                index_artifacts(&path, paths)?;
            }
            continue;
        }

        let is_artifact = path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
            && !path.to_string_lossy().ends_with(DEBUG_ARTIFACT_SUFFIX);
        if let (true, Some(stem)) = (is_artifact, path.file_stem()) {
            let name = stem.to_string_lossy().into_owned();
            paths.entry(name).or_default().push(path.clone());
        }
    }

    Ok(())
}
