//! Per-parameter sensitivity metadata and its resolution.
//!
//! Sensitivity is declared up front (registration table or an explicit
//! descriptor on the call) and never discovered at call time. Every lookup
//! failure degrades to "nothing is sensitive" so a call is never hidden or
//! aborted by missing metadata.

use std::collections::HashMap;
use std::fmt;

use super::error::InstrumentError;

/// Sensitivity flags for the positional parameters of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitivityDescriptor {
    flags: Vec<bool>,
}

impl SensitivityDescriptor {
    /// Descriptor treating every parameter as non-sensitive.
    pub fn none() -> Self {
        Self { flags: Vec::new() }
    }

    pub fn new(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    /// Mark the given zero-based positions as sensitive out of `arity` parameters.
    ///
    /// Positions outside `0..arity` are ignored.
    pub fn with_sensitive(arity: usize, positions: &[usize]) -> Self {
        let mut flags = vec![false; arity];
        for &pos in positions {
            if let Some(flag) = flags.get_mut(pos) {
                *flag = true;
            }
        }
        Self { flags }
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True if any parameter is marked sensitive.
    pub fn any_sensitive(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Flags usable for a call with `arity` arguments.
    ///
    /// A length mismatch is treated as if no descriptor were present.
    pub fn aligned(&self, arity: usize) -> Option<&[bool]> {
        if self.flags.is_empty() || self.flags.len() != arity {
            return None;
        }
        Some(&self.flags)
    }
}

impl From<Vec<bool>> for SensitivityDescriptor {
    fn from(flags: Vec<bool>) -> Self {
        Self::new(flags)
    }
}

/// Identity of an instrumented operation as seen by the sensitivity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId {
    pub caller: String,
    pub operation: String,
    pub arity: usize,
}

impl OperationId {
    pub fn new(caller: impl Into<String>, operation: impl Into<String>, arity: usize) -> Self {
        Self {
            caller: caller.into(),
            operation: operation.into(),
            arity,
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}/{}", self.caller, self.operation, self.arity)
    }
}

/// External collaborator that knows which parameters of an operation are sensitive.
pub trait SensitivityResolver: Send + Sync {
    /// Resolve the descriptor for `operation`.
    ///
    /// An `Err` means "unknown"; the interceptor then proceeds with no redaction.
    fn resolve(&self, operation: &OperationId) -> Result<SensitivityDescriptor, InstrumentError>;
}

impl<F> SensitivityResolver for F
where
    F: Fn(&OperationId) -> Result<SensitivityDescriptor, InstrumentError> + Send + Sync,
{
    fn resolve(&self, operation: &OperationId) -> Result<SensitivityDescriptor, InstrumentError> {
        self(operation)
    }
}

/// Explicit registration table, filled once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SensitivityRegistry {
    entries: HashMap<OperationId, SensitivityDescriptor>,
}

impl SensitivityRegistry {
    pub fn builder() -> SensitivityRegistryBuilder {
        SensitivityRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SensitivityResolver for SensitivityRegistry {
    fn resolve(&self, operation: &OperationId) -> Result<SensitivityDescriptor, InstrumentError> {
        self.entries
            .get(operation)
            .cloned()
            .ok_or_else(|| InstrumentError::SensitivityResolution {
                operation: operation.to_string(),
                reason: "operation not registered".to_string(),
            })
    }
}

/// Builder for [`SensitivityRegistry`].
#[derive(Debug, Default)]
pub struct SensitivityRegistryBuilder {
    entries: HashMap<OperationId, SensitivityDescriptor>,
}

impl SensitivityRegistryBuilder {
    /// Register an operation; its arity is the number of flags given.
    ///
    /// Registering the same operation twice keeps the last descriptor.
    pub fn register(
        mut self,
        caller: impl Into<String>,
        operation: impl Into<String>,
        flags: Vec<bool>,
    ) -> Self {
        let id = OperationId::new(caller, operation, flags.len());
        self.entries.insert(id, SensitivityDescriptor::new(flags));
        self
    }

    pub fn build(self) -> SensitivityRegistry {
        SensitivityRegistry {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_accepts_matching_length() {
        let desc = SensitivityDescriptor::new(vec![false, true]);
        assert_eq!(desc.aligned(2), Some(&[false, true][..]));
    }

    #[test]
    fn test_aligned_fails_open_on_mismatch() {
        let desc = SensitivityDescriptor::new(vec![true]);
        assert_eq!(desc.aligned(3), None);
        assert_eq!(SensitivityDescriptor::none().aligned(0), None);
    }

    #[test]
    fn test_with_sensitive_ignores_out_of_range() {
        let desc = SensitivityDescriptor::with_sensitive(3, &[1, 7]);
        assert_eq!(desc.flags(), &[false, true, false]);
        assert!(desc.any_sensitive());
        assert!(!SensitivityDescriptor::with_sensitive(2, &[]).any_sensitive());
    }

    #[test]
    fn test_operation_id_display() {
        let id = OperationId::new("Bank", "transfer", 2);
        assert_eq!(id.to_string(), "Bank::transfer/2");
    }

    #[test]
    fn test_registry_resolves_registered_operation() {
        let registry = SensitivityRegistry::builder()
            .register("Bank", "transfer", vec![false, true])
            .build();
        let desc = registry
            .resolve(&OperationId::new("Bank", "transfer", 2))
            .unwrap();
        assert_eq!(desc.flags(), &[false, true]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_unknown_operation_is_error() {
        let registry = SensitivityRegistry::builder()
            .register("Bank", "transfer", vec![false, true])
            .build();
        // Same name, different arity: a different overload.
        let err = registry
            .resolve(&OperationId::new("Bank", "transfer", 3))
            .unwrap_err();
        assert!(err.is_fail_open());
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |op: &OperationId| -> Result<SensitivityDescriptor, InstrumentError> {
            Ok(SensitivityDescriptor::with_sensitive(op.arity, &[0]))
        };
        let desc = resolver.resolve(&OperationId::new("Vault", "open", 1)).unwrap();
        assert_eq!(desc.flags(), &[true]);
    }
}
