use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::builtin;
use crate::config::RegistryConfig;
use crate::error::{PackError, Result};
use crate::packer::{same_packer, PackerRef};

/// Outcome of resolving a type id during decode.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// The sentinel: decode with the heterogeneous-map packer itself.
    Nested,
    /// A builtin or custom packer.
    Packer(PackerRef),
}

/// Session-scoped table of custom packers, consulted after the builtin ids.
///
/// Built once during session setup and then shared read-only, usually as an
/// `Arc<TypeRegistry>` inside one or more
/// [`HeteroMapPacker`](crate::HeteroMapPacker)s.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    custom: HashMap<i32, PackerRef>,
    config: RegistryConfig,
}

impl TypeRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            custom: HashMap::new(),
            config,
        }
    }

    /// Build a registry from a set of custom packers.
    pub fn from_packers(packers: impl IntoIterator<Item = PackerRef>) -> Result<Self> {
        Self::from_packers_with_config(packers, RegistryConfig::default())
    }

    /// Build a registry from a set of custom packers with explicit config.
    pub fn from_packers_with_config(
        packers: impl IntoIterator<Item = PackerRef>,
        config: RegistryConfig,
    ) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for packer in packers {
            registry.register(packer)?;
        }
        Ok(registry)
    }

    /// Bind a custom packer to its own type id.
    ///
    /// Registering the same instance twice is a no-op. A different packer
    /// under a bound id is `DuplicateTypeId`; builtin ids and the sentinel
    /// are `ReservedTypeId`.
    pub fn register(&mut self, packer: PackerRef) -> Result<()> {
        let id = packer.tag();
        if builtin::is_reserved(id) {
            return Err(PackError::ReservedTypeId(id));
        }
        if let Some(existing) = self.custom.get(&id) {
            if same_packer(existing, &packer) {
                return Ok(());
            }
            return Err(PackError::DuplicateTypeId(id));
        }

        debug!(type_id = id, ?packer, "registered custom packer");
        self.custom.insert(id, packer);
        Ok(())
    }

    /// Whether a custom packer is bound to `id`. Builtin ids are not custom.
    pub fn contains(&self, id: i32) -> bool {
        self.custom.contains_key(&id)
    }

    /// Custom ids, ascending.
    pub fn ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.custom.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolve a wire type id: sentinel first, then builtin, then custom.
    pub fn resolve(&self, id: i32) -> Result<Resolved> {
        if id == builtin::HETERO_MAP {
            return Ok(Resolved::Nested);
        }
        if let Some(packer) = builtin::get(id) {
            return Ok(Resolved::Packer(packer));
        }
        match self.custom.get(&id) {
            Some(packer) => Ok(Resolved::Packer(Arc::clone(packer))),
            None => {
                debug!(type_id = id, "unknown type id");
                Err(PackError::UnknownTypeId(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ListOf;
    use crate::primitive::Int32;
    use crate::varlen::Str;

    fn custom(id: i32) -> PackerRef {
        Arc::new(ListOf::new(id, Str))
    }

    #[test]
    fn resolution_order() {
        let registry = TypeRegistry::from_packers([custom(1000)]).unwrap();

        assert!(matches!(registry.resolve(998).unwrap(), Resolved::Nested));
        match registry.resolve(builtin::INT32).unwrap() {
            Resolved::Packer(packer) => assert!(same_packer(&packer, &builtin::int32())),
            Resolved::Nested => panic!("builtin resolved as nested"),
        }
        match registry.resolve(1000).unwrap() {
            Resolved::Packer(packer) => assert_eq!(packer.tag(), 1000),
            Resolved::Nested => panic!("custom resolved as nested"),
        }
    }

    #[test]
    fn unknown_id() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.resolve(4242),
            Err(PackError::UnknownTypeId(4242))
        ));
    }

    #[test]
    fn duplicate_id_rejected_at_setup() {
        let mut registry = TypeRegistry::new();
        registry.register(custom(1000)).unwrap();
        let err = registry.register(custom(1000)).unwrap_err();
        assert!(matches!(err, PackError::DuplicateTypeId(1000)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_instance_is_idempotent() {
        let packer = custom(1001);
        let mut registry = TypeRegistry::new();
        registry.register(Arc::clone(&packer)).unwrap();
        registry.register(packer).unwrap();
        assert_eq!(registry.ids(), vec![1001]);
    }

    #[test]
    fn reserved_ids_rejected() {
        let mut registry = TypeRegistry::new();
        for id in [builtin::INT32, builtin::LIST_OF_STR, builtin::MAP_OF_STR_STR, 998] {
            let err = registry.register(custom(id)).unwrap_err();
            assert!(matches!(err, PackError::ReservedTypeId(got) if got == id));
        }
        // Int32 tags itself with a builtin id.
        assert!(registry.register(Arc::new(Int32)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_sorted_and_contains() {
        let registry =
            TypeRegistry::from_packers([custom(3000), custom(10), custom(1200)]).unwrap();
        assert_eq!(registry.ids(), vec![10, 1200, 3000]);
        assert!(registry.contains(1200));
        assert!(!registry.contains(builtin::STR));
    }

    #[test]
    fn keeps_config() {
        let config = RegistryConfig {
            max_depth: 4,
            ..RegistryConfig::default()
        };
        assert_eq!(TypeRegistry::with_config(config).config().max_depth, 4);
    }
}
