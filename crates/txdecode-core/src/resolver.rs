//! Concrete-type resolution.
//!
//! The decoder hands every body message to a [`TypeResolver`] for a fresh
//! native prototype and to a [`MessageCodec`] to populate it. Two
//! implementations ship here: [`ProstTypeRegistry`] for compiled `prost`
//! types, and [`SchemaTypeResolver`] for deployments that only have
//! runtime descriptors.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use txdecode_canonical::{FullName, TypeUrl};
use txdecode_schema::{DynamicMessage, FileRegistry, WalkLimits};

use crate::errors::ResolveError;

/// A natively-typed message instance.
pub trait ConcreteMessage: fmt::Debug + Send + Sync {
    /// Type URL of this instance's type.
    fn type_url(&self) -> String;
    /// Merges encoded bytes into this instance.
    fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), ResolveError>;
    /// The native value, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn ConcreteMessage {
    /// Borrows the native value as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Type identifier → fresh native prototype.
pub trait TypeResolver: Send + Sync {
    /// Returns an empty instance of the type `type_url` names.
    fn resolve(&self, type_url: &TypeUrl) -> Result<Box<dyn ConcreteMessage>, ResolveError>;
}

/// Populates a prototype from encoded bytes.
pub trait MessageCodec: Send + Sync {
    /// Decodes `bytes` into `target`.
    fn unmarshal(&self, bytes: &[u8], target: &mut dyn ConcreteMessage) -> Result<(), ResolveError>;
}

/// A `prost` message registered under a protobuf name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProstConcrete<T> {
    name: FullName,
    inner: T,
}

impl<T> ProstConcrete<T> {
    /// Consumes the wrapper.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> ConcreteMessage for ProstConcrete<T>
where
    T: prost::Message + Default + 'static,
{
    fn type_url(&self) -> String {
        self.name.to_type_url().to_string()
    }

    fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), ResolveError> {
        self.inner.merge(bytes).map_err(|e| ResolveError::Decode {
            type_url: self.type_url(),
            reason: e.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        &self.inner
    }
}

type Factory = Box<dyn Fn() -> Box<dyn ConcreteMessage> + Send + Sync>;

/// Registry of compiled `prost` message types keyed by protobuf name.
#[derive(Default)]
pub struct ProstTypeRegistry {
    factories: HashMap<FullName, Factory>,
}

impl ProstTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `name`.
    pub fn register<T>(&mut self, name: FullName) -> &mut Self
    where
        T: prost::Message + Default + 'static,
    {
        let key = name.clone();
        self.factories.insert(
            key,
            Box::new(move || -> Box<dyn ConcreteMessage> {
                Box::new(ProstConcrete {
                    name: name.clone(),
                    inner: T::default(),
                })
            }),
        );
        self
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &FullName) -> bool {
        self.factories.contains_key(name)
    }
}

impl fmt::Debug for ProstTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("ProstTypeRegistry").field("types", &names).finish()
    }
}

impl TypeResolver for ProstTypeRegistry {
    fn resolve(&self, type_url: &TypeUrl) -> Result<Box<dyn ConcreteMessage>, ResolveError> {
        let name = message_name(type_url)?;
        let factory = self
            .factories
            .get(&name)
            .ok_or_else(|| ResolveError::UnknownType(name.to_string()))?;
        Ok(factory())
    }
}

/// Decodes with the prototype's own protobuf decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProstCodec;

impl MessageCodec for ProstCodec {
    fn unmarshal(&self, bytes: &[u8], target: &mut dyn ConcreteMessage) -> Result<(), ResolveError> {
        target.merge_bytes(bytes)
    }
}

/// A [`DynamicMessage`] standing in for a native type.
#[derive(Debug, Clone)]
pub struct SchemaMessage {
    message: DynamicMessage,
    registry: Arc<FileRegistry>,
    limits: WalkLimits,
}

impl SchemaMessage {
    /// The generic message.
    pub fn message(&self) -> &DynamicMessage {
        &self.message
    }
}

impl ConcreteMessage for SchemaMessage {
    fn type_url(&self) -> String {
        self.message.full_name().to_type_url().to_string()
    }

    fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), ResolveError> {
        self.message
            .merge(bytes, self.registry.as_ref(), self.limits)
            .map_err(|e| ResolveError::Decode {
                type_url: self.message.full_name().to_type_url().to_string(),
                reason: e.to_string(),
            })
    }

    fn as_any(&self) -> &dyn Any {
        &self.message
    }
}

/// Resolves every type a [`FileRegistry`] knows into a [`SchemaMessage`].
#[derive(Debug, Clone)]
pub struct SchemaTypeResolver {
    registry: Arc<FileRegistry>,
    limits: WalkLimits,
}

impl SchemaTypeResolver {
    /// Resolver over `registry`, decoding under `limits`.
    pub fn new(registry: Arc<FileRegistry>, limits: WalkLimits) -> Self {
        Self { registry, limits }
    }
}

impl TypeResolver for SchemaTypeResolver {
    fn resolve(&self, type_url: &TypeUrl) -> Result<Box<dyn ConcreteMessage>, ResolveError> {
        let name = message_name(type_url)?;
        let descriptor = self
            .registry
            .find_message(&name)
            .map_err(|_| ResolveError::UnknownType(name.to_string()))?;
        Ok(Box::new(SchemaMessage {
            message: DynamicMessage::new(descriptor),
            registry: Arc::clone(&self.registry),
            limits: self.limits,
        }))
    }
}

fn message_name(type_url: &TypeUrl) -> Result<FullName, ResolveError> {
    type_url
        .message_name()
        .map_err(|_| ResolveError::InvalidTypeUrl(type_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::Coin;
    use prost::Message;
    use txdecode_schema::Value;

    fn coin_url() -> TypeUrl {
        TypeUrl::parse("/cosmos.base.v1beta1.Coin").unwrap()
    }

    #[test]
    fn prost_registry_resolves_and_decodes() {
        let mut registry = ProstTypeRegistry::new();
        registry.register::<Coin>(FullName::parse("cosmos.base.v1beta1.Coin").unwrap());

        let coin = Coin {
            denom: "uatom".into(),
            amount: "10".into(),
        };
        let mut proto = registry.resolve(&coin_url()).unwrap();
        ProstCodec
            .unmarshal(&coin.encode_to_vec(), proto.as_mut())
            .unwrap();

        assert_eq!(proto.type_url(), "/cosmos.base.v1beta1.Coin");
        assert_eq!(proto.downcast_ref::<Coin>(), Some(&coin));
    }

    #[test]
    fn prost_registry_rejects_unregistered_type() {
        let registry = ProstTypeRegistry::new();
        assert_eq!(
            registry.resolve(&coin_url()).unwrap_err(),
            ResolveError::UnknownType("cosmos.base.v1beta1.Coin".into())
        );
    }

    #[test]
    fn prost_codec_reports_bad_bytes() {
        let mut registry = ProstTypeRegistry::new();
        registry.register::<Coin>(FullName::parse("cosmos.base.v1beta1.Coin").unwrap());
        let mut proto = registry.resolve(&coin_url()).unwrap();
        let err = ProstCodec.unmarshal(&[0x0a, 0x05, b'a'], proto.as_mut()).unwrap_err();
        assert!(matches!(err, ResolveError::Decode { .. }));
    }

    #[test]
    fn schema_resolver_decodes_into_dynamic_message() {
        let files = Arc::new(FileRegistry::with_envelope().unwrap());
        let resolver = SchemaTypeResolver::new(files, WalkLimits::default());
        let coin = Coin {
            denom: "stake".into(),
            amount: "3".into(),
        };
        let mut proto = resolver
            .resolve(&TypeUrl::parse("type.googleapis.com/cosmos.base.v1beta1.Coin").unwrap())
            .unwrap();
        ProstCodec
            .unmarshal(&coin.encode_to_vec(), proto.as_mut())
            .unwrap();
        let dynamic = proto.downcast_ref::<DynamicMessage>().unwrap();
        assert_eq!(dynamic.get_by_name("denom"), Some(&Value::Str("stake".into())));
    }
}
