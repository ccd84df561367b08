//! Signing-rule registry.
//!
//! Maps message types to the procedure that extracts their required
//! signers from a [`DynamicMessage`]. Rules see only the generic message,
//! so signer extraction works for types with no compiled-in Rust type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use txdecode_canonical::FullName;
use txdecode_schema::{DynamicMessage, FieldKind, FileRegistry, MessageDescriptor, Value};

use crate::address::AddressCodec;
use crate::errors::SignerError;

/// Extracts the ordered signer addresses of one message type.
pub trait SignerRule: Send + Sync {
    /// Returns raw signer addresses in rule order. `ctx` gives access to
    /// the address codec and to the rules of nested message types.
    fn signers(
        &self,
        msg: &DynamicMessage,
        ctx: &SigningRegistry,
    ) -> Result<Vec<Vec<u8>>, SignerError>;
}

impl<F> SignerRule for F
where
    F: Fn(&DynamicMessage) -> Result<Vec<Vec<u8>>, SignerError> + Send + Sync,
{
    fn signers(
        &self,
        msg: &DynamicMessage,
        _ctx: &SigningRegistry,
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        self(msg)
    }
}

/// Rule reading the fields a descriptor names in `signer_fields`.
///
/// `bytes` values are taken as raw addresses, `string` values go through the
/// registry's address codec, and message values defer to the nested type's
/// own rule. Repeated fields yield one signer per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSignerRule {
    fields: Vec<String>,
}

impl FieldSignerRule {
    /// Rule over the named fields, in order.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Rule for a descriptor that declares signer fields.
    pub fn from_descriptor(descriptor: &MessageDescriptor) -> Option<Self> {
        if descriptor.signer_fields.is_empty() {
            None
        } else {
            Some(Self::new(descriptor.signer_fields.clone()))
        }
    }

    fn extract(
        msg: &DynamicMessage,
        field: &str,
        value: &Value,
        ctx: &SigningRegistry,
        out: &mut Vec<Vec<u8>>,
    ) -> Result<(), SignerError> {
        let empty = || SignerError::EmptySigner {
            message: msg.full_name().to_string(),
            field: field.to_string(),
        };
        match value {
            Value::Bytes(bytes) if bytes.is_empty() => return Err(empty()),
            Value::Bytes(bytes) => out.push(bytes.clone()),
            Value::Str(text) if text.is_empty() => return Err(empty()),
            Value::Str(text) => out.push(ctx.address_codec().string_to_bytes(text)?),
            Value::Message(nested) => out.extend(ctx.get_signers(nested)?),
            Value::List(items) => {
                for item in items {
                    Self::extract(msg, field, item, ctx, out)?;
                }
            }
            _ => {
                return Err(SignerError::UnsupportedField {
                    message: msg.full_name().to_string(),
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }
}

impl SignerRule for FieldSignerRule {
    fn signers(
        &self,
        msg: &DynamicMessage,
        ctx: &SigningRegistry,
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        let mut out = Vec::new();
        for name in &self.fields {
            let field = msg.descriptor().find_field_by_name(name).ok_or_else(|| {
                SignerError::UnsupportedField {
                    message: msg.full_name().to_string(),
                    field: name.clone(),
                }
            })?;
            if matches!(
                field.kind,
                FieldKind::String | FieldKind::Bytes | FieldKind::Message(_)
            ) {
                match msg.get(field.number) {
                    Some(value) => Self::extract(msg, name, value, ctx, &mut out)?,
                    None if field.repeated => {}
                    None => {
                        return Err(SignerError::EmptySigner {
                            message: msg.full_name().to_string(),
                            field: name.clone(),
                        })
                    }
                }
            } else {
                return Err(SignerError::UnsupportedField {
                    message: msg.full_name().to_string(),
                    field: name.clone(),
                });
            }
        }
        Ok(out)
    }
}

/// Type name → signer rule, plus the address codec rules share.
///
/// Built once and shared read-only.
pub struct SigningRegistry {
    codec: Arc<dyn AddressCodec>,
    rules: HashMap<FullName, Arc<dyn SignerRule>>,
}

impl SigningRegistry {
    /// Starts a builder.
    pub fn builder() -> SigningRegistryBuilder {
        SigningRegistryBuilder::default()
    }

    /// The codec used for string addresses.
    pub fn address_codec(&self) -> &dyn AddressCodec {
        self.codec.as_ref()
    }

    /// Whether a rule is registered for `name`.
    pub fn has_rule(&self, name: &FullName) -> bool {
        self.rules.contains_key(name)
    }

    /// Runs the rule registered for the message's type.
    pub fn get_signers(&self, msg: &DynamicMessage) -> Result<Vec<Vec<u8>>, SignerError> {
        let rule = self
            .rules
            .get(msg.full_name())
            .ok_or_else(|| SignerError::NoRule(msg.full_name().to_string()))?;
        rule.signers(msg, self)
    }
}

impl fmt::Debug for SigningRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.rules.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("SigningRegistry")
            .field("codec", &self.codec)
            .field("rules", &names)
            .finish()
    }
}

/// Builder for [`SigningRegistry`].
#[derive(Default)]
pub struct SigningRegistryBuilder {
    codec: Option<Arc<dyn AddressCodec>>,
    rules: HashMap<FullName, Arc<dyn SignerRule>>,
}

impl SigningRegistryBuilder {
    /// Sets the address codec.
    pub fn address_codec(mut self, codec: impl AddressCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Registers `rule` for `name`, replacing any earlier rule.
    pub fn rule(mut self, name: FullName, rule: impl SignerRule + 'static) -> Self {
        self.rules.insert(name, Arc::new(rule));
        self
    }

    /// Registers a [`FieldSignerRule`] for every message in `registry` that
    /// declares signer fields and has no rule yet.
    pub fn rules_from_descriptors(mut self, registry: &FileRegistry) -> Self {
        for descriptor in registry.messages() {
            if self.rules.contains_key(&descriptor.full_name) {
                continue;
            }
            if let Some(rule) = FieldSignerRule::from_descriptor(descriptor) {
                self.rules
                    .insert(descriptor.full_name.clone(), Arc::new(rule));
            }
        }
        self
    }

    /// Finishes the registry.
    pub fn build(self) -> Result<SigningRegistry, SignerError> {
        let codec = self.codec.ok_or(SignerError::MissingAddressCodec)?;
        Ok(SigningRegistry {
            codec,
            rules: self.rules,
        })
    }
}
