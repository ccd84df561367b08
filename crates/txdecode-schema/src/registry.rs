use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use txdecode_canonical::wire::{MAX_FIELD_NUMBER, MIN_FIELD_NUMBER};
use txdecode_canonical::FullName;

use crate::descriptor::{FieldKind, FileDescriptor, MessageDescriptor};
use crate::errors::SchemaError;

/// Field numbers protobuf reserves for its own implementation.
const IMPLEMENTATION_RESERVED: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Name → descriptor lookup used while walking nested messages.
pub trait DescriptorResolver: Send + Sync {
    /// Returns the descriptor registered under `name`.
    fn find_message(&self, name: &FullName) -> Result<Arc<MessageDescriptor>, SchemaError>;
}

/// Import-aware registry of schema files.
///
/// Registration order matters: a file can only be registered after every
/// file it imports. Once built, the registry is meant to be shared
/// read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: BTreeMap<String, FileDescriptor>,
    messages: HashMap<FullName, Arc<MessageDescriptor>>,
}

impl FileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the transaction envelope schema.
    pub fn with_envelope() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.register_all(crate::envelope::files()?)?;
        Ok(registry)
    }

    /// Registers several files in order.
    pub fn register_all(
        &mut self,
        files: impl IntoIterator<Item = FileDescriptor>,
    ) -> Result<(), SchemaError> {
        for file in files {
            self.register(file)?;
        }
        Ok(())
    }

    /// Registers one file after checking it against everything already known.
    pub fn register(&mut self, mut file: FileDescriptor) -> Result<(), SchemaError> {
        if self.files.contains_key(&file.name) {
            return Err(SchemaError::DuplicateFile(file.name));
        }
        for import in &file.imports {
            if !self.files.contains_key(import) {
                return Err(SchemaError::MissingImport {
                    file: file.name.clone(),
                    import: import.clone(),
                });
            }
        }

        let mut declared = BTreeSet::new();
        for message in &file.messages {
            let name = &message.full_name;
            if self.messages.contains_key(name) || !declared.insert(name.clone()) {
                return Err(SchemaError::DuplicateMessage(name.to_string()));
            }
            if !file.package.is_empty() && !name.as_str().starts_with(&format!("{}.", file.package))
            {
                return Err(SchemaError::InvalidDescriptor {
                    message: name.to_string(),
                    reason: format!("not inside package {}", file.package),
                });
            }
        }

        let visible = self.visible_names(&file, &declared);
        for message in &mut file.messages {
            message.fields.sort_by_key(|f| f.number);
            check_message(message)?;
            for field in &message.fields {
                if let FieldKind::Message(target) = &field.kind {
                    if !visible.contains(target) {
                        return Err(SchemaError::UnresolvedReference {
                            file: file.name.clone(),
                            message: message.full_name.to_string(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }

        for message in &file.messages {
            self.messages
                .insert(message.full_name.clone(), Arc::new(message.clone()));
        }
        self.files.insert(file.name.clone(), file);
        Ok(())
    }

    /// Names a file can reference: its own messages and those of its direct imports.
    fn visible_names(
        &self,
        file: &FileDescriptor,
        declared: &BTreeSet<FullName>,
    ) -> BTreeSet<FullName> {
        let mut visible = declared.clone();
        for import in &file.imports {
            if let Some(imported) = self.files.get(import) {
                visible.extend(imported.messages.iter().map(|m| m.full_name.clone()));
            }
        }
        visible
    }

    /// Looks up a message descriptor.
    pub fn find_message(&self, name: &FullName) -> Result<Arc<MessageDescriptor>, SchemaError> {
        self.messages
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::DescriptorNotFound(name.to_string()))
    }

    /// Whether a file with this name is registered.
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Registered files, ordered by name.
    pub fn files(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.values()
    }

    /// Registered message descriptors, in no particular order.
    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.messages.values()
    }

    /// Number of registered messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl DescriptorResolver for FileRegistry {
    fn find_message(&self, name: &FullName) -> Result<Arc<MessageDescriptor>, SchemaError> {
        FileRegistry::find_message(self, name)
    }
}

fn check_message(message: &MessageDescriptor) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidDescriptor {
        message: message.full_name.to_string(),
        reason,
    };

    let mut numbers = BTreeSet::new();
    let mut names = BTreeSet::new();
    for field in &message.fields {
        if field.number < MIN_FIELD_NUMBER || field.number > MAX_FIELD_NUMBER {
            return Err(invalid(format!("field number {} out of range", field.number)));
        }
        if IMPLEMENTATION_RESERVED.contains(&field.number) {
            return Err(invalid(format!("field number {} is reserved", field.number)));
        }
        if !numbers.insert(field.number) {
            return Err(invalid(format!("field number {} declared twice", field.number)));
        }
        if field.name.is_empty() || !names.insert(field.name.as_str()) {
            return Err(invalid(format!("field name '{}' empty or declared twice", field.name)));
        }
    }

    for signer in &message.signer_fields {
        let Some(field) = message.find_field_by_name(signer) else {
            return Err(invalid(format!("signer field '{}' is not declared", signer)));
        };
        let carries_address = matches!(
            field.kind,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_)
        );
        if !carries_address {
            return Err(invalid(format!(
                "signer field '{}' must be string, bytes or message",
                signer
            )));
        }
    }
    Ok(())
}
