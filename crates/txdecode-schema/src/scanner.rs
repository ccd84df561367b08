//! Unknown-field scanner.
//!
//! Walks raw records against a descriptor without building any message and
//! rejects field numbers the schema does not declare. The walk recurses into
//! every declared message-typed field using the referenced descriptor, and
//! through every `Any` into the message it packs. Packed payloads are always
//! walked strictly, whatever the tolerance of the enclosing message.

use tracing::trace;
use txdecode_canonical::{FieldValue, WireError, WireReader, WireType};

use crate::any::{is_any, PackedAny};
use crate::descriptor::{FieldKind, MessageDescriptor};
use crate::errors::SchemaError;
use crate::limits::{Budget, WalkLimits};
use crate::registry::DescriptorResolver;

/// How undeclared field numbers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// Every undeclared field number is an error.
    Strict,
    /// Undeclared numbers inside a descriptor's non-critical ranges are
    /// skipped and flagged; all others are errors.
    Lenient,
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    /// At least one tolerated non-critical field was skipped.
    pub has_unknown_non_criticals: bool,
    /// Field records visited across all nesting levels.
    pub fields_visited: usize,
    /// Deepest nesting level reached; the top-level message is 1.
    pub max_depth_reached: usize,
}

/// Scans `bytes` as an encoding of `descriptor`.
pub fn scan(
    bytes: &[u8],
    descriptor: &MessageDescriptor,
    resolver: &dyn DescriptorResolver,
    tolerance: Tolerance,
    limits: WalkLimits,
) -> Result<ScanReport, SchemaError> {
    let mut budget = Budget::new(limits);
    let mut report = ScanReport::default();
    walk(bytes, descriptor, resolver, tolerance, &mut budget, &mut report)?;
    report.fields_visited = budget.fields();
    report.max_depth_reached = budget.deepest();
    Ok(report)
}

/// Shorthand for a [`Tolerance::Strict`] scan.
pub fn reject_unknown_fields_strict(
    bytes: &[u8],
    descriptor: &MessageDescriptor,
    resolver: &dyn DescriptorResolver,
    limits: WalkLimits,
) -> Result<ScanReport, SchemaError> {
    scan(bytes, descriptor, resolver, Tolerance::Strict, limits)
}

fn walk(
    bytes: &[u8],
    descriptor: &MessageDescriptor,
    resolver: &dyn DescriptorResolver,
    tolerance: Tolerance,
    budget: &mut Budget,
    report: &mut ScanReport,
) -> Result<(), SchemaError> {
    budget.enter()?;
    let wire_err = |source: WireError| SchemaError::Wire {
        message: descriptor.full_name.to_string(),
        source,
    };

    let mut reader = WireReader::new(bytes);
    while let Some(tag) = reader.read_tag().map_err(wire_err)? {
        budget.count_field()?;

        let Some(field) = descriptor.find_field(tag.number) else {
            if tolerance == Tolerance::Lenient && descriptor.is_non_critical(tag.number) {
                trace!(
                    message = %descriptor.full_name,
                    field = tag.number,
                    "skipping non-critical unknown field"
                );
                report.has_unknown_non_criticals = true;
                reader.read_value(&tag).map_err(wire_err)?;
                continue;
            }
            return Err(SchemaError::UnknownField {
                message: descriptor.full_name.to_string(),
                number: tag.number,
                wire_bits: tag.wire_bits,
            });
        };

        let (wire_type, value, _) = reader.read_value(&tag).map_err(wire_err)?;
        let expected = field.kind.wire_type();
        let packed = field.repeated
            && field.kind.is_packable()
            && wire_type == WireType::LengthDelimited;
        if wire_type != expected && !packed {
            return Err(SchemaError::WireTypeMismatch {
                message: descriptor.full_name.to_string(),
                field: field.name.clone(),
                number: field.number,
                expected,
                actual: wire_type,
            });
        }

        if let (FieldKind::Message(target), FieldValue::Bytes(data)) = (&field.kind, value) {
            let nested = resolver.find_message(target)?;
            walk(data, &nested, resolver, tolerance, budget, report)?;
            if is_any(target) {
                let packed = PackedAny::read(data)?;
                let payload = packed.descriptor(resolver)?;
                trace!(type_url = packed.type_url, "walking packed payload");
                walk(packed.value, &payload, resolver, Tolerance::Strict, budget, report)?;
            }
        }
    }

    budget.leave();
    Ok(())
}
