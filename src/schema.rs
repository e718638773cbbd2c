/// Static description of a GATT characteristic and its packet layout
use crate::codec::FieldType;

/// Access a characteristic supports on the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Notify,
    Read,
    Write,
}

/// One field of a characteristic packet: wire type plus output name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub name: &'static str,
}

impl FieldSpec {
    pub const fn new(field_type: FieldType, name: &'static str) -> Self {
        Self { field_type, name }
    }
}

/// Immutable schema for one sensor characteristic
///
/// Fields are decoded in declaration order; their names key both the decoded
/// records and the per-field windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSchema {
    pub id: &'static str,
    pub uuid: &'static str,
    pub capabilities: &'static [Capability],
    pub fields: &'static [FieldSpec],
}

impl CharacteristicSchema {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Minimum packet length that holds every field
    pub fn packet_len(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.width()).sum()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UI: CharacteristicSchema = CharacteristicSchema {
        id: "TestUI",
        uuid: "00000000-0000-0000-0000-000000000000",
        capabilities: &[Capability::Notify, Capability::Write],
        fields: &[
            FieldSpec::new(FieldType::UInt16, "a"),
            FieldSpec::new(FieldType::Int8, "b"),
            FieldSpec::new(FieldType::Float32, "c"),
        ],
    };

    #[test]
    fn packet_len_sums_field_widths() {
        assert_eq!(UI.packet_len(), 7);
    }

    #[test]
    fn capabilities_and_names() {
        assert!(UI.has(Capability::Notify));
        assert!(UI.has(Capability::Write));
        assert!(!UI.has(Capability::Read));
        assert_eq!(UI.field_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
