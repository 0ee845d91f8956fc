use std::net::IpAddr;
use std::ops::Range;

use serde::{Serialize, Serializer};

use super::template::FieldSpec;

/// Header shape a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderForm {
    /// Type and length fields on the wire (TLV).
    Explicit,
    /// Type byte only; length from a static table (TV).
    Implicit,
    /// No per-field header; layout taken from a template.
    Template,
}

/// Decoded payload of one record.
///
/// Values own their bytes; nothing here borrows from the message buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Unrecognized type kept as raw bytes.
    Opaque(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    /// Recognized type whose value is an uninterpreted byte string.
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    Unsigned(u64),
    Text(String),
    Address(IpAddr),
    /// Value is the attribute's children.
    Nested,
    /// Outer discriminator (vendor id, subtype, ...) wrapping the inner value.
    Namespaced {
        key: u64,
        inner: Box<AttributeValue>,
    },
    /// Template announced by this record.
    TemplateDefinition {
        template_id: u16,
        scope_field_count: usize,
        fields: Vec<FieldSpec>,
    },
    /// Body referencing a template that is not in the cache.
    Unresolved {
        template_id: u16,
        #[serde(serialize_with = "serialize_hex")]
        bytes: Vec<u8>,
    },
}

impl AttributeValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Opaque(bytes) | AttributeValue::Bytes(bytes) => Some(bytes),
            AttributeValue::Unresolved { bytes, .. } => Some(bytes),
            AttributeValue::Namespaced { inner, .. } => inner.as_bytes(),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            AttributeValue::Unsigned(value) => Some(*value),
            AttributeValue::Namespaced { inner, .. } => inner.as_unsigned(),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, AttributeValue::Opaque(_))
    }
}

/// One decoded record and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub type_code: u32,
    /// Header flag bits outside the type mask (e.g. netlink `NLA_F_NESTED`).
    #[serde(skip_serializing_if = "is_zero")]
    pub flags: u32,
    pub form: HeaderForm,
    /// Length announced by the header (or table/template), header included.
    pub declared_len: usize,
    pub header_len: usize,
    /// Header bytes plus value bytes the handler actually consumed.
    pub consumed_len: usize,
    /// Header + value bytes of the record inside the message buffer.
    #[serde(serialize_with = "serialize_range")]
    pub span: Range<usize>,
    /// Alignment bytes skipped after the record.
    #[serde(skip_serializing_if = "is_zero_usize")]
    pub padding: usize,
    pub value: AttributeValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Attribute>,
}

impl Attribute {
    /// Value bytes inside the span.
    pub fn value_len(&self) -> usize {
        self.span.len().saturating_sub(self.header_len)
    }

    /// First child with `type_code`, searching one level down.
    pub fn child(&self, type_code: u32) -> Option<&Attribute> {
        self.children.iter().find(|c| c.type_code == type_code)
    }

    /// End of the record including alignment padding.
    pub fn padded_end(&self) -> usize {
        self.span.end + self.padding
    }
}

/// Accumulates completed attributes for one nesting level, in document order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Attribute>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.nodes.push(attribute);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<&Attribute> {
        self.nodes.last()
    }

    pub fn finish(self) -> Vec<Attribute> {
        self.nodes
    }
}

/// Depth-first visit of a tree, parents before children.
pub fn visit<'a>(tree: &'a [Attribute], f: &mut impl FnMut(&'a Attribute, usize)) {
    fn go<'a>(nodes: &'a [Attribute], depth: usize, f: &mut impl FnMut(&'a Attribute, usize)) {
        for node in nodes {
            f(node, depth);
            go(&node.children, depth + 1, f);
        }
    }
    go(tree, 0, f);
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn serialize_range<S: Serializer>(range: &Range<usize>, serializer: S) -> Result<S::Ok, S::Error> {
    [range.start, range.end].serialize(serializer)
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_zero_usize(value: &usize) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::{Attribute, AttributeValue, HeaderForm, TreeBuilder, visit};

    fn leaf(type_code: u32, start: usize, value: &[u8]) -> Attribute {
        Attribute {
            type_code,
            flags: 0,
            form: HeaderForm::Explicit,
            declared_len: 4 + value.len(),
            header_len: 4,
            consumed_len: 4 + value.len(),
            span: start..start + 4 + value.len(),
            padding: 0,
            value: AttributeValue::Bytes(value.to_vec()),
            children: Vec::new(),
        }
    }

    #[test]
    fn builder_keeps_document_order() {
        let mut builder = TreeBuilder::new();
        builder.push(leaf(2, 0, b"ab"));
        builder.push(leaf(1, 8, b"cd"));
        let nodes = builder.finish();
        assert_eq!(nodes[0].type_code, 2);
        assert_eq!(nodes[1].type_code, 1);
    }

    #[test]
    fn header_and_value_lengths() {
        let attr = leaf(1, 0, b"abcd");
        assert_eq!(attr.header_len, 4);
        assert_eq!(attr.value_len(), 4);
    }

    #[test]
    fn visit_is_depth_first() {
        let mut parent = leaf(1, 0, b"");
        parent.value = AttributeValue::Nested;
        parent.children = vec![leaf(2, 4, b"x"), leaf(3, 12, b"y")];
        let mut seen = Vec::new();
        visit(&[parent, leaf(4, 20, b"z")], &mut |attr, depth| {
            seen.push((attr.type_code, depth))
        });
        assert_eq!(seen, vec![(1, 0), (2, 1), (3, 1), (4, 0)]);
    }

    #[test]
    fn bytes_serialize_as_hex() {
        let value = serde_json::to_value(leaf(7, 0, &[0xde, 0xad])).unwrap();
        assert_eq!(value["value"]["kind"], "bytes");
        assert_eq!(value["value"]["data"], "dead");
        assert_eq!(value["span"][1], 6);
        assert!(value.get("children").is_none());
        assert!(value.get("flags").is_none());
    }
}
