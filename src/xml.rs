//! Stripped XML structured codec.
//!
//! Produces element-only XML with no declaration and no namespaces. Leaf
//! text uses the same forms as the dedicated primitive codecs.

use crate::cache::{CodecCache, CodecFactory, SharedCodec, StructuredCodec};
use crate::descriptor::{PrimitiveKind, TypeDescriptor, TypeResolver};
use crate::error::{Result, SerializationError};
use crate::primitives::{decode_primitive, encode_primitive};
use crate::value::{PropertyBag, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::sync::Arc;

const BYTES_ELEMENT: &str = "base64Binary";
const BAG_ELEMENT: &str = "PropertyBag";
const PROPERTY_ELEMENT: &str = "Property";
const NAME_ATTRIBUTE: &str = "Name";
const TYPE_ATTRIBUTE: &str = "Type";

fn leaf_element(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Guid => "guid",
        PrimitiveKind::Int16 => "short",
        PrimitiveKind::Int32 => "int",
        PrimitiveKind::Int64 => "long",
        PrimitiveKind::Byte => "unsignedByte",
        PrimitiveKind::Decimal => "decimal",
        PrimitiveKind::Double => "double",
        PrimitiveKind::DateTime => "dateTime",
        PrimitiveKind::Boolean => "boolean",
        PrimitiveKind::Char => "char",
        PrimitiveKind::DbNull => "DBNull",
        PrimitiveKind::TimeSpan => "duration",
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

/// Element layout for one type, worked out once when the codec is built
#[derive(Debug, Clone)]
enum Plan {
    Leaf {
        element: &'static str,
        kind: PrimitiveKind,
    },
    Bytes,
    Array {
        element: String,
        item: Box<Plan>,
    },
    Object {
        type_name: String,
        element: String,
        fields: Vec<(String, Plan)>,
    },
    PropertyBag,
}

impl Plan {
    fn discover(descriptor: &TypeDescriptor) -> Result<Plan> {
        match descriptor {
            TypeDescriptor::Primitive(kind) => Ok(Plan::Leaf {
                element: leaf_element(*kind),
                kind: *kind,
            }),
            TypeDescriptor::Bytes => Ok(Plan::Bytes),
            TypeDescriptor::Array(item) => {
                if **item == TypeDescriptor::Primitive(PrimitiveKind::DbNull) {
                    return Err(SerializationError::unsupported(
                        descriptor.type_name(),
                        "arrays of the null marker have no representation",
                    ));
                }
                let item = Plan::discover(item)?;
                Ok(Plan::Array {
                    element: format!("ArrayOf{}", capitalize(item.element())),
                    item: Box::new(item),
                })
            }
            TypeDescriptor::PropertyBag => Ok(Plan::PropertyBag),
            TypeDescriptor::Object(schema) => {
                let name = schema.name();
                let element = name.rsplit('.').next().unwrap_or(name);
                if !is_xml_name(element) {
                    return Err(SerializationError::unsupported(
                        name,
                        format!("'{element}' is not a valid element name"),
                    ));
                }
                let fields = schema
                    .fields()
                    .iter()
                    .map(|field| {
                        if !is_xml_name(&field.name) {
                            return Err(SerializationError::unsupported(
                                name,
                                format!("field '{}' is not a valid element name", field.name),
                            ));
                        }
                        Ok((field.name.clone(), Plan::discover(&field.descriptor)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Plan::Object {
                    type_name: name.to_string(),
                    element: element.to_string(),
                    fields,
                })
            }
            TypeDescriptor::Opaque(name) => Err(SerializationError::unsupported(
                name,
                "type has no structure to encode",
            )),
        }
    }

    fn element(&self) -> &str {
        match self {
            Plan::Leaf { element, .. } => element,
            Plan::Bytes => BYTES_ELEMENT,
            Plan::Array { element, .. } | Plan::Object { element, .. } => element,
            Plan::PropertyBag => BAG_ELEMENT,
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds [`XmlCodec`]s. Property bag entries are resolved through `resolver`.
pub struct XmlCodecFactory {
    resolver: Arc<dyn TypeResolver>,
}

impl XmlCodecFactory {
    /// Factory whose property bag codecs resolve entry type names with `resolver`
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        Self { resolver }
    }
}

impl CodecFactory for XmlCodecFactory {
    fn build_codec(&self, descriptor: &TypeDescriptor) -> Result<Box<dyn StructuredCodec>> {
        let plan = Plan::discover(descriptor)?;
        Ok(Box::new(XmlCodec {
            type_name: descriptor.type_name(),
            plan,
            resolver: Arc::clone(&self.resolver),
        }))
    }
}

/// Structured codec for a single type.
///
/// Property bag entries are written by the codec the cache holds for the
/// entry's type, so each entry type is built once like any other.
pub struct XmlCodec {
    type_name: String,
    plan: Plan,
    resolver: Arc<dyn TypeResolver>,
}

impl StructuredCodec for XmlCodec {
    fn encode_structured(&self, value: &Value, cache: &CodecCache) -> Result<String> {
        let mut out = String::new();
        self.write(&mut out, &self.plan, self.plan.element(), value, cache)?;
        Ok(out)
    }

    fn decode_structured(&self, text: &str, cache: &CodecCache) -> Result<Value> {
        let document = Document::parse(text)
            .map_err(|e| SerializationError::malformed(text, &self.type_name, e))?;
        let root = document.root_element();
        self.expect_element(root, self.plan.element(), text)?;
        self.read(&self.plan, root, text, cache)
    }
}

impl XmlCodec {
    fn entry_codec(&self, type_name: &str, cache: &CodecCache) -> Result<SharedCodec> {
        let descriptor =
            self.resolver
                .resolve_type(type_name)
                .ok_or_else(|| SerializationError::TypeResolution {
                    type_name: type_name.to_string(),
                })?;
        cache.get_codec(&descriptor)
    }

    fn write(
        &self,
        out: &mut String,
        plan: &Plan,
        element: &str,
        value: &Value,
        cache: &CodecCache,
    ) -> Result<()> {
        match (plan, value) {
            (Plan::Leaf { kind, .. }, _) => {
                let text = encode_primitive(*kind, value)?;
                self.write_leaf(out, element, &text)
            }
            (Plan::Bytes, Value::Bytes(bytes)) => {
                write_leaf_unchecked(out, element, &STANDARD.encode(bytes));
                Ok(())
            }
            (Plan::Array { item, .. }, Value::Array(items)) => {
                if items.is_empty() {
                    push_empty(out, element);
                    return Ok(());
                }
                push_open(out, element);
                for value in items {
                    self.write(out, item, item.element(), value, cache)?;
                }
                push_close(out, element);
                Ok(())
            }
            (Plan::Object { type_name, fields, .. }, Value::Object(values)) => {
                if let Some(unknown) = values
                    .keys()
                    .find(|key| !fields.iter().any(|(name, _)| name == *key))
                {
                    return Err(SerializationError::malformed(
                        unknown.as_str(),
                        type_name.as_str(),
                        "no such field",
                    ));
                }
                push_open(out, element);
                for (name, field_plan) in fields {
                    if let Some(value) = values.get(name) {
                        self.write(out, field_plan, name, value, cache)?;
                    }
                }
                push_close(out, element);
                Ok(())
            }
            (Plan::PropertyBag, Value::PropertyBag(bag)) => {
                self.write_bag(out, element, bag, cache)
            }
            (plan, value) => Err(SerializationError::TypeMismatch {
                expected: plan_kind(plan),
                found: value.kind_name(),
            }),
        }
    }

    fn write_leaf(&self, out: &mut String, element: &str, text: &str) -> Result<()> {
        self.check_chars(text)?;
        write_leaf_unchecked(out, element, text);
        Ok(())
    }

    fn write_bag(
        &self,
        out: &mut String,
        element: &str,
        bag: &PropertyBag,
        cache: &CodecCache,
    ) -> Result<()> {
        if bag.is_empty() {
            push_empty(out, element);
            return Ok(());
        }
        push_open(out, element);
        for property in bag.iter() {
            self.check_chars(&property.name)?;
            let codec = self.entry_codec(&property.type_name, cache)?;
            out.push('<');
            out.push_str(PROPERTY_ELEMENT);
            push_attribute(out, NAME_ATTRIBUTE, &property.name);
            push_attribute(out, TYPE_ATTRIBUTE, &property.type_name);
            out.push('>');
            out.push_str(&codec.encode_structured(&property.value, cache)?);
            push_close(out, PROPERTY_ELEMENT);
        }
        push_close(out, element);
        Ok(())
    }

    fn check_chars(&self, text: &str) -> Result<()> {
        match text.chars().find(|c| !is_xml_char(*c)) {
            Some(c) => Err(SerializationError::malformed(
                text,
                &self.type_name,
                format!("character U+{:04X} cannot be written", u32::from(c)),
            )),
            None => Ok(()),
        }
    }

    fn expect_element(&self, node: Node<'_, '_>, element: &str, text: &str) -> Result<()> {
        let found = node.tag_name().name();
        if found == element {
            Ok(())
        } else {
            Err(SerializationError::malformed(
                text,
                &self.type_name,
                format!("expected <{element}>, found <{found}>"),
            ))
        }
    }

    /// Child elements of a container; text other than whitespace is an error
    fn element_children<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        source: &str,
    ) -> Result<Vec<Node<'a, 'input>>> {
        let mut elements = Vec::new();
        for child in node.children() {
            if child.is_element() {
                elements.push(child);
            } else if child.is_text() && !is_blank(child.text().unwrap_or_default()) {
                return Err(SerializationError::malformed(
                    source,
                    &self.type_name,
                    format!("unexpected text inside <{}>", node.tag_name().name()),
                ));
            }
        }
        Ok(elements)
    }

    fn leaf_text<'a>(&self, node: Node<'a, '_>, source: &str) -> Result<&'a str> {
        if node.children().any(|child| child.is_element()) {
            return Err(SerializationError::malformed(
                source,
                &self.type_name,
                format!("<{}> must hold only text", node.tag_name().name()),
            ));
        }
        Ok(node.text().unwrap_or_default())
    }

    fn read(
        &self,
        plan: &Plan,
        node: Node<'_, '_>,
        source: &str,
        cache: &CodecCache,
    ) -> Result<Value> {
        match plan {
            Plan::Leaf { kind, .. } => decode_primitive(*kind, self.leaf_text(node, source)?),
            Plan::Bytes => {
                let text = self.leaf_text(node, source)?.trim();
                STANDARD
                    .decode(text)
                    .map(Value::Bytes)
                    .map_err(|e| SerializationError::malformed(text, &self.type_name, e))
            }
            Plan::Array { item, .. } => {
                let mut items = Vec::new();
                for child in self.element_children(node, source)? {
                    self.expect_element(child, item.element(), source)?;
                    items.push(self.read(item, child, source, cache)?);
                }
                Ok(Value::Array(items))
            }
            Plan::Object { type_name, fields, .. } => {
                let mut values = BTreeMap::new();
                for child in self.element_children(node, source)? {
                    let name = child.tag_name().name();
                    let malformed = |reason: String| {
                        SerializationError::malformed(source, type_name.as_str(), reason)
                    };
                    let (_, field_plan) = fields
                        .iter()
                        .find(|(field, _)| field == name)
                        .ok_or_else(|| malformed(format!("no field named '{name}'")))?;
                    if values.contains_key(name) {
                        return Err(malformed(format!("field '{name}' appears more than once")));
                    }
                    let value = self.read(field_plan, child, source, cache)?;
                    values.insert(name.to_string(), value);
                }
                Ok(Value::Object(values))
            }
            Plan::PropertyBag => self.read_bag(node, source, cache),
        }
    }

    fn read_bag(&self, node: Node<'_, '_>, source: &str, cache: &CodecCache) -> Result<Value> {
        let malformed =
            |reason: String| SerializationError::malformed(source, &self.type_name, reason);
        let mut bag = PropertyBag::new();
        for child in self.element_children(node, source)? {
            self.expect_element(child, PROPERTY_ELEMENT, source)?;
            let attribute = |name: &str| {
                child.attribute(name).ok_or_else(|| {
                    malformed(format!("<{PROPERTY_ELEMENT}> without a {name} attribute"))
                })
            };
            let name = attribute(NAME_ATTRIBUTE)?;
            let type_name = attribute(TYPE_ATTRIBUTE)?;
            if bag.get(name).is_some() {
                return Err(malformed(format!("property '{name}' appears more than once")));
            }
            let inner = match self.element_children(child, source)?.as_slice() {
                [inner] => *inner,
                [] => return Err(malformed(format!("property '{name}' has no value"))),
                _ => {
                    return Err(malformed(format!("property '{name}' has more than one value")))
                }
            };
            let codec = self.entry_codec(type_name, cache)?;
            let value = codec.decode_structured(&source[inner.range()], cache)?;
            bag.insert(name, type_name, value);
        }
        Ok(Value::PropertyBag(bag))
    }
}

fn plan_kind(plan: &Plan) -> &'static str {
    match plan {
        Plan::Leaf { kind, .. } => kind.type_name(),
        Plan::Bytes => "bytes",
        Plan::Array { .. } => "array",
        Plan::Object { .. } => "object",
        Plan::PropertyBag => "property-bag",
    }
}

fn push_open(out: &mut String, element: &str) {
    out.push('<');
    out.push_str(element);
    out.push('>');
}

fn push_close(out: &mut String, element: &str) {
    out.push_str("</");
    out.push_str(element);
    out.push('>');
}

fn push_empty(out: &mut String, element: &str) {
    out.push('<');
    out.push_str(element);
    out.push_str(" />");
}

fn write_leaf_unchecked(out: &mut String, element: &str, text: &str) {
    if text.is_empty() {
        push_empty(out, element);
        return;
    }
    push_open(out, element);
    push_escaped(out, text, false);
    push_close(out, element);
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value, true);
    out.push('"');
}

// Parsers normalize raw CR and, inside attributes, tabs and newlines, so
// those are written as character references.
fn push_escaped(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\r' => out.push_str("&#xD;"),
            '\n' if attribute => out.push_str("&#xA;"),
            '\t' if attribute => out.push_str("&#x9;"),
            c => out.push(c),
        }
    }
}
