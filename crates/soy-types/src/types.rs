//! The Soy type model.
//!
//! Primitive types are process-wide singletons (see [`primitives`]). Compound
//! types are only ever created through a [`SoyTypeRegistry`](crate::SoyTypeRegistry),
//! which interns them so that structurally equal types share one allocation.
//! Equality and hashing are structural; `Arc::ptr_eq` is the cheap identity
//! check the rest of the compiler relies on.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to a canonical type.
pub type SoyTypeRef = Arc<SoyType>;

/// Discriminant of a [`SoyType`], used for permission checks such as the
/// allowed map key kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoyTypeKind {
    Any,
    Unknown,
    Null,
    Bool,
    Int,
    Float,
    String,
    Html,
    Attributes,
    Css,
    Uri,
    TrustedResourceUri,
    Js,
    Error,
    Proto,
    ProtoEnum,
    List,
    Map,
    LegacyObjectMap,
    Union,
    Record,
}

/// The built-in sanitized content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SanitizedKind {
    Html,
    Attributes,
    Css,
    Uri,
    TrustedResourceUri,
    Js,
}

impl SanitizedKind {
    pub fn name(self) -> &'static str {
        match self {
            SanitizedKind::Html => "html",
            SanitizedKind::Attributes => "attributes",
            SanitizedKind::Css => "css",
            SanitizedKind::Uri => "uri",
            SanitizedKind::TrustedResourceUri => "trusted_resource_url",
            SanitizedKind::Js => "js",
        }
    }
}

/// A Soy type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SoyType {
    Any,
    /// `?`: the type could not be determined statically.
    Unknown,
    Null,
    Bool,
    Int,
    Float,
    String,
    Sanitized(SanitizedKind),
    /// Placeholder for expressions whose type failed to resolve.
    Error,
    /// A message type served by a schema provider.
    Proto(String),
    /// An enum type served by a schema provider.
    ProtoEnum(String),
    List(ListType),
    Map(MapType),
    LegacyObjectMap(MapType),
    Union(UnionType),
    Record(RecordType),
}

impl SoyType {
    pub fn kind(&self) -> SoyTypeKind {
        match self {
            SoyType::Any => SoyTypeKind::Any,
            SoyType::Unknown => SoyTypeKind::Unknown,
            SoyType::Null => SoyTypeKind::Null,
            SoyType::Bool => SoyTypeKind::Bool,
            SoyType::Int => SoyTypeKind::Int,
            SoyType::Float => SoyTypeKind::Float,
            SoyType::String => SoyTypeKind::String,
            SoyType::Sanitized(SanitizedKind::Html) => SoyTypeKind::Html,
            SoyType::Sanitized(SanitizedKind::Attributes) => SoyTypeKind::Attributes,
            SoyType::Sanitized(SanitizedKind::Css) => SoyTypeKind::Css,
            SoyType::Sanitized(SanitizedKind::Uri) => SoyTypeKind::Uri,
            SoyType::Sanitized(SanitizedKind::TrustedResourceUri) => {
                SoyTypeKind::TrustedResourceUri
            }
            SoyType::Sanitized(SanitizedKind::Js) => SoyTypeKind::Js,
            SoyType::Error => SoyTypeKind::Error,
            SoyType::Proto(_) => SoyTypeKind::Proto,
            SoyType::ProtoEnum(_) => SoyTypeKind::ProtoEnum,
            SoyType::List(_) => SoyTypeKind::List,
            SoyType::Map(_) => SoyTypeKind::Map,
            SoyType::LegacyObjectMap(_) => SoyTypeKind::LegacyObjectMap,
            SoyType::Union(_) => SoyTypeKind::Union,
            SoyType::Record(_) => SoyTypeKind::Record,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SoyType::Error)
    }

    /// Types that absorb every other member of a union they appear in.
    fn absorbs_union(&self) -> bool {
        matches!(self, SoyType::Unknown | SoyType::Any | SoyType::Error)
    }

    pub fn as_list(&self) -> Option<&ListType> {
        match self {
            SoyType::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            SoyType::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            SoyType::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for SoyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoyType::Any => f.write_str("any"),
            SoyType::Unknown => f.write_str("?"),
            SoyType::Null => f.write_str("null"),
            SoyType::Bool => f.write_str("bool"),
            SoyType::Int => f.write_str("int"),
            SoyType::Float => f.write_str("float"),
            SoyType::String => f.write_str("string"),
            SoyType::Sanitized(kind) => f.write_str(kind.name()),
            SoyType::Error => f.write_str("error"),
            SoyType::Proto(name) | SoyType::ProtoEnum(name) => f.write_str(name),
            SoyType::List(list) => write!(f, "list<{}>", list.element),
            SoyType::Map(map) => write!(f, "map<{},{}>", map.key, map.value),
            SoyType::LegacyObjectMap(map) => {
                write!(f, "legacy_object_map<{},{}>", map.key, map.value)
            }
            SoyType::Union(union) => {
                for (i, member) in union.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            SoyType::Record(record) => {
                f.write_str("[")?;
                for (i, field) in record.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListType {
    pub element: SoyTypeRef,
}

/// Key/value pair shared by `map` and `legacy_object_map`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    pub key: SoyTypeRef,
    pub value: SoyTypeRef,
}

/// A union of two or more distinct, non-union members.
///
/// Members are kept sorted by their canonical printed form, where record
/// fields appear in name order. Two unions built from the same members in
/// any order compare and hash equal, whichever record instance came first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionType {
    members: Vec<SoyTypeRef>,
}

/// Result of folding a member list into a union.
#[derive(Debug)]
pub(crate) enum UnionFold {
    /// Folding left a single type, which stands for itself.
    Collapsed(SoyTypeRef),
    /// A genuine union that still has to be interned.
    Union(UnionType),
}

impl UnionType {
    /// Flatten nested unions, drop duplicates and collapse degenerate cases.
    pub(crate) fn fold(members: impl IntoIterator<Item = SoyTypeRef>) -> UnionFold {
        let mut flattened: Vec<SoyTypeRef> = Vec::new();
        let mut push_unique = |member: SoyTypeRef| {
            if !flattened.contains(&member) {
                flattened.push(member);
            }
        };
        for member in members {
            if member.absorbs_union() {
                return UnionFold::Collapsed(member);
            }
            match &*member {
                SoyType::Union(nested) => nested.members.iter().cloned().for_each(&mut push_unique),
                _ => push_unique(member),
            }
        }

        flattened.sort_by_cached_key(|member| (CanonicalForm(member).to_string(), member.kind()));

        match flattened.len() {
            0 => UnionFold::Collapsed(Arc::clone(&primitives::UNKNOWN)),
            1 => UnionFold::Collapsed(flattened.remove(0)),
            _ => UnionFold::Union(UnionType { members: flattened }),
        }
    }

    pub fn members(&self) -> &[SoyTypeRef] {
        &self.members
    }

    pub fn contains(&self, ty: &SoyType) -> bool {
        self.members.iter().any(|member| **member == *ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordField {
    pub name: String,
    pub ty: SoyTypeRef,
}

impl RecordField {
    pub fn new(name: impl Into<String>, ty: SoyTypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A record with uniquely named fields.
///
/// Fields iterate in declaration order, but equality ignores order:
/// `[a: int, b: string]` and `[b: string, a: int]` are the same type.
#[derive(Debug, Clone)]
pub struct RecordType {
    fields: Vec<RecordField>,
}

impl RecordType {
    /// Build a record from ordered fields. A repeated name keeps its first type.
    pub(crate) fn new(fields: impl IntoIterator<Item = RecordField>) -> Self {
        let mut unique: Vec<RecordField> = Vec::new();
        for field in fields {
            if !unique.iter().any(|existing| existing.name == field.name) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SoyTypeRef> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.ty)
    }

    fn sorted(&self) -> Vec<&RecordField> {
        let mut sorted: Vec<&RecordField> = self.fields.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|field| other.field(&field.name) == Some(&field.ty))
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for field in self.sorted() {
            field.hash(state);
        }
    }
}

/// Prints a type with record fields sorted by name, at any depth.
struct CanonicalForm<'a>(&'a SoyType);

impl fmt::Display for CanonicalForm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            SoyType::List(list) => write!(f, "list<{}>", CanonicalForm(&list.element)),
            SoyType::Map(map) => write!(
                f,
                "map<{},{}>",
                CanonicalForm(&map.key),
                CanonicalForm(&map.value)
            ),
            SoyType::LegacyObjectMap(map) => write!(
                f,
                "legacy_object_map<{},{}>",
                CanonicalForm(&map.key),
                CanonicalForm(&map.value)
            ),
            SoyType::Union(union) => {
                for (i, member) in union.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", CanonicalForm(member))?;
                }
                Ok(())
            }
            SoyType::Record(record) => {
                f.write_str("[")?;
                for (i, field) in record.sorted().into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, CanonicalForm(&field.ty))?;
                }
                f.write_str("]")
            }
            other => write!(f, "{other}"),
        }
    }
}

/// Process-wide primitive type instances.
///
/// ```
/// use soy_types::primitives;
/// use std::sync::Arc;
///
/// assert!(Arc::ptr_eq(&primitives::INT, &primitives::INT.clone()));
/// ```
pub mod primitives {
    use std::sync::{Arc, LazyLock};

    use super::{SanitizedKind, SoyType, SoyTypeRef, UnionFold, UnionType};

    pub static ANY: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Any));
    pub static UNKNOWN: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Unknown));
    pub static NULL: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Null));
    pub static BOOL: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Bool));
    pub static INT: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Int));
    pub static FLOAT: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Float));
    pub static STRING: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::String));
    pub static ERROR: LazyLock<SoyTypeRef> = LazyLock::new(|| Arc::new(SoyType::Error));

    pub static HTML: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::Html)));
    pub static ATTRIBUTES: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::Attributes)));
    pub static CSS: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::Css)));
    pub static URI: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::Uri)));
    pub static TRUSTED_RESOURCE_URI: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::TrustedResourceUri)));
    pub static JS: LazyLock<SoyTypeRef> =
        LazyLock::new(|| Arc::new(SoyType::Sanitized(SanitizedKind::Js)));

    /// `number`, the builtin alias for `float|int`.
    pub static NUMBER: LazyLock<SoyTypeRef> = LazyLock::new(|| {
        match UnionType::fold([Arc::clone(&INT), Arc::clone(&FLOAT)]) {
            UnionFold::Union(union) => Arc::new(SoyType::Union(union)),
            UnionFold::Collapsed(ty) => ty,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(element: SoyTypeRef) -> SoyTypeRef {
        Arc::new(SoyType::List(ListType { element }))
    }

    fn folded(members: Vec<SoyTypeRef>) -> SoyTypeRef {
        match UnionType::fold(members) {
            UnionFold::Collapsed(ty) => ty,
            UnionFold::Union(union) => Arc::new(SoyType::Union(union)),
        }
    }

    #[test]
    fn display_compound_types() {
        let list = list_of(primitives::STRING.clone());
        assert_eq!(list.to_string(), "list<string>");

        let map = SoyType::LegacyObjectMap(MapType {
            key: primitives::STRING.clone(),
            value: list,
        });
        assert_eq!(map.to_string(), "legacy_object_map<string,list<string>>");
        assert_eq!(primitives::NUMBER.to_string(), "float|int");
        assert_eq!(primitives::TRUSTED_RESOURCE_URI.to_string(), "trusted_resource_url");
    }

    #[test]
    fn fold_flattens_and_sorts() {
        let inner = folded(vec![primitives::STRING.clone(), primitives::INT.clone()]);
        let outer = folded(vec![primitives::BOOL.clone(), inner, primitives::INT.clone()]);
        assert_eq!(outer.to_string(), "bool|int|string");
        assert_eq!(outer.as_union().unwrap().members().len(), 3);
    }

    #[test]
    fn fold_collapses_single_member() {
        let ty = folded(vec![primitives::INT.clone(), primitives::INT.clone()]);
        assert!(Arc::ptr_eq(&ty, &primitives::INT));
    }

    #[test]
    fn fold_is_absorbed_by_unknown_any_and_error() {
        let ty = folded(vec![primitives::INT.clone(), primitives::UNKNOWN.clone()]);
        assert!(Arc::ptr_eq(&ty, &primitives::UNKNOWN));

        let ty = folded(vec![primitives::ERROR.clone(), primitives::INT.clone()]);
        assert!(ty.is_error());
    }

    #[test]
    fn fold_of_nothing_is_unknown() {
        assert_eq!(*folded(vec![]), SoyType::Unknown);
    }

    #[test]
    fn record_equality_ignores_order() {
        let a = RecordType::new([
            RecordField::new("a", primitives::INT.clone()),
            RecordField::new("b", primitives::STRING.clone()),
        ]);
        let b = RecordType::new([
            RecordField::new("b", primitives::STRING.clone()),
            RecordField::new("a", primitives::INT.clone()),
        ]);
        assert_eq!(a, b);

        let mut ha = rustc_hash::FxHasher::default();
        let mut hb = rustc_hash::FxHasher::default();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());

        assert_eq!(SoyType::Record(a).to_string(), "[a: int, b: string]");
    }

    #[test]
    fn union_order_ignores_record_field_order() {
        let ab = Arc::new(SoyType::Record(RecordType::new([
            RecordField::new("a", primitives::INT.clone()),
            RecordField::new("b", primitives::STRING.clone()),
        ])));
        let ba = Arc::new(SoyType::Record(RecordType::new([
            RecordField::new("b", primitives::STRING.clone()),
            RecordField::new("a", primitives::INT.clone()),
        ])));
        // Prints between the two declaration orders of the record above.
        let aa = Arc::new(SoyType::Record(RecordType::new([RecordField::new(
            "aa",
            primitives::INT.clone(),
        )])));

        let first = folded(vec![ab, aa.clone()]);
        let second = folded(vec![aa.clone(), ba]);
        assert_eq!(first, second);

        let mut h1 = rustc_hash::FxHasher::default();
        let mut h2 = rustc_hash::FxHasher::default();
        first.hash(&mut h1);
        second.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());

        // Each instance still prints its own declaration order.
        let members = second.as_union().unwrap().members();
        assert_eq!(members[0].to_string(), "[b: string, a: int]");
        assert!(Arc::ptr_eq(&members[1], &aa));
    }

    #[test]
    fn record_keeps_first_of_repeated_names() {
        let record = RecordType::new([
            RecordField::new("a", primitives::INT.clone()),
            RecordField::new("a", primitives::STRING.clone()),
        ]);
        assert_eq!(record.fields().len(), 1);
        assert_eq!(**record.field("a").unwrap(), SoyType::Int);
    }

    #[test]
    fn kinds() {
        assert_eq!(primitives::HTML.kind(), SoyTypeKind::Html);
        assert_eq!(SoyType::ProtoEnum("a.Color".into()).kind(), SoyTypeKind::ProtoEnum);
        assert_eq!(primitives::NUMBER.kind(), SoyTypeKind::Union);
    }
}
