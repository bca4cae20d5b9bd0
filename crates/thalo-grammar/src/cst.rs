use thalo_position::Location;

/// Concrete-syntax node kind, one variant per named grammar rule in
/// `grammar.js`. `Error` carries raw text for a region the parser could not
/// fit to any rule; it is never produced for a sibling that parsed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CstKind {
    SourceFile,
    InstanceEntry,
    SchemaEntry,
    SynthesisEntry,
    ActualizeEntry,
    Header,
    SchemaHeader,
    SynthesisHeader,
    ActualizeHeader,
    Timestamp,
    Date,
    Time,
    Timezone,
    Directive,
    Entity,
    EntityName,
    Title,
    LinkDef,
    Tag,
    Identifier,
    Metadata,
    Key,
    ValueQuotedString,
    ValueLinkRef,
    ValueDatetime,
    ValueDateRange,
    ValueQuery,
    ValueArray,
    MetadataSection,
    SectionsSection,
    RemoveMetadataSection,
    RemoveSectionsSection,
    FieldDef,
    SectionDef,
    DefaultValue,
    Description,
    TypePrimitive,
    TypeLiteral,
    TypeUnion,
    TypeArray,
    TypeGroup,
    ContentBlock,
    MdHeader,
    BulletItem,
    PlainText,
    Error,
}

/// A node in the concrete syntax tree. Locations are block-relative byte
/// offsets plus `(row, column)` positions (data-model invariant 1).
#[derive(Debug, Clone)]
pub struct CstNode {
    pub kind: CstKind,
    pub location: Location,
    pub text: String,
    pub children: Vec<CstNode>,
}

impl CstNode {
    pub fn new(kind: CstKind, location: Location, text: impl Into<String>) -> Self {
        Self { kind, location, text: text.into(), children: Vec::new() }
    }

    pub fn with_children(mut self, children: Vec<CstNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == CstKind::Error
    }

    pub fn children_of_kind(&self, kind: CstKind) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    pub fn child_of_kind(&self, kind: CstKind) -> Option<&CstNode> {
        self.children.iter().find(|c| c.kind == kind)
    }
}
