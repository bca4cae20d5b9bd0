use rustc_hash::FxHashMap;
use thalo_ast::{Entry, Metadata};
use thalo_position::Location;

/// A `^id` declared by an entry's header. Never produced
/// for an `actualize-synthesis` header — there, `^id` names the synthesis
/// being actualized, i.e. a reference with context `"target"`.
#[derive(Debug, Clone)]
pub struct LinkDefinition {
    pub id: String,
    pub file: String,
    pub location: Location,
}

/// A use of `^id` elsewhere: a link-typed metadata value, an array element,
/// or an actualize header's target.
#[derive(Debug, Clone)]
pub struct LinkReference {
    pub id: String,
    pub file: String,
    pub location: Location,
    pub context: String,
}

#[derive(Debug, Default)]
pub struct LinkIndex {
    pub definitions: FxHashMap<String, LinkDefinition>,
    pub references: FxHashMap<String, Vec<LinkReference>>,
}

impl LinkIndex {
    /// Keeps the first-encountered definition on conflict. Which definition
    /// "wins" under a stable ordering is invariant 2; flagging the conflict
    /// itself is the `duplicate-link-id` rule's job, not the index's.
    pub fn insert_definition(&mut self, def: LinkDefinition) {
        self.definitions.entry(def.id.clone()).or_insert(def);
    }

    pub fn insert_reference(&mut self, reference: LinkReference) {
        self.references.entry(reference.id.clone()).or_default().push(reference);
    }
}

pub(crate) fn index_entry(filename: &str, entry: &Entry, index: &mut LinkIndex) {
    match entry {
        Entry::Instance(e) => {
            if let Some(id) = &e.header.link {
                index.insert_definition(LinkDefinition { id: id.clone(), file: filename.to_string(), location: e.header.location });
            }
            index_metadata_links(filename, &e.metadata, index);
        }
        Entry::Synthesis(e) => {
            if let Some(id) = &e.header.link {
                index.insert_definition(LinkDefinition { id: id.clone(), file: filename.to_string(), location: e.header.location });
            }
            index_metadata_links(filename, &e.metadata, index);
        }
        Entry::Actualize(e) => {
            if let Some(id) = &e.header.link {
                index.insert_reference(LinkReference {
                    id: id.clone(),
                    file: filename.to_string(),
                    location: e.header.location,
                    context: "target".to_string(),
                });
            }
            index_metadata_links(filename, &e.metadata, index);
        }
        Entry::Schema(_) | Entry::Error(_) => {}
    }
}

fn index_metadata_links(filename: &str, metadata: &[Metadata], index: &mut LinkIndex) {
    for m in metadata {
        for id in m.content.link_ids() {
            index.insert_reference(LinkReference {
                id: id.to_string(),
                file: filename.to_string(),
                location: m.location,
                context: m.key.clone(),
            });
        }
    }
}

/// Every link id this entry defines or uses, for incremental-update
/// reporting.
pub(crate) fn touched_link_ids(entry: &Entry) -> Vec<String> {
    let mut ids = Vec::new();
    let (header, metadata) = match entry {
        Entry::Instance(e) => (Some(&e.header), e.metadata.as_slice()),
        Entry::Synthesis(e) => (Some(&e.header), e.metadata.as_slice()),
        Entry::Actualize(e) => (Some(&e.header), e.metadata.as_slice()),
        Entry::Schema(_) | Entry::Error(_) => (None, [].as_slice()),
    };
    if let Some(id) = header.and_then(|h| h.link.clone()) {
        ids.push(id);
    }
    for m in metadata {
        ids.extend(m.content.link_ids().into_iter().map(str::to_string));
    }
    ids
}
