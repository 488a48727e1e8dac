//! Logical structure tree extraction for tagged PDFs.
//!
//! Tagged PDFs carry a `/StructTreeRoot` whose `/K` entries form a tree of
//! structure elements (headings, paragraphs, figures). Each element names its
//! type in `/S`, may carry a title in `/T`, points at its page with `/Pg`,
//! and links to page content through marked-content ids (MCIDs).
//!
//! Real documents reference elements from several parents and occasionally
//! contain cycles, so the tree is stored in an arena ([`StructureTree`]) and
//! traversal keeps a path-scoped set of visited objects.
//!
//! # Example
//!
//! ```
//! use pdflocate_core::{ExtractOptions, MemoryDocument, ObjectRef, StructureTree, Value, dict};
//!
//! let mut doc = MemoryDocument::with_pages(1);
//! doc.catalog = Some(ObjectRef(1));
//! doc.insert(ObjectRef(1), dict([("StructTreeRoot", Value::Ref(ObjectRef(2)))]));
//! doc.insert(ObjectRef(2), dict([("K", Value::Ref(ObjectRef(3)))]));
//! doc.insert(ObjectRef(3), dict([("S", Value::Name("H1".into())), ("K", Value::Int(0))]));
//!
//! let tree = StructureTree::extract(&doc, &ExtractOptions::default());
//! let nodes = tree.to_nodes();
//! assert_eq!(nodes[0].tag, "H1");
//! assert_eq!(nodes[0].marked_content_ids, vec![0]);
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::accessor::DocumentAccessor;
use crate::error::ExtractOptions;
use crate::object::{ObjectRef, Value};

/// Tag used when `/S` is present but is not a name.
pub const UNKNOWN_TAG: &str = "Unknown";

/// Index of a node inside a [`StructureTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A structure element stored in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureElement {
    /// The element dictionary, `None` for inline dictionaries.
    pub object: Option<ObjectRef>,
    pub tag: String,
    /// `/T`, empty when absent.
    pub title: String,
    /// 0-based page from `/Pg`.
    pub page: Option<usize>,
    pub marked_content_ids: Vec<i64>,
    pub children: Vec<NodeId>,
}

/// Nested export form of a structure element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureNode {
    pub tag: String,
    pub title: String,
    /// 0-based page, `-1` when unresolved.
    pub page: i64,
    pub marked_content_ids: Vec<i64>,
    pub children: Vec<StructureNode>,
}

impl StructureNode {
    /// The page as an index, `None` when unresolved.
    pub fn page_index(&self) -> Option<usize> {
        usize::try_from(self.page).ok()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(StructureNode::count).sum::<usize>()
    }
}

/// The structure tree of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureTree {
    nodes: Vec<StructureElement>,
    roots: Vec<NodeId>,
}

/// Where an element's entries are read from.
enum Source<'a> {
    Object(ObjectRef),
    Inline(&'a BTreeMap<String, Value>),
}

impl Source<'_> {
    fn get<D: DocumentAccessor + ?Sized>(&self, doc: &D, key: &str) -> Option<Value> {
        match self {
            Source::Object(obj) => doc.get_key(*obj, key),
            Source::Inline(dict) => dict.get(key).cloned(),
        }
    }

    fn object(&self) -> Option<ObjectRef> {
        match self {
            Source::Object(obj) => Some(*obj),
            Source::Inline(_) => None,
        }
    }
}

/// What a kid entry turned out to be.
enum Kid<'a> {
    Element(Source<'a>),
    Mcid(i64),
    Skip,
}

struct Walker<'d, D: ?Sized> {
    doc: &'d D,
    max_depth: usize,
    page_refs: Vec<ObjectRef>,
    nodes: Vec<StructureElement>,
    path: HashSet<ObjectRef>,
}

impl StructureTree {
    /// Walk the document's `/StructTreeRoot`.
    ///
    /// An untagged document yields an empty tree. Malformed elements are
    /// skipped, cycles are cut at the repeated object.
    pub fn extract<D: DocumentAccessor + ?Sized>(doc: &D, options: &ExtractOptions) -> Self {
        let Some(catalog) = doc.catalog() else {
            return Self::default();
        };
        let root = match doc.get_key(catalog, "StructTreeRoot") {
            Some(Value::Ref(r)) => Source::Object(r),
            Some(Value::Dict(d)) => {
                let kids = d.get("K").cloned();
                return Self::from_root_kids(doc, options, None, kids);
            }
            _ => return Self::default(),
        };
        let kids = root.get(doc, "K");
        Self::from_root_kids(doc, options, root.object(), kids)
    }

    fn from_root_kids<D: DocumentAccessor + ?Sized>(
        doc: &D,
        options: &ExtractOptions,
        root: Option<ObjectRef>,
        kids: Option<Value>,
    ) -> Self {
        let Some(kids) = kids else {
            return Self::default();
        };
        let mut walker = Walker {
            doc,
            max_depth: options.max_struct_depth,
            page_refs: (0..doc.page_count()).filter_map(|p| doc.page_ref(p)).collect(),
            nodes: Vec::new(),
            path: HashSet::new(),
        };
        if let Some(root) = root {
            walker.path.insert(root);
        }
        let mut mcids = Vec::new();
        let roots = walker.walk_kids(&kids, 0, &mut mcids);
        if !mcids.is_empty() {
            tracing::debug!(count = mcids.len(), "ignoring MCIDs attached to the structure root");
        }
        tracing::debug!(nodes = walker.nodes.len(), "structure tree extracted");
        Self {
            nodes: walker.nodes,
            roots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level elements in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&StructureElement> {
        self.nodes.get(id.0)
    }

    /// Elements in pre-order with their depth (roots at depth 0).
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, *c)));
            }
        }
        out
    }

    /// The tree as nested [`StructureNode`]s.
    pub fn to_nodes(&self) -> Vec<StructureNode> {
        self.roots.iter().filter_map(|id| self.export(*id)).collect()
    }

    fn export(&self, id: NodeId) -> Option<StructureNode> {
        let node = self.get(id)?;
        Some(StructureNode {
            tag: node.tag.clone(),
            title: node.title.clone(),
            page: node.page.map_or(-1, |p| p as i64),
            marked_content_ids: node.marked_content_ids.clone(),
            children: node.children.iter().filter_map(|c| self.export(*c)).collect(),
        })
    }
}

impl<D: DocumentAccessor + ?Sized> Walker<'_, D> {
    /// Walk a `/K` value, returning child elements and pushing direct MCIDs into `mcids`.
    fn walk_kids(&mut self, kids: &Value, depth: usize, mcids: &mut Vec<i64>) -> Vec<NodeId> {
        let mut children = Vec::new();
        match kids {
            Value::Array(items) => {
                for item in items {
                    self.walk_kid(item, depth, mcids, &mut children);
                }
            }
            other => self.walk_kid(other, depth, mcids, &mut children),
        }
        children
    }

    fn walk_kid(
        &mut self,
        kid: &Value,
        depth: usize,
        mcids: &mut Vec<i64>,
        children: &mut Vec<NodeId>,
    ) {
        match self.classify(kid) {
            Kid::Mcid(n) => mcids.push(n),
            Kid::Element(source) => {
                if let Some(id) = self.element(source, depth) {
                    children.push(id);
                }
            }
            Kid::Skip => {}
        }
    }

    fn classify<'v>(&self, kid: &'v Value) -> Kid<'v> {
        match kid {
            Value::Int(n) => Kid::Mcid(*n),
            Value::Ref(r) => {
                if self.doc.get_key(*r, "S").is_some() {
                    return Kid::Element(Source::Object(*r));
                }
                match self.doc.get_key(*r, "MCID") {
                    Some(Value::Int(n)) => Kid::Mcid(n),
                    _ => {
                        tracing::debug!(object = %r, "skipping kid that is not a structure element");
                        Kid::Skip
                    }
                }
            }
            Value::Dict(d) => {
                if d.contains_key("S") {
                    return Kid::Element(Source::Inline(d));
                }
                match d.get("MCID") {
                    Some(Value::Int(n)) => Kid::Mcid(*n),
                    // object references (/OBJR) and garbage
                    _ => Kid::Skip,
                }
            }
            other => {
                tracing::debug!(kind = other.kind(), "skipping malformed structure kid");
                Kid::Skip
            }
        }
    }

    fn element(&mut self, source: Source<'_>, depth: usize) -> Option<NodeId> {
        if depth >= self.max_depth {
            tracing::debug!(depth, "structure tree depth limit reached");
            return None;
        }
        if let Some(obj) = source.object() {
            if !self.path.insert(obj) {
                tracing::warn!(object = %obj, "cycle in structure tree, truncating branch");
                return None;
            }
        }

        let tag = match source.get(self.doc, "S") {
            Some(Value::Name(name)) => name,
            _ => UNKNOWN_TAG.to_string(),
        };
        let title = source
            .get(self.doc, "T")
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_default();
        let page = source
            .get(self.doc, "Pg")
            .and_then(|v| v.as_ref())
            .and_then(|pg| self.page_refs.iter().position(|p| *p == pg));

        let id = NodeId(self.nodes.len());
        self.nodes.push(StructureElement {
            object: source.object(),
            tag,
            title,
            page,
            marked_content_ids: Vec::new(),
            children: Vec::new(),
        });

        let mut mcids = Vec::new();
        let children = match source.get(self.doc, "K") {
            Some(kids) => self.walk_kids(&kids, depth + 1, &mut mcids),
            None => Vec::new(),
        };
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.marked_content_ids = mcids;
            node.children = children;
        }

        if let Some(obj) = source.object() {
            self.path.remove(&obj);
        }
        Some(id)
    }
}
