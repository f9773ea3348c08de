// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parsing helpers built on html5ever
//!
//! Enforcement and observation both operate on a parsed document tree, not
//! on textual pattern matching, so multi-line bodies and odd element
//! boundaries are handled by the parser.

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::error::{Error, Result};

/// One `<script>` element found in a document
#[derive(Clone)]
pub struct ScriptTag {
    /// The element node
    pub handle: Handle,
    /// Its parent, needed for excision
    pub parent: Handle,
    /// Value of the src attribute, if present
    pub src: Option<String>,
    /// Concatenated text content (inline body; empty for src scripts)
    pub body: String,
}

impl ScriptTag {
    /// Whether this is an inline script with a non-empty body
    pub fn is_inline(&self) -> bool {
        self.src.is_none() && !self.body.is_empty()
    }
}

/// Parse a complete HTML document
pub fn parse(html: &str) -> Result<RcDom> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(dom)
}

/// Collect every `<script>` element in document order
pub fn collect_scripts(dom: &RcDom) -> Vec<ScriptTag> {
    let mut scripts = Vec::new();
    walk(&dom.document, &mut scripts);
    scripts
}

fn walk(handle: &Handle, out: &mut Vec<ScriptTag>) {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { ref name, ref attrs, .. } = child.data {
            if name.local.as_ref() == "script" {
                let src = attrs
                    .borrow()
                    .iter()
                    .find(|a| a.name.local.as_ref() == "src")
                    .map(|a| a.value.to_string());
                out.push(ScriptTag {
                    handle: child.clone(),
                    parent: handle.clone(),
                    src,
                    body: text_content(child),
                });
            }
        }
        walk(child, out);
    }
}

/// Concatenated text content of a node's direct children
pub fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}

/// Remove a script element from its parent
pub fn detach(tag: &ScriptTag) {
    tag.parent
        .children
        .borrow_mut()
        .retain(|child| !std::rc::Rc::ptr_eq(child, &tag.handle));
}

/// Serialize a document back to HTML
pub fn to_html(dom: &RcDom) -> Result<String> {
    let mut buf = Vec::new();
    let document: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &document, SerializeOpts::default())?;
    String::from_utf8(buf).map_err(|e| Error::html(e.to_string()))
}
