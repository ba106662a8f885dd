use std::collections::HashMap;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// DOM capability the synthesizer and the preload collaborator write through.
///
/// `insert_before` with `reference: None` appends.
pub trait Renderer {
    fn create_element(&mut self, tag_name: &str) -> NodeId;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    fn head(&self) -> Option<NodeId>;
}

#[derive(Debug, Clone)]
enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
struct Element {
    tag_name: String,
    attrs: HashMap<String, String>,
}

/// Arena-backed document with `<html><head></head><body></body></html>`
/// already in place.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        let html = dom.create_node(Some(dom.root), NodeType::Element(Element::new("html")));
        dom.head = dom.create_node(Some(html), NodeType::Element(Element::new("head")));
        dom.body = dom.create_node(Some(html), NodeType::Element(Element::new("body")));
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Creates an element with `attrs` and appends it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag_name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId> {
        let node = self.create_element(tag_name);
        for (name, value) in attrs {
            self.set_attr(node, name, value)?;
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let node = self.create_node(None, NodeType::Text(text.to_string()));
        self.append_child(parent, node)?;
        Ok(node)
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(node_id.0)
            .is_some_and(|node| !matches!(node.node_type, NodeType::Text(_)))
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::dom("setAttribute target is not an element"))?;
        element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn child_elements(&self, parent: NodeId, tag_name: &str) -> Vec<NodeId> {
        self.children_of(parent)
            .into_iter()
            .filter(|child| {
                self.element(*child)
                    .is_some_and(|element| element.tag_name.eq_ignore_ascii_case(tag_name))
            })
            .collect()
    }

    fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(parent.0)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach(parent, child, None)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::dom("insertion target cannot have children"));
        }
        if !self.is_valid_node(child) || child == self.root || child == parent {
            return Err(Error::dom("invalid node for insertion"));
        }
        if let Some(reference) = reference {
            if !self.is_valid_node(reference) || self.nodes[reference.0].parent != Some(parent) {
                return Err(Error::dom("insertBefore reference is not a direct child"));
            }
            if reference == child {
                return Ok(());
            }
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::dom("insertion would create a cycle"));
            }
            cursor = self.nodes[node.0].parent;
        }

        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }

        let index = match reference {
            Some(reference) => self.nodes[parent.0]
                .children
                .iter()
                .position(|id| *id == reference)
                .ok_or_else(|| Error::dom("insertBefore reference is missing"))?,
            None => self.nodes[parent.0].children.len(),
        };
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    /// Serializes the subtree under `node_id` with attributes in name order.
    pub fn dump_node(&self, node_id: NodeId) -> String {
        let Some(node) = self.nodes.get(node_id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Document => node
                .children
                .iter()
                .map(|child| self.dump_node(*child))
                .collect(),
            NodeType::Text(text) => escape_html_text(text),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_by(|(left, _), (right, _)| left.cmp(right));
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_html_attr(v));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return out;
                }
                for child in &node.children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }
}

impl Element {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: HashMap::new(),
        }
    }
}

impl Renderer for Dom {
    fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_node(None, NodeType::Element(Element::new(tag_name)))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.set_attr(node, name, value)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attr(node, name)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|element| element.tag_name.clone())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children_of(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|node| node.parent)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.attach(parent, child, reference)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::dom("removeChild target is not a direct child"));
        }
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head)
    }
}

fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_html_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_html_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
