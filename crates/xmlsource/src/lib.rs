//! An XML document tree backed by `roxmltree`.
//!
//! Node handles are cheap copies that stay identity-stable for the lifetime
//! of the document, which is what makes them usable as members of a
//! dependency set. Attributes need special handling because `roxmltree`
//! treats them as data on elements, not as navigable nodes in the tree.

use roxmltree::Node;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use xdep_xpath1::{DataSourceNode, NodeType, QName};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Wrapper around `roxmltree::Document` handing out [`XmlNode`] handles.
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    /// The document root node (not the document element).
    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root())
    }

    /// The outermost element of the document.
    pub fn document_element(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root_element())
    }
}

/// A handle to a node in the XML tree.
///
/// Elements, text, comments, and processing instructions map directly onto
/// `roxmltree` nodes. An attribute is identified by its owner element plus
/// its position in that element's attribute list.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    Tree(Node<'a, 'input>),
    Attr {
        owner: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    fn attr(&self) -> Option<roxmltree::Attribute<'a, 'input>> {
        match self {
            XmlNode::Tree(_) => None,
            XmlNode::Attr { owner, index } => owner.attributes().nth(*index),
        }
    }
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XmlNode::Tree(a), XmlNode::Tree(b)) => a.id() == b.id(),
            (
                XmlNode::Attr {
                    owner: o1,
                    index: i1,
                },
                XmlNode::Attr {
                    owner: o2,
                    index: i2,
                },
            ) => o1.id() == o2.id() && i1 == i2,
            _ => false,
        }
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

impl<'a, 'input> PartialOrd for XmlNode<'a, 'input> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order, with an element's attributes sorting directly after the
/// element itself.
impl<'a, 'input> Ord for XmlNode<'a, 'input> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (XmlNode::Tree(a), XmlNode::Tree(b)) => a.id().get().cmp(&b.id().get()),
            (
                XmlNode::Attr {
                    owner: o1,
                    index: i1,
                },
                XmlNode::Attr {
                    owner: o2,
                    index: i2,
                },
            ) => match o1.id().get().cmp(&o2.id().get()) {
                Ordering::Equal => i1.cmp(i2),
                other => other,
            },
            (XmlNode::Tree(e), XmlNode::Attr { owner, .. }) => {
                if e.id() == owner.id() {
                    Ordering::Less
                } else {
                    e.id().get().cmp(&owner.id().get())
                }
            }
            (XmlNode::Attr { owner, .. }, XmlNode::Tree(e)) => {
                if owner.id() == e.id() {
                    Ordering::Greater
                } else {
                    owner.id().get().cmp(&e.id().get())
                }
            }
        }
    }
}

impl<'a, 'input> Hash for XmlNode<'a, 'input> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            XmlNode::Tree(node) => {
                0u8.hash(state);
                node.id().hash(state);
            }
            XmlNode::Attr { owner, index } => {
                1u8.hash(state);
                owner.id().hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Tree(node) => {
                if node.is_root() {
                    NodeType::Root
                } else if node.is_text() {
                    NodeType::Text
                } else if node.is_comment() {
                    NodeType::Comment
                } else if node.is_pi() {
                    NodeType::ProcessingInstruction
                } else {
                    NodeType::Element
                }
            }
            XmlNode::Attr { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Tree(node) => {
                if node.is_element() {
                    Some(QName {
                        prefix: None, // roxmltree doesn't expose the prefix directly
                        local_part: node.tag_name().name(),
                    })
                } else if node.is_pi() {
                    node.pi().map(|pi| QName {
                        prefix: None,
                        local_part: pi.target,
                    })
                } else {
                    None
                }
            }
            XmlNode::Attr { .. } => self.attr().map(|attr| {
                let prefix = (attr.namespace() == Some(XML_NAMESPACE)).then_some("xml");
                QName {
                    prefix,
                    local_part: attr.name(),
                }
            }),
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Tree(node) => {
                if node.is_text() || node.is_comment() {
                    node.text().unwrap_or("").to_string()
                } else if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect()
                } else if node.is_pi() {
                    node.pi()
                        .and_then(|pi| pi.value)
                        .unwrap_or("")
                        .to_string()
                } else {
                    String::new()
                }
            }
            XmlNode::Attr { .. } => self
                .attr()
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let owner = *node;
                let count = node.attributes().len();
                Box::new((0..count).map(move |index| XmlNode::Attr { owner, index }))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) => Box::new(node.children().map(XmlNode::Tree)),
            XmlNode::Attr { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Tree(node) => node.parent().map(XmlNode::Tree),
            XmlNode::Attr { owner, .. } => Some(XmlNode::Tree(*owner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_child<'a>(parent: XmlNode<'a, 'a>, name: &str) -> XmlNode<'a, 'a> {
        parent
            .children()
            .find(|n| n.name().is_some_and(|q| q.local_part == name))
            .unwrap()
    }

    #[test]
    fn test_attribute_handles() {
        let xml = r#"<recipes><recipe id="r1" serves="4">Stew</recipe></recipes>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let recipes = find_child(doc.root_node(), "recipes");
        let recipe = find_child(recipes, "recipe");

        let attrs: Vec<_> = recipe.attributes().collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].node_type(), NodeType::Attribute);
        assert_eq!(attrs[0].name().unwrap().local_part, "id");
        assert_eq!(attrs[0].string_value(), "r1");
        assert_eq!(attrs[1].name().unwrap().local_part, "serves");
        assert_eq!(attrs[1].string_value(), "4");
        assert_eq!(attrs[0].parent(), Some(recipe));

        // Handles to the same attribute are interchangeable.
        let again: Vec<_> = recipe.attributes().collect();
        assert_eq!(attrs[0], again[0]);
        assert_ne!(attrs[0], again[1]);
    }

    #[test]
    fn test_node_types_and_values() {
        let xml = "<doc><!-- remark --><item>A<sub>B</sub></item><?target data?></doc>";
        let doc = XmlDocument::parse(xml).unwrap();
        let root = doc.root_node();
        assert_eq!(root.node_type(), NodeType::Root);

        let element = find_child(root, "doc");
        let children: Vec<_> = element.children().collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].node_type(), NodeType::Comment);
        assert_eq!(children[0].string_value(), " remark ");
        assert_eq!(children[1].node_type(), NodeType::Element);
        assert_eq!(children[1].string_value(), "AB");
        assert_eq!(children[2].node_type(), NodeType::ProcessingInstruction);
        assert_eq!(children[2].name().unwrap().local_part, "target");
        assert_eq!(children[2].string_value(), "data");
    }

    #[test]
    fn test_xml_lang_attribute_prefix() {
        let xml = r#"<doc xml:lang="en-GB"><p>text</p></doc>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let element = find_child(doc.root_node(), "doc");
        let lang = element.attributes().next().unwrap();
        let name = lang.name().unwrap();
        assert_eq!(name.prefix, Some("xml"));
        assert_eq!(name.local_part, "lang");
        assert_eq!(lang.string_value(), "en-GB");
    }

    #[test]
    fn test_document_order() {
        let xml = "<a><b/><c/></a>";
        let doc = XmlDocument::parse(xml).unwrap();
        let a = find_child(doc.root_node(), "a");
        let b = find_child(a, "b");
        let c = find_child(a, "c");
        let mut nodes = vec![c, b, a];
        nodes.sort();
        assert_eq!(nodes, vec![a, b, c]);
    }
}
