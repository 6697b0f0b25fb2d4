//! Text content helpers.

use super::{Document, NodeId, NodeKind, NodeType};
use crate::error::DomError;

impl Document {
    /// The text of a node.
    ///
    /// Containers return the concatenated text and CDATA of their
    /// descendants in document order; other kinds return their own data.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        if !node.node_type().is_container() {
            return node.kind.text().unwrap_or_default().to_string();
        }
        let mut out = String::new();
        for descendant in self.descendants(id) {
            if let Some(NodeKind::Text { content } | NodeKind::CData { content }) =
                self.get(descendant).map(|n| &n.kind)
            {
                out.push_str(content);
            }
        }
        out
    }

    /// Replaces the text of a node.
    ///
    /// Elements and fragments lose all their children and get a single text
    /// node (none when `text` is empty), in one batch. Attributes go through
    /// [`set_attribute_value`](Self::set_attribute_value). Character data and
    /// PIs have their data replaced.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] for documents, doctypes and the
    /// remaining declaration kinds; [`DomError::Observer`] if an observer
    /// failed.
    pub fn set_text_content(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        let text = text.into();
        match self.try_node(id)?.node_type() {
            NodeType::Element | NodeType::DocumentFragment => self.with_batch(|doc| {
                doc.clear_children(id)?;
                if !text.is_empty() {
                    let node = doc.create_text(text);
                    doc.append_child(id, node)?;
                }
                Ok(())
            }),
            NodeType::Attribute => self.set_attribute_value(id, text),
            _ => {
                let Some(node) = self.node_mut(id) else {
                    return Err(DomError::StaleNode);
                };
                match &mut node.kind {
                    NodeKind::Text { content }
                    | NodeKind::CData { content }
                    | NodeKind::Comment { content } => *content = text,
                    NodeKind::ProcessingInstruction { data, .. } => {
                        *data = (!text.is_empty()).then_some(text);
                    }
                    other => {
                        return Err(DomError::structural(format!(
                            "the text of a {} cannot be set",
                            other.node_type()
                        )))
                    }
                }
                Ok(())
            }
        }
    }

    /// Merges adjacent text nodes and drops empty ones in the subtree of
    /// `id`. Merged-away nodes end up unlinked.
    ///
    /// # Errors
    ///
    /// [`DomError::Observer`] if an observer failed.
    pub fn normalize(&mut self, id: NodeId) -> Result<(), DomError> {
        self.try_node(id)?;
        let containers: Vec<NodeId> = self
            .descendants_and_self(id)
            .filter(|&n| self.child_count(n) > 0)
            .collect();
        self.with_batch(|doc| {
            for container in containers {
                doc.normalize_children(container);
            }
            Ok(())
        })
    }

    fn normalize_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).collect();
        let mut run_head: Option<NodeId> = None;
        for child in children {
            let Some(NodeKind::Text { content }) = self.get(child).map(|n| &n.kind) else {
                run_head = None;
                continue;
            };
            let piece = content.clone();
            match run_head {
                Some(head) => {
                    if let Some(NodeKind::Text { content }) =
                        self.node_mut(head).map(|n| &mut n.kind)
                    {
                        content.push_str(&piece);
                    }
                    self.unlink_child(child);
                }
                None => run_head = Some(child),
            }
        }
        let empties: Vec<NodeId> = self
            .children(parent)
            .filter(|&c| {
                matches!(
                    self.get(c).map(|n| &n.kind),
                    Some(NodeKind::Text { content }) if content.is_empty()
                )
            })
            .collect();
        for empty in empties {
            self.unlink_child(empty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let b = doc.create_element("b");
        let t1 = doc.create_text("Hello, ");
        let t2 = doc.create_text("world");
        let c = doc.create_comment("ignored");
        let cd = doc.create_cdata("!");
        doc.append_children(p, &[t1, b, c, cd]).unwrap();
        doc.append_child(b, t2).unwrap();
        assert_eq!(doc.text_content(p), "Hello, world!");
        assert_eq!(doc.text_content(c), "ignored");
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let b = doc.create_element("b");
        doc.append_child(p, b).unwrap();
        doc.set_text_content(p, "plain").unwrap();
        assert_eq!(doc.child_count(p), 1);
        assert_eq!(doc.text_content(p), "plain");
        assert!(doc.is_unlinked(b));

        doc.set_text_content(p, "").unwrap();
        assert_eq!(doc.child_count(p), 0);

        let pi = doc.create_processing_instruction("target", None);
        doc.set_text_content(pi, "data").unwrap();
        assert_eq!(doc.node_text(pi), Some("data"));
        assert!(doc.set_text_content(doc.root(), "x").is_err());
    }

    #[test]
    fn test_normalize_merges_and_drops() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        let empty = doc.create_text("");
        let br = doc.create_element("br");
        let c = doc.create_text("c");
        doc.append_children(p, &[a, b, empty, br, c]).unwrap();

        doc.normalize(p).unwrap();
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, br, c]);
        assert_eq!(doc.node_text(a), Some("ab"));
        assert!(doc.is_unlinked(b));
        assert!(doc.is_unlinked(empty));
    }
}
