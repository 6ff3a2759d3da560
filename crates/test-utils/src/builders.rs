use domwatch::{Document, NodeId, Result};

/// Builder for element subtrees to simplify test setup.
///
/// ```ignore
/// let card = ElementBuilder::new("div")
///     .id("card")
///     .class("ready")
///     .child(ElementBuilder::new("span").text("hi"))
///     .build(&doc)?;
/// ```
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ElementBuilder>,
    text: Option<String>,
}

impl ElementBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Add a class; may be called several times.
    pub fn class(mut self, class: &str) -> Self {
        match self.attributes.iter_mut().find(|(k, _)| k == "class") {
            Some((_, value)) => {
                value.push(' ');
                value.push_str(class);
            }
            None => self.attributes.push(("class".to_string(), class.to_string())),
        }
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Create the subtree detached from the document.
    pub fn build(&self, doc: &Document) -> Result<NodeId> {
        let el = doc.create_element(&self.tag)?;
        for (name, value) in &self.attributes {
            doc.set_attribute(el, name, value)?;
        }
        if let Some(text) = &self.text {
            let node = doc.create_text_node(text)?;
            doc.append_child(el, node)?;
        }
        for child in &self.children {
            let child = child.build(doc)?;
            doc.append_child(el, child)?;
        }
        Ok(el)
    }

    /// Build the subtree and append it to `parent` in a single insertion.
    pub fn attach(&self, doc: &Document, parent: NodeId) -> Result<NodeId> {
        let el = self.build(doc)?;
        doc.append_child(parent, el)?;
        Ok(el)
    }
}
