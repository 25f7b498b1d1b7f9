//! Name resolution for KML elements.
//!
//! KML appears in the wild under several namespace URIs and, from some exporters,
//! with no namespace at all. Every lookup in the crate goes through a
//! [`Vocabulary`] picked once per document, so the rest of the code only deals in
//! local element names like `Placemark` or `coordinates`.

/// Namespace URIs tried in order before falling back to the bare vocabulary.
pub const KML_NAMESPACES: [&str; 4] = [
    "http://www.opengis.net/kml/2.2",
    "http://earth.google.com/kml/2.2",
    "http://earth.google.com/kml/2.1",
    "http://earth.google.com/kml/2.0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Namespaced(&'static str),
    Bare,
}

impl Vocabulary {
    /// All vocabularies in probe order: namespaced first, then bare.
    pub fn probe_order() -> impl Iterator<Item = Vocabulary> {
        KML_NAMESPACES
            .into_iter()
            .map(Vocabulary::Namespaced)
            .chain(std::iter::once(Vocabulary::Bare))
    }

    /// Pick the first vocabulary under which `root` holds at least one element named `local_name`.
    pub fn probe(root: roxmltree::Node, local_name: &str) -> Option<Vocabulary> {
        Self::probe_order().find(|vocabulary| {
            root.descendants()
                .any(|node| vocabulary.matches(&node, local_name))
        })
    }

    pub fn matches(&self, node: &roxmltree::Node, local_name: &str) -> bool {
        if !node.is_element() || node.tag_name().name() != local_name {
            return false;
        }
        match self {
            Vocabulary::Namespaced(namespace) => node.tag_name().namespace() == Some(*namespace),
            Vocabulary::Bare => node.tag_name().namespace().is_none(),
        }
    }
}

/// A parsed KML sub-tree, bound to the vocabulary of its document.
///
/// Only the queries the converter needs are exposed, so nothing outside the `kml`
/// module touches `roxmltree` directly.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a, 'input> {
    node: roxmltree::Node<'a, 'input>,
    vocabulary: Vocabulary,
}

impl<'a, 'input> Element<'a, 'input> {
    pub fn new(node: roxmltree::Node<'a, 'input>, vocabulary: Vocabulary) -> Self {
        Self { node, vocabulary }
    }

    /// Local name of the element, without namespace.
    pub fn local_name(&self) -> &'a str {
        self.node.tag_name().name()
    }

    /// First direct child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<Self> {
        self.children_named(local_name).next()
    }

    /// Direct children with the given local name, in document order.
    pub fn children_named<'n>(
        &self,
        local_name: &'n str,
    ) -> impl Iterator<Item = Element<'a, 'input>> + 'n
    where
        'a: 'n,
        'input: 'n,
    {
        let vocabulary = self.vocabulary;
        self.node
            .children()
            .filter(move |node| vocabulary.matches(node, local_name))
            .map(move |node| Element::new(node, vocabulary))
    }

    /// All element children belonging to the document's vocabulary.
    pub fn element_children(&self) -> impl Iterator<Item = Element<'a, 'input>> + 'a
    where
        'input: 'a,
    {
        let vocabulary = self.vocabulary;
        self.node
            .children()
            .filter(move |node| vocabulary.matches(node, node.tag_name().name()))
            .map(move |node| Element::new(node, vocabulary))
    }

    /// All descendants (including self) with the given local name, in document order.
    pub fn descendants_named<'n>(
        &self,
        local_name: &'n str,
    ) -> impl Iterator<Item = Element<'a, 'input>> + 'n
    where
        'a: 'n,
        'input: 'n,
    {
        let vocabulary = self.vocabulary;
        self.node
            .descendants()
            .filter(move |node| vocabulary.matches(node, local_name))
            .map(move |node| Element::new(node, vocabulary))
    }

    /// All descendant elements (including self) belonging to the document's vocabulary.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a, 'input>> + 'a
    where
        'input: 'a,
    {
        let vocabulary = self.vocabulary;
        self.node
            .descendants()
            .filter(move |node| vocabulary.matches(node, node.tag_name().name()))
            .map(move |node| Element::new(node, vocabulary))
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text(&self) -> String {
        self.node
            .descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect()
    }

    /// Text of the first child with the given local name.
    pub fn child_text(&self, local_name: &str) -> Option<String> {
        self.child(local_name).map(|child| child.text())
    }

    /// Markup content of the element.
    ///
    /// Text-only content (the usual CDATA-wrapped description) comes back decoded.
    /// When the element holds child elements, e.g. unescaped XHTML, each child's raw
    /// source is returned so the markup survives. Text children carrying a CDATA
    /// section are emitted decoded instead.
    pub fn inner_markup(&self) -> String {
        if !self.node.children().any(|child| child.is_element()) {
            return self.text();
        }
        let input = self.node.document().input_text();
        self.node
            .children()
            .map(|child| {
                let source = &input[child.range()];
                match child.text() {
                    Some(text) if child.is_text() && source.contains("<![CDATA[") => text,
                    _ => source,
                }
            })
            .collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node.attribute(name)
    }
}
