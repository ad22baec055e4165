//! An in-memory view of an SVG document's elements.
//!
//! We don't need a full DOM: just every element's name, attributes, and
//! parent, in document order. That's enough to select shapes, scope them to
//! layers, and find layer transforms.

use std::collections::BTreeMap;

use svg::{node::element::tag::Type, parser::Event};

use crate::Error;

/// The attribute that names a layer group, unless told otherwise.
pub const DEFAULT_LAYER_ATTRIBUTE: &str = "inkscape:label";

/// Layer groups are `g` elements with this attribute...
pub const LAYER_MODE_ATTRIBUTE: &str = "inkscape:groupmode";
/// ...set to this value.
pub const LAYER_MODE: &str = "layer";

/// An index into a [`Document`]'s elements.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ElementIdx(pub usize);

impl std::fmt::Debug for ElementIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e_{}", self.0)
    }
}

/// A single XML element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    parent: Option<ElementIdx>,
}

impl Element {
    /// The element name, without any namespace prefix (so `svg:path` is `path`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an attribute by its full name (including any prefix, like
    /// `inkscape:label`).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes, ordered by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The enclosing element, if there is one.
    pub fn parent(&self) -> Option<ElementIdx> {
        self.parent
    }
}

/// A layer, identified by the value of a naming attribute on a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layer<'a> {
    /// The naming attribute, usually [`DEFAULT_LAYER_ATTRIBUTE`].
    pub attribute: &'a str,
    /// The layer's name.
    pub name: &'a str,
}

/// A parsed document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    elements: Vec<Element>,
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl Document {
    /// Parses a document from its source text.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut elements = Vec::new();
        let mut open: Vec<ElementIdx> = Vec::new();

        for event in svg::read(source)? {
            match event {
                Event::Error(e) => return Err(Error::Xml(e)),
                Event::Tag(name, kind, attributes) => {
                    if let Type::End = kind {
                        open.pop();
                        continue;
                    }
                    let idx = ElementIdx(elements.len());
                    elements.push(Element {
                        name: local_name(name).to_owned(),
                        attributes: attributes
                            .iter()
                            .map(|(k, v)| (k.clone(), v.to_string()))
                            .collect(),
                        parent: open.last().copied(),
                    });
                    if let Type::Start = kind {
                        open.push(idx);
                    }
                }
                _ => {}
            }
        }

        Ok(Document { elements })
    }

    /// Reads and parses a document from a file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// All elements, in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Iterates over the ancestors of `idx`, innermost first.
    pub fn ancestors(&self, idx: ElementIdx) -> impl Iterator<Item = &Element> + '_ {
        std::iter::successors(self[idx].parent.map(|p| &self[p]), |el| {
            el.parent.map(|p| &self[p])
        })
    }

    /// Is the element at `idx` inside a group belonging to `layer`?
    pub fn in_layer(&self, idx: ElementIdx, layer: Layer<'_>) -> bool {
        self.ancestors(idx)
            .any(|el| el.name == "g" && el.attribute(layer.attribute) == Some(layer.name))
    }

    /// Iterates over the elements whose names are in `names`, in document order.
    ///
    /// If `layer` is given, only elements inside that layer are returned.
    pub fn select<'a, S: AsRef<str>>(
        &'a self,
        names: &'a [S],
        layer: Option<Layer<'a>>,
    ) -> impl Iterator<Item = (ElementIdx, &'a Element)> + 'a {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, el)| (ElementIdx(i), el))
            .filter(move |(idx, el)| {
                names.iter().any(|n| n.as_ref() == el.name)
                    && layer.is_none_or(|layer| self.in_layer(*idx, layer))
            })
    }

    /// Finds the transform shared by all layers.
    ///
    /// Layers are `g` elements marked with `inkscape:groupmode="layer"`. A
    /// transform can only be shared if at most one layer declares one: if none
    /// do, this returns `None`, and if several do it fails with
    /// [`Error::ConflictingTransform`].
    pub fn layer_transform(&self) -> Result<Option<&str>, Error> {
        let transforms: Vec<&str> = self
            .elements
            .iter()
            .filter(|el| el.name == "g" && el.attribute(LAYER_MODE_ATTRIBUTE) == Some(LAYER_MODE))
            .filter_map(|el| el.attribute("transform"))
            .collect();

        match transforms.as_slice() {
            [] => Ok(None),
            [t] => Ok(Some(t)),
            _ => Err(Error::ConflictingTransform {
                count: transforms.len(),
            }),
        }
    }
}

impl std::ops::Index<ElementIdx> for Document {
    type Output = Element;

    fn index(&self, index: ElementIdx) -> &Self::Output {
        &self.elements[index.0]
    }
}

/// Which elements to turn into shapes, and how.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Names of the elements to select. Elements other than `path` and
    /// `polygon` are skipped with a warning.
    pub elements: Vec<String>,
    /// If set, only select elements inside the layer with this name.
    pub layer: Option<String>,
    /// The attribute that names layer groups.
    pub layer_attribute: String,
    /// Fail on path data that isn't in the grammar, instead of skipping it.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            elements: vec!["path".to_owned(), "polygon".to_owned()],
            layer: None,
            layer_attribute: DEFAULT_LAYER_ATTRIBUTE.to_owned(),
            strict: false,
        }
    }
}

impl ParseOptions {
    /// Restricts selection to a single layer.
    pub fn in_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// The layer to scope selection to, if any.
    pub fn layer(&self) -> Option<Layer<'_>> {
        self.layer.as_deref().map(|name| Layer {
            attribute: &self.layer_attribute,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const LAYERED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
  <!-- two layers -->
  <g inkscape:groupmode="layer" inkscape:label="Device" transform="translate(1,2)">
    <g>
      <path id="a" d="M 0,0 L 1,0 L 1,1 Z"/>
    </g>
    <polygon id="b" points="0,0 1,0 1,1"/>
  </g>
  <g inkscape:groupmode="layer" inkscape:label="Connections">
    <svg:path id="c" d="M 0,0 L 5,5"/>
    <line id="d" x1="0" y1="0" x2="1" y2="1"/>
  </g>
</svg>
"#;

    #[test]
    fn elements_and_parents() {
        let doc = Document::parse(LAYERED).unwrap();
        let names: Vec<_> = doc.elements().iter().map(Element::name).collect();
        assert_eq!(
            names,
            ["svg", "g", "g", "path", "polygon", "g", "path", "line"]
        );
        assert_eq!(doc.elements()[0].parent(), None);
        assert_eq!(doc.elements()[3].parent(), Some(ElementIdx(2)));
        assert_eq!(doc.elements()[4].parent(), Some(ElementIdx(1)));
        assert_eq!(doc.elements()[3].attribute("id"), Some("a"));
        assert_eq!(doc.ancestors(ElementIdx(3)).count(), 3);
    }

    #[test]
    fn selection_by_layer() {
        let doc = Document::parse(LAYERED).unwrap();
        let shapes = ["path", "polygon"];
        let ids = |layer| {
            doc.select(&shapes, layer)
                .map(|(_, el)| el.attribute("id").unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(None), ["a", "b", "c"]);
        let device = Layer {
            attribute: DEFAULT_LAYER_ATTRIBUTE,
            name: "Device",
        };
        assert_eq!(ids(Some(device)), ["a", "b"]);
        let connections = Layer {
            name: "Connections",
            ..device
        };
        assert_eq!(ids(Some(connections)), ["c"]);
    }

    #[test]
    fn shared_transform() {
        let doc = Document::parse(LAYERED).unwrap();
        assert_eq!(doc.layer_transform().unwrap(), Some("translate(1,2)"));

        let conflicting = LAYERED.replace(
            r#"inkscape:label="Connections""#,
            r#"inkscape:label="Connections" transform="scale(2)""#,
        );
        let doc = Document::parse(&conflicting).unwrap();
        assert_matches!(
            doc.layer_transform(),
            Err(Error::ConflictingTransform { count: 2 })
        );

        let doc = Document::parse(r#"<svg><g inkscape:groupmode="layer"/></svg>"#).unwrap();
        assert_eq!(doc.layer_transform().unwrap(), None);
    }

    #[test]
    fn options() {
        let opts = ParseOptions::default().in_layer("Device");
        assert_eq!(
            opts.layer(),
            Some(Layer {
                attribute: "inkscape:label",
                name: "Device"
            })
        );
        assert_eq!(ParseOptions::default().layer(), None);

        let opts: ParseOptions = serde_yaml::from_str("layer: Device\nstrict: true").unwrap();
        assert_eq!(opts.elements, ["path", "polygon"]);
        assert!(opts.strict);
    }
}
