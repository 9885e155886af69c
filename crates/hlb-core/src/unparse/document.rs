// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A small document tree for printing HLB source.
//!
//! Printers build [`Document`] values and render them in one pass, so no
//! function tracks indentation by hand. HLB's canonical layout is fixed (one
//! statement per line, blocks indented by [`INDENT`]), so there is no width
//! fitting: every [`Document::Line`] is a hard newline.
//!
//! # Example
//!
//! ```
//! use hlb_core::unparse::document::{line, nest};
//! use hlb_core::docvec;
//!
//! let doc = docvec!["state a {", nest(4, docvec![line(), "scratch"]), line(), "}"];
//! assert_eq!(doc.to_pretty_string(), "state a {\n    scratch\n}");
//! ```

/// Indentation width of one block level.
pub const INDENT: usize = 4;

/// A printable document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document<'a> {
    /// A borrowed string.
    Str(&'a str),
    /// An owned string.
    String(String),
    /// A newline; the next text starts at the current indentation.
    Line,
    /// Indents everything inside by the given width.
    Nest(usize, Box<Document<'a>>),
    /// A sequence of documents.
    Vec(Vec<Document<'a>>),
    /// Nothing.
    Nil,
}

/// Conversion into a [`Document`], used by [`docvec!`](crate::docvec).
pub trait Documentable<'a> {
    fn to_doc(self) -> Document<'a>;
}

impl<'a> Documentable<'a> for &'a str {
    fn to_doc(self) -> Document<'a> {
        Document::Str(self)
    }
}

impl<'a> Documentable<'a> for String {
    fn to_doc(self) -> Document<'a> {
        Document::String(self)
    }
}

impl<'a> Documentable<'a> for Document<'a> {
    fn to_doc(self) -> Document<'a> {
        self
    }
}

impl<'a> Documentable<'a> for Vec<Document<'a>> {
    fn to_doc(self) -> Document<'a> {
        Document::Vec(self)
    }
}

/// Concatenates documents, converting each with [`Documentable`].
///
/// ```
/// use hlb_core::docvec;
///
/// assert_eq!(docvec!["env ", "\"A\"", " ", "\"b\""].to_pretty_string(), "env \"A\" \"b\"");
/// ```
#[macro_export]
macro_rules! docvec {
    () => {
        $crate::unparse::document::Document::Vec(Vec::new())
    };

    ($first:expr $(,)?) => {
        $crate::unparse::document::Document::Vec(
            vec![$crate::unparse::document::Documentable::to_doc($first)]
        )
    };

    ($first:expr, $($rest:expr),+ $(,)?) => {
        match $crate::unparse::document::Documentable::to_doc($first) {
            $crate::unparse::document::Document::Vec(mut vec) => {
                $(
                    vec.push($crate::unparse::document::Documentable::to_doc($rest));
                )*
                $crate::unparse::document::Document::Vec(vec)
            },
            first => {
                $crate::unparse::document::Document::Vec(
                    vec![first, $($crate::unparse::document::Documentable::to_doc($rest)),+]
                )
            }
        }
    };
}

/// A hard newline.
#[must_use]
pub fn line() -> Document<'static> {
    Document::Line
}

/// The empty document.
#[must_use]
pub fn nil() -> Document<'static> {
    Document::Nil
}

/// Indents `doc` by `indent` columns after each of its newlines.
#[must_use]
pub fn nest(indent: usize, doc: Document<'_>) -> Document<'_> {
    Document::Nest(indent, Box::new(doc))
}

/// Joins documents with `separator` between each pair.
#[must_use]
pub fn join<'a>(
    docs: impl IntoIterator<Item = Document<'a>>,
    separator: &Document<'a>,
) -> Document<'a> {
    let mut result = Vec::new();
    for doc in docs {
        if !result.is_empty() {
            result.push(separator.clone());
        }
        result.push(doc);
    }
    if result.is_empty() {
        Document::Nil
    } else {
        Document::Vec(result)
    }
}

// --- Rendering ---

/// Output plus the indentation owed by the last newline.
///
/// Indentation is written lazily so blank lines carry no trailing spaces.
struct Renderer {
    output: String,
    pending_indent: Option<usize>,
}

impl Renderer {
    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(indent) = self.pending_indent.take() {
            self.output.extend(std::iter::repeat_n(' ', indent));
        }
        self.output.push_str(text);
    }

    fn render(&mut self, doc: &Document<'_>, indent: usize) {
        match doc {
            Document::Str(s) => self.text(s),
            Document::String(s) => self.text(s),
            Document::Nil => {}
            Document::Line => {
                self.output.push('\n');
                self.pending_indent = Some(indent);
            }
            Document::Nest(extra, inner) => self.render(inner, indent + extra),
            Document::Vec(docs) => {
                for doc in docs {
                    self.render(doc, indent);
                }
            }
        }
    }
}

impl Document<'_> {
    /// Renders the document to a string.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut renderer = Renderer {
            output: String::new(),
            pending_indent: None,
        };
        renderer.render(self, 0);
        renderer.output
    }
}
