//! Base-href injection
//!
//! Bundles reference their assets with ordinary relative paths
//! (`./style.css`, `img/logo.png`). The page is served from `/<id>` while the
//! assets live under the relay, so a `<base>` element is made the first child
//! of `<head>` and relative resolution is left to the browser. Nothing else in
//! the document is touched.

/// Elements whose content is text, not markup
const RAW_TEXT: [&str; 9] = [
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Start,
    End,
    Doctype,
}

/// One tag found by [`TagScanner`]; `end` is the offset just past its `>`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    kind: TagKind,
    name: String,
    end: usize,
}

/// Walks the tags of a document the way a browser tokenizer sees them
///
/// Comments, bogus comments, quoted attribute values and the content of
/// raw-text elements never produce tags.
struct TagScanner<'a> {
    /// ASCII-lowercased copy; byte offsets match the source
    lower: String,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TagScanner<'a> {
    fn new(document: &'a str) -> Self {
        Self {
            lower: document.to_ascii_lowercase(),
            bytes: document.as_bytes(),
            pos: 0,
        }
    }

    fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        self.lower.get(from..)?.find(needle).map(|i| from + i)
    }

    /// Offset just past the `>` closing a tag that starts at `from`
    fn tag_end(&self, from: usize) -> Option<usize> {
        let mut quote = None;
        let mut after_equals = false;
        for (offset, &b) in self.bytes.get(from..)?.iter().enumerate() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'>' => return Some(from + offset + 1),
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => {
                    after_equals = true;
                    continue;
                }
                b if b.is_ascii_whitespace() => continue,
                _ => {}
            }
            after_equals = false;
        }
        None
    }

    fn name_at(&self, from: usize) -> &str {
        let rest = &self.lower[from..];
        let len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        &rest[..len]
    }
}

impl Iterator for TagScanner<'_> {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        loop {
            let start = self.find_from(self.pos, "<")?;
            let rest = &self.lower[start..];

            if rest.starts_with("<!--") {
                // `<!-->` and `<!--->` close immediately
                self.pos = self.find_from(start + 2, "-->")? + 3;
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = self.find_from(start, ">")? + 1;
                self.pos = end;
                if rest.starts_with("<!doctype") {
                    return Some(Tag {
                        kind: TagKind::Doctype,
                        name: "!doctype".to_string(),
                        end,
                    });
                }
                continue;
            }

            let (kind, name_start) = if rest.starts_with("</") {
                (TagKind::End, start + 2)
            } else {
                (TagKind::Start, start + 1)
            };
            if !self
                .bytes
                .get(name_start)
                .is_some_and(u8::is_ascii_alphabetic)
            {
                // A lone `<` is text
                self.pos = start + 1;
                continue;
            }

            let name = self.name_at(name_start).to_string();
            let end = self.tag_end(name_start)?;
            self.pos = end;

            if kind == TagKind::Start && RAW_TEXT.contains(&name.as_str()) {
                let close = format!("</{name}");
                self.pos = self.find_from(end, &close).unwrap_or(self.bytes.len());
            }
            return Some(Tag { kind, name, end });
        }
    }
}

/// Build the `<base>` element for an href
pub fn base_element(href: &str) -> String {
    format!(
        r#"<base href="{}">"#,
        html_escape::encode_double_quoted_attribute(href)
    )
}

/// Insert `<base href=…>` as the first child of the document head.
///
/// Only a real start tag counts: `<head>` written inside a comment, an
/// attribute value or a script is text. A document without a `<head>` gets
/// one: inside `<html>` when there is one, otherwise right after the doctype
/// or at the very start.
pub fn inject_base_href(document: &str, href: &str) -> String {
    let base = base_element(href);
    let mut html_end = None;
    let mut doctype_end = None;

    for tag in TagScanner::new(document) {
        match (tag.kind, tag.name.as_str()) {
            (TagKind::Start, "head") => return splice(document, tag.end, &base),
            (TagKind::Start, "html") => {
                html_end.get_or_insert(tag.end);
            }
            (TagKind::Doctype, _) => {
                doctype_end.get_or_insert(tag.end);
            }
            _ => {}
        }
    }

    let head = format!("<head>{base}</head>");
    let at = html_end.or(doctype_end).unwrap_or(0);
    splice(document, at, &head)
}

fn splice(document: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(document.len() + insert.len());
    out.push_str(&document[..at]);
    out.push_str(insert);
    out.push_str(&document[at..]);
    out
}
