//! Reader and writer for the subset of the gettext PO format catalogs use:
//! a header entry, `msgctxt`/`msgid`/`msgstr` and `#~` obsolete entries.
//! Comments and flags are accepted and dropped. Plural forms are rejected.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use super::{Catalog, CatalogEntry};
use crate::error::CatalogError;

fn keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(msgctxt|msgid_plural|msgid|msgstr(?:\[\d+\])?)\s+(".*")\s*$"#)
            .expect("keyword pattern is valid")
    })
}

pub fn render(catalog: &Catalog) -> String {
    let mut out = String::new();

    out.push_str("msgid \"\"\nmsgstr \"\"\n");
    for (key, value) in &catalog.metadata {
        let _ = writeln!(out, "\"{}\"", escape(&format!("{key}: {value}\n")));
    }

    for entry in &catalog.entries {
        let prefix = if entry.obsolete { "#~ " } else { "" };
        out.push('\n');
        if let Some(ctx) = &entry.msgctxt {
            let _ = writeln!(out, "{prefix}msgctxt \"{}\"", escape(ctx));
        }
        let _ = writeln!(out, "{prefix}msgid \"{}\"", escape(&entry.msgid));
        let _ = writeln!(out, "{prefix}msgstr \"{}\"", escape(&entry.msgstr));
    }

    out
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Ctxt,
    Id,
    Str,
}

#[derive(Default)]
struct Pending {
    line: usize,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgstr: Option<String>,
    obsolete: bool,
    field: Option<Field>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.msgctxt.is_none() && self.msgid.is_none() && self.msgstr.is_none()
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Ctxt => &mut self.msgctxt,
            Field::Id => &mut self.msgid,
            Field::Str => &mut self.msgstr,
        }
    }
}

pub fn parse(text: &str) -> Result<Catalog, CatalogError> {
    let mut entries = Vec::new();
    let mut pending = Pending::default();

    for (i, raw) in text.lines().enumerate() {
        let ln = i + 1;
        let mut line = raw.trim();

        let obsolete = line.starts_with("#~");
        if obsolete {
            line = line[2..].trim_start();
        } else if line.starts_with('#') {
            continue;
        }

        if line.is_empty() {
            if !obsolete {
                flush(&mut pending, &mut entries)?;
            }
            continue;
        }

        if line.starts_with('"') {
            let field = pending.field.ok_or_else(|| syntax(ln, "continuation line without a keyword"))?;
            let more = unquote(line, ln)?;
            if let Some(s) = pending.slot(field).as_mut() {
                s.push_str(&more);
            }
            continue;
        }

        let caps = keyword_re()
            .captures(line)
            .ok_or_else(|| syntax(ln, format!("unexpected line {line:?}")))?;
        let value = unquote(&caps[2], ln)?;

        let field = match &caps[1] {
            "msgctxt" => Field::Ctxt,
            "msgid" => Field::Id,
            "msgstr" => Field::Str,
            _ => return Err(syntax(ln, "plural forms are not supported")),
        };

        // A new msgctxt or msgid after a complete entry starts the next one.
        if field != Field::Str && pending.msgstr.is_some() {
            flush(&mut pending, &mut entries)?;
        }
        if pending.is_empty() {
            pending.line = ln;
        }
        if field == Field::Str && pending.msgid.is_none() {
            return Err(syntax(ln, "msgstr before msgid"));
        }

        let slot = pending.slot(field);
        if slot.is_some() {
            return Err(syntax(ln, format!("duplicate {}", &caps[1])));
        }
        *slot = Some(value);
        pending.field = Some(field);
        pending.obsolete |= obsolete;
    }
    flush(&mut pending, &mut entries)?;

    let mut catalog = Catalog::default();
    let mut entries = entries.into_iter().peekable();

    if let Some(first) = entries.peek() {
        if first.msgid.is_empty() && first.msgctxt.is_none() && !first.obsolete {
            for line in first.msgstr.lines() {
                if let Some((key, value)) = line.split_once(':') {
                    catalog
                        .metadata
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
            }
            entries.next();
        }
    }

    catalog.entries = entries.collect();
    Ok(catalog)
}

fn flush(pending: &mut Pending, entries: &mut Vec<CatalogEntry>) -> Result<(), CatalogError> {
    let done = std::mem::take(pending);
    if done.is_empty() {
        return Ok(());
    }

    match (done.msgid, done.msgstr) {
        (Some(msgid), Some(msgstr)) => {
            entries.push(CatalogEntry {
                msgctxt: done.msgctxt,
                msgid,
                msgstr,
                obsolete: done.obsolete,
            });
            Ok(())
        }
        _ => Err(syntax(done.line, "incomplete entry")),
    }
}

fn syntax(line: usize, message: impl Into<String>) -> CatalogError {
    CatalogError::Syntax {
        line,
        message: message.into(),
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn unquote(s: &str, ln: usize) -> Result<String, CatalogError> {
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| syntax(ln, "string is not quoted"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => return Err(syntax(ln, format!("unknown escape \\{other}"))),
                None => return Err(syntax(ln, "dangling backslash")),
            },
            '"' => return Err(syntax(ln, "unescaped quote")),
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TRANSLATION_ID_HEADER;
    use pretty_assertions::assert_eq;

    fn sample() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.metadata.insert("MIME-Version".into(), "1.0".into());
        catalog.metadata.insert(
            TRANSLATION_ID_HEADER.into(),
            "0b0c9c4e-4d0b-4c7e-9a8b-2f1e0d3c4b5a".into(),
        );
        catalog.entries = vec![
            CatalogEntry::new("k:title", "Hello", "Bonjour"),
            CatalogEntry::new("k:body", "Say \"hi\"\n\tto\\all", ""),
            CatalogEntry::new("k:old", "Bye", "Au revoir").obsolete(),
        ];
        catalog
    }

    #[test]
    fn render_then_parse_keeps_everything() {
        let catalog = sample();
        let text = render(&catalog);
        assert!(text.contains("#~ msgid \"Bye\""));
        assert_eq!(parse(&text).unwrap(), catalog);
    }

    #[test]
    fn reads_continuations_and_ignores_comments() {
        let text = r#"# translator comment
msgid ""
msgstr ""
"Content-Type: text/plain; charset=utf-8\n"
"MIME-Version: 1.0\n"

#. extracted
#, fuzzy
msgctxt "k:title"
msgid ""
"Hello "
"world"
msgstr "Bonjour "
"le monde"
msgid "no context"
msgstr ""
"#;
        let catalog = parse(text).unwrap();
        assert_eq!(catalog.metadata["MIME-Version"], "1.0");
        assert_eq!(catalog.metadata["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(
            catalog.entries,
            vec![
                CatalogEntry::new("k:title", "Hello world", "Bonjour le monde"),
                CatalogEntry {
                    msgctxt: None,
                    msgid: "no context".into(),
                    msgstr: String::new(),
                    obsolete: false,
                },
            ]
        );
    }

    #[test]
    fn syntax_errors_carry_the_line() {
        let cases = [
            ("msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[0] \"x\"\n", 2),
            ("msgid \"a\"\n\nmsgstr \"x\"\n", 1),
            ("msgid \"a\nmsgstr \"x\"\n", 1),
            ("\"orphan\"\n", 1),
            ("msgid \"a\" junk\n", 1),
            ("msgid \"\\q\"\nmsgstr \"\"\n", 1),
        ];
        for (text, line) in cases {
            match parse(text) {
                Err(CatalogError::Syntax { line: got, .. }) => assert_eq!(got, line, "{text:?}"),
                other => panic!("{text:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn empty_input_is_an_empty_catalog() {
        assert_eq!(parse("").unwrap(), Catalog::default());
    }
}
