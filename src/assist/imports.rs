use std::fmt;

use tracing::debug;

use super::token::TokenKind;
use crate::language::java::lexer::{self, is_ident_part, is_ident_start};

/// A normalized import: dotted name without the `import`/`;` wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    pub name: String,
    pub is_static: bool,
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "import static {};", self.name)
        } else {
            write!(f, "import {};", self.name)
        }
    }
}

impl ImportName {
    fn is_wildcard(&self) -> bool {
        self.name.ends_with(".*")
    }

    /// Whether an existing import already brings this one into scope.
    fn covered_by(&self, existing: &ImportName) -> bool {
        if self.is_static != existing.is_static {
            return false;
        }
        self.name == existing.name || wildcard_covers(&existing.name, &self.name)
    }
}

/// Parses `raw` into an import name, accepting `import x.y.Z;`,
/// `import static x.Y.z;`, `x.y.Z` and `x.y.*`. `None` when the text is not
/// a qualified Java name.
pub fn normalize_import(raw: &str) -> Option<ImportName> {
    let s = raw.trim();
    let s = strip_keyword(s, "import").unwrap_or(s);
    let s = s.trim_end_matches(';').trim_end();
    let (is_static, s) = match strip_keyword(s, "static") {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let segments: Vec<&str> = s.split('.').map(str::trim).collect();
    let (last, pkg) = segments.split_last()?;
    let valid = pkg.iter().all(|seg| is_identifier(seg)) && (is_identifier(last) || *last == "*");
    // a static import names a member of a type
    if !valid || (is_static && pkg.is_empty()) || (pkg.is_empty() && *last == "*") {
        return None;
    }
    Some(ImportName {
        name: segments.join("."),
        is_static,
    })
}

fn strip_keyword<'s>(s: &'s str, keyword: &str) -> Option<&'s str> {
    s.strip_prefix(keyword)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_part)
}

/// "org.foo.*" covers "org.foo.Bar" but not "org.foo.sub.Bar"
fn wildcard_covers(wildcard: &str, name: &str) -> bool {
    let Some(pkg) = wildcard.strip_suffix(".*") else {
        return false;
    };
    match name.strip_prefix(pkg) {
        Some(rest) => rest.starts_with('.') && !rest[1..].contains('.'),
        None => false,
    }
}

/// Types directly under `java.lang` are always in scope.
fn is_java_lang(name: &str) -> bool {
    name.strip_prefix("java.lang.")
        .is_some_and(|rest| !rest.contains('.'))
}

/// A `package` or `import` statement of the file header.
#[derive(Debug, Clone, Copy)]
struct HeaderStatement<'s> {
    text: &'s str,
    /// Insertion point after the statement: the end of its line, or right
    /// after the `;` when code follows on the same line.
    anchor: usize,
    terminated: bool,
}

#[derive(Debug, Default)]
struct Header<'s> {
    package: Option<HeaderStatement<'s>>,
    imports: Vec<HeaderStatement<'s>>,
}

impl Header<'_> {
    fn import_names(&self) -> Vec<ImportName> {
        self.imports
            .iter()
            .filter_map(|s| normalize_import(s.text))
            .collect()
    }
}

/// Package and import statements up to the first type declaration.
///
/// Works on the token stream, so `import` inside a comment or a text block
/// never counts. A statement that does not close with `;` ends the header.
fn header(source: &str) -> Header<'_> {
    let tokens = lexer::tokenize(source);
    let mut code = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Whitespace && !t.kind.is_comment());
    let mut header = Header::default();

    while let Some(first) = code.next() {
        let keyword = &source[first.start..first.end];
        if first.kind != TokenKind::Keyword || !matches!(keyword, "package" | "import") {
            break;
        }
        let mut semi_end = None;
        for t in code.by_ref() {
            match (t.kind, &source[t.start..t.end]) {
                (_, ";") => {
                    semi_end = Some(t.end);
                    break;
                }
                (TokenKind::Identifier, _)
                | (TokenKind::Operator, "." | "*")
                | (TokenKind::Keyword, "static") => {}
                _ => break,
            }
        }
        let Some(semi_end) = semi_end else {
            break;
        };

        let rest = &source[semi_end..];
        let line_rest = rest.find('\n').map_or(rest, |i| &rest[..i]);
        let trailing = line_rest.trim();
        let (anchor, terminated) = if trailing.is_empty() || trailing.starts_with("//") {
            match rest.find('\n') {
                Some(i) => (semi_end + i + 1, true),
                None => (source.len(), false),
            }
        } else {
            (semi_end, false)
        };

        let statement = HeaderStatement {
            text: &source[first.start..semi_end],
            anchor,
            terminated,
        };
        if keyword == "import" {
            header.imports.push(statement);
        } else if header.package.is_none() {
            header.package = Some(statement);
        }
    }
    header
}

/// Existing imports of `source`, in file order.
pub fn existing_imports(source: &str) -> Vec<ImportName> {
    header(source).import_names()
}

fn package_name<'s>(statement: &HeaderStatement<'s>) -> Option<&'s str> {
    statement
        .text
        .strip_prefix("package")
        .map(|rest| rest.trim_end_matches(';').trim())
}

/// Whether `import` has to be added to a file with these imports and package.
fn is_needed(import: &ImportName, existing: &[ImportName], package: Option<&str>) -> bool {
    if !import.name.contains('.') {
        return false;
    }
    if !import.is_static && is_java_lang(&import.name) {
        return false;
    }
    if existing.iter().any(|e| import.covered_by(e)) {
        return false;
    }
    if !import.is_static
        && !import.is_wildcard()
        && let Some(pkg) = package
        && import.name.rsplit_once('.').is_some_and(|(p, _)| p == pkg)
    {
        return false;
    }
    true
}

/// A single insertion that adds every missing import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdit {
    pub offset: usize,
    pub text: String,
}

/// Computes the edit that appends the missing `imports` to `source`.
///
/// Imports already present, covered by a wildcard or implicit are skipped,
/// as are malformed entries. New imports go after the last import of the
/// header, else after the package statement, else at the top of the file.
pub fn import_edit(source: &str, imports: &[String]) -> Option<ImportEdit> {
    let header = header(source);
    let existing = header.import_names();
    let package = header.package.as_ref().and_then(package_name);

    let mut added: Vec<ImportName> = Vec::new();
    for raw in imports {
        let Some(import) = normalize_import(raw) else {
            debug!(import = %raw, "skipping malformed import");
            continue;
        };
        if is_needed(&import, &existing, package) && !added.iter().any(|a| import.covered_by(a)) {
            added.push(import);
        }
    }
    if added.is_empty() {
        return None;
    }
    let block: String = added.iter().map(|i| format!("{i}\n")).collect();

    let edit = match (header.imports.last(), header.package) {
        (Some(last), _) => ImportEdit {
            offset: last.anchor,
            text: if last.terminated {
                block
            } else {
                format!("\n{block}")
            },
        },
        (None, Some(package)) => ImportEdit {
            offset: package.anchor,
            text: if package.terminated {
                format!("\n{block}")
            } else {
                format!("\n\n{block}")
            },
        },
        (None, None) if source.is_empty() => ImportEdit {
            offset: 0,
            text: block,
        },
        (None, None) => ImportEdit {
            offset: 0,
            text: format!("{block}\n"),
        },
    };
    debug!(count = added.len(), offset = edit.offset, "merging imports");
    Some(edit)
}

/// Applies [`import_edit`] to a copy of `source`.
pub fn merge(source: &str, imports: &[String]) -> String {
    let mut out = source.to_string();
    if let Some(edit) = import_edit(source, imports) {
        out.insert_str(edit.offset, &edit.text);
    }
    out
}
