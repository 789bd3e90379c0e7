//! Include resolution across type definition files.
//!
//! `@include` dependencies are walked depth-first and returned in post-order,
//! so every file appears after the files it depends on and the entry file
//! comes last. The caller-owned `visited` set persists across entry files,
//! letting a dependency shared by several compilation entries be parsed and
//! checked exactly once.

use std::fs;
use std::path::Path;

use fxhash::FxHashSet;

use crate::files::{FileId, Files};
use crate::reporting::Message;
use crate::source::ByteRange;
use crate::surface::{lexer, parser, Item};

/// A parsed source file, ready for type checking.
pub struct SourceFile {
    pub file_id: FileId,
    /// Canonical identity of the file on disk, used for cycle and
    /// already-visited bookkeeping.
    pub path: String,
    /// Include paths exactly as written in the source, for the generated
    /// `#include` lines.
    pub includes: Vec<String>,
    pub items: Vec<Item>,
}

/// A stable identity for a file path. Canonicalization collapses the
/// different spellings a diamond dependency can be reached through; if the
/// file does not exist yet the textual path stands in so the read error is
/// still reported against something sensible.
pub fn path_key(path: &Path) -> String {
    match fs::canonicalize(path) {
        Ok(canonical) => canonical.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Resolve `entry` and everything it transitively includes.
///
/// Include paths are joined onto `root` exactly as written in the source.
/// Returns the dependency-ordered file list, or every diagnostic produced by
/// the first file that failed to open, tokenize, or parse.
pub fn resolve(
    files: &mut Files,
    visited: &mut FxHashSet<String>,
    root: &Path,
    entry: &Path,
) -> Result<Vec<SourceFile>, Vec<Message>> {
    let mut resolver = Resolver {
        files,
        visited,
        root,
        resolving: FxHashSet::default(),
        resolved: Vec::new(),
    };

    resolver.visit(entry, None)?;
    Ok(resolver.resolved)
}

struct Resolver<'a> {
    files: &'a mut Files,
    visited: &'a mut FxHashSet<String>,
    root: &'a Path,
    /// Files on the current depth-first path, for cycle detection.
    resolving: FxHashSet<String>,
    resolved: Vec<SourceFile>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, path: &Path, included_from: Option<ByteRange>) -> Result<(), Vec<Message>> {
        let key = path_key(path);

        if self.resolving.contains(&key) {
            // A cycle can only close over an include, never over the entry
            // itself, so the include site is always known here.
            let range =
                included_from.expect("the resolving set is empty when the entry is first visited");
            return Err(vec![Message::CycleDetected {
                path: path.display().to_string(),
                range,
            }]);
        }
        if self.visited.contains(&key) {
            return Ok(());
        }

        let file = self.open(path)?;
        self.resolving.insert(key.clone());

        let mut includes = Vec::new();
        let mut items = Vec::with_capacity(file.items.len());
        for item in file.items {
            match item {
                Item::Include(include) => {
                    let dep = self.root.join(&include.path);
                    self.visit(&dep, Some(include.range))?;
                    includes.push(include.path);
                }
                item => items.push(item),
            }
        }

        self.resolving.remove(&key);
        self.visited.insert(key.clone());
        self.resolved.push(SourceFile {
            file_id: file.file_id,
            path: key,
            includes,
            items,
        });

        Ok(())
    }

    /// Read, tokenize, and parse one file. Tokenizer diagnostics suppress
    /// parsing, so the parser never runs over a token stream with holes in
    /// it.
    fn open(&mut self, path: &Path) -> Result<OpenFile, Vec<Message>> {
        let display_path = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|error| {
            vec![Message::ReadFile {
                path: display_path.clone(),
                error: error.to_string(),
            }]
        })?;

        let file_id = self.files.add(display_path, source);
        let source = self.files.source(file_id);

        let (tokens, messages) = lexer::tokens(file_id, source);
        if !messages.is_empty() {
            return Err(messages);
        }

        let (items, messages) = parser::parse(file_id, source.len(), &tokens);
        if !messages.is_empty() {
            return Err(messages);
        }

        Ok(OpenFile { file_id, items })
    }
}

struct OpenFile {
    file_id: FileId,
    items: Vec<Item>,
}
