use std::cell::RefCell;
use std::fs;
use std::path::Path;

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use fxhash::{FxHashMap, FxHashSet};

use crate::core::{Module, SymbolTable};
use crate::files::{FileId, Files};
use crate::pass::core_to_cpp;
use crate::reporting::Message;
use crate::resolve;
use crate::surface::elaboration;

#[derive(Debug, Copy, Clone)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// A checked file together with the diagnostics its checking produced, kept
/// so a later entry that reaches the same file reports them again instead of
/// generating code from a partially checked module.
struct CheckedFile {
    module: Module,
    messages: Vec<Message>,
}

/// Drives compilation of one or more entry files.
///
/// The driver owns the state that outlives a single entry: the file
/// database, the global symbol table, and the set of already-checked files.
/// A dependency shared by several entries is resolved and checked once and
/// its definitions stay visible to every later entry.
pub struct Driver {
    files: Files,
    table: SymbolTable,
    visited: FxHashSet<String>,
    /// Checked files keyed by canonical path, so an entry that was already
    /// pulled in as somebody's include is not checked twice.
    modules: FxHashMap<String, CheckedFile>,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: Files::new(),
            table: SymbolTable::new(),
            visited: FxHashSet::default(),
            modules: FxHashMap::default(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                if atty::is(atty::Stream::Stderr) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),
        }
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Compile one entry file to `<output>.h` and `<output>.cc`.
    ///
    /// Include paths resolve relative to `root`. Nothing is written unless
    /// the entry and everything it includes check cleanly.
    pub fn compile(&mut self, entry: &Path, root: &Path, output: &Path) -> Status {
        *self.seen_errors.borrow_mut() = false;

        let files = match resolve::resolve(&mut self.files, &mut self.visited, root, entry) {
            Ok(files) => files,
            Err(messages) => {
                self.emit_messages(&messages);
                return Status::Error;
            }
        };

        let mut fresh = FxHashSet::default();
        for file in files {
            let (module, messages) = elaboration::check_module(&mut self.table, &file);
            self.emit_messages(&messages);
            fresh.insert(file.path.clone());
            self.modules.insert(file.path, CheckedFile { module, messages });
        }

        // Diagnostics from files checked under an earlier entry still gate
        // this one: their definitions never made it into the table cleanly.
        let entry_key = resolve::path_key(entry);
        let mut stack = vec![entry_key.clone()];
        let mut reachable = FxHashSet::default();
        while let Some(key) = stack.pop() {
            if !reachable.insert(key.clone()) {
                continue;
            }
            if let Some(checked) = self.modules.get(&key) {
                if !fresh.contains(&key) && !checked.messages.is_empty() {
                    self.emit_messages(&checked.messages);
                }
                for include in &checked.module.includes {
                    stack.push(resolve::path_key(&root.join(include)));
                }
            }
        }

        if *self.seen_errors.borrow() {
            return Status::Error;
        }

        let module = match self.modules.get(&entry_key) {
            Some(checked) => &checked.module,
            None => {
                // The resolver either returned the entry or reported why not.
                unreachable!("entry file resolved without errors but was not checked")
            }
        };
        let stem = match output.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => stem,
            None => {
                self.emit_diagnostic(
                    Diagnostic::error()
                        .with_message(format!("invalid output path `{}`", output.display())),
                );
                return Status::Error;
            }
        };

        let mut context = core_to_cpp::Context::new(&self.table, module);
        let mut header = Vec::new();
        let mut source = Vec::new();
        // Writing into memory buffers cannot fail.
        context.emit_header(&mut header, stem).unwrap();
        context.emit_source(&mut source, stem).unwrap();

        let messages = context.finish();
        if !messages.is_empty() {
            self.emit_messages(&messages);
            return Status::Error;
        }

        let header_path = output.with_extension("h");
        let source_path = output.with_extension("cc");
        for (path, contents) in [(header_path, header), (source_path, source)] {
            if let Err(error) = fs::write(&path, contents) {
                self.emit_diagnostic(Diagnostic::error().with_message(format!(
                    "couldn't write `{}`: {}",
                    path.display(),
                    error
                )));
                return Status::Error;
            }
        }

        Status::Ok
    }

    fn emit_messages(&self, messages: &[Message]) {
        for message in messages {
            self.emit_diagnostic(message.to_diagnostic());
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        *self.seen_errors.borrow_mut() = true;

        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;
        codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic).unwrap();
        writer.flush().unwrap();
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}
