//! End-to-end compiles through the driver against scratch directories.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use codespan_reporting::term::termcolor::{ColorSpec, WriteColor};

use typegen::{Driver, Status};

/// A clonable diagnostic sink the test can read back after handing one
/// clone to the driver.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteColor for SharedBuffer {
    fn supports_color(&self) -> bool {
        false
    }

    fn set_color(&mut self, _spec: &ColorSpec) -> io::Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A per-test scratch directory, removed on drop.
struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Scratch {
        let root = std::env::temp_dir().join(format!("typegen-{}-{}", std::process::id(), name));
        fs::create_dir_all(&root).unwrap();
        Scratch { root }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn driver_with_buffer() -> (Driver, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let mut driver = Driver::new();
    driver.set_diagnostic_writer(buffer.clone());
    (driver, buffer)
}

#[test]
fn compiles_a_fixed_struct_end_to_end() {
    let scratch = Scratch::new("point");
    let entry = scratch.file("point", "struct Point { x: i16; y: i16; }\n");
    let (mut driver, buffer) = driver_with_buffer();

    let status = driver.compile(&entry, &scratch.root, &scratch.path("point"));
    assert_eq!(status.exit_code(), 0, "diagnostics: {}", buffer.contents());

    let header = fs::read_to_string(scratch.path("point.h")).unwrap();
    assert!(header.contains("#pragma once"));
    assert!(header.contains("struct Point {"));
    assert!(header.contains("const static size_t fixed_size = 4;"));
    assert!(header.contains("namespace PointFields {"));

    let source = fs::read_to_string(scratch.path("point.cc")).unwrap();
    assert!(source.contains("#include \"point.h\""));
    assert!(source.contains("obj.y = TRY(region.Read<int16_t>(offset + 2));"));
    assert!(source.contains("RETURN_IF_ERROR(region.Write<int16_t>(total_offset, obj.y));"));
}

#[test]
fn diamond_includes_are_resolved_once() {
    let scratch = Scratch::new("diamond");
    scratch.file("rect_types", "struct Rect { top: i16; left: i16; }\n");
    scratch.file(
        "window_types",
        "@include(\"rect_types\")\nstruct Window { bounds: Rect; }\n",
    );
    scratch.file(
        "dialog_types",
        "@include(\"rect_types\")\nstruct Dialog { bounds: Rect; }\n",
    );
    let entry = scratch.file(
        "ui_types",
        "@include(\"window_types\")\n@include(\"dialog_types\")\nstruct Screen { window: Window; dialog: Dialog; }\n",
    );

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&entry, &scratch.root, &scratch.path("ui_types"));
    // A second parse of rect_types would collide on `Rect`.
    assert_eq!(status.exit_code(), 0, "diagnostics: {}", buffer.contents());

    let header = fs::read_to_string(scratch.path("ui_types.h")).unwrap();
    assert!(header.contains("#include \"window_types.h\""));
    assert!(header.contains("#include \"dialog_types.h\""));
    assert!(!header.contains("#include \"rect_types.h\""));
}

#[test]
fn include_cycles_are_reported() {
    let scratch = Scratch::new("cycle");
    let entry = scratch.file("a_types", "@include(\"b_types\")\nstruct A { x: u8; }\n");
    scratch.file("b_types", "@include(\"c_types\")\nstruct B { x: u8; }\n");
    scratch.file("c_types", "@include(\"a_types\")\nstruct C { x: u8; }\n");

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&entry, &scratch.root, &scratch.path("a_types"));

    assert_eq!(status.exit_code(), 1);
    assert!(
        buffer.contents().contains("circular dependency"),
        "diagnostics: {}",
        buffer.contents()
    );
}

#[test]
fn diagnostics_suppress_artifacts() {
    let scratch = Scratch::new("gate");
    let entry = scratch.file("bad_types", "struct S { n: Nope; }\n");

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&entry, &scratch.root, &scratch.path("bad_types"));

    assert!(matches!(status, Status::Error));
    assert!(!scratch.path("bad_types.h").exists());
    assert!(!scratch.path("bad_types.cc").exists());
    assert!(
        buffer.contents().contains("unknown type `Nope`"),
        "diagnostics: {}",
        buffer.contents()
    );
}

#[test]
fn definitions_are_shared_across_entries() {
    let scratch = Scratch::new("shared");
    let shared = scratch.file("shared_types", "struct Rect { top: i16; left: i16; }\n");
    let window = scratch.file(
        "window_types",
        "@include(\"shared_types\")\nstruct Window { bounds: Rect; }\n",
    );

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&shared, &scratch.root, &scratch.path("shared_types"));
    assert_eq!(status.exit_code(), 0, "diagnostics: {}", buffer.contents());

    // shared_types is already checked; its definitions stay visible.
    let status = driver.compile(&window, &scratch.root, &scratch.path("window_types"));
    assert_eq!(status.exit_code(), 0, "diagnostics: {}", buffer.contents());

    let header = fs::read_to_string(scratch.path("window_types.h")).unwrap();
    assert!(header.contains("#include \"shared_types.h\""));
    assert!(header.contains("struct Window {"));
}

#[test]
fn recompiling_a_failing_entry_stays_an_error() {
    let scratch = Scratch::new("recheck");
    let entry = scratch.file("bad_types", "struct S { n: Nope; x: u16; }\n");
    let (mut driver, buffer) = driver_with_buffer();

    let status = driver.compile(&entry, &scratch.root, &scratch.path("bad_types"));
    assert_eq!(status.exit_code(), 1);

    // The entry is already in the visited set; its diagnostics must still
    // gate artifact generation on a second pass.
    let status = driver.compile(&entry, &scratch.root, &scratch.path("bad_types"));
    assert_eq!(status.exit_code(), 1);
    assert!(!scratch.path("bad_types.h").exists());
    assert!(!scratch.path("bad_types.cc").exists());
    assert!(
        buffer.contents().contains("unknown type `Nope`"),
        "diagnostics: {}",
        buffer.contents()
    );
}

#[test]
fn tainted_includes_gate_later_entries() {
    let scratch = Scratch::new("tainted");
    let shared = scratch.file("shared_bad", "struct Rect { top: i16; q: Nope; }\n");
    let window = scratch.file(
        "window_types",
        "@include(\"shared_bad\")\nstruct Window { bounds: Rect; }\n",
    );

    let (mut driver, _) = driver_with_buffer();
    let status = driver.compile(&shared, &scratch.root, &scratch.path("shared_bad"));
    assert_eq!(status.exit_code(), 1);

    // `Rect` was only partially checked; including it must not produce
    // artifacts built on the partial definition.
    let status = driver.compile(&window, &scratch.root, &scratch.path("window_types"));
    assert_eq!(status.exit_code(), 1);
    assert!(!scratch.path("window_types.h").exists());
}

#[test]
fn parse_errors_name_the_offending_file() {
    let scratch = Scratch::new("parse");
    let entry = scratch.file("broken_types", "type A B;\n");

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&entry, &scratch.root, &scratch.path("broken_types"));

    assert_eq!(status.exit_code(), 1);
    let diagnostics = buffer.contents();
    assert!(diagnostics.contains("expected"), "diagnostics: {diagnostics}");
    assert!(diagnostics.contains("broken_types"), "diagnostics: {diagnostics}");
}

#[test]
fn stray_slashes_suggest_a_comment() {
    let scratch = Scratch::new("slash");
    let entry = scratch.file("slash_types", "/ a note\nstruct S { x: u8; }\n");

    let (mut driver, buffer) = driver_with_buffer();
    let status = driver.compile(&entry, &scratch.root, &scratch.path("slash_types"));

    assert_eq!(status.exit_code(), 1);
    assert!(
        buffer.contents().contains("should this be `//` for a comment?"),
        "diagnostics: {}",
        buffer.contents()
    );
}

#[test]
fn missing_entries_are_read_errors() {
    let scratch = Scratch::new("missing");
    let (mut driver, buffer) = driver_with_buffer();

    let status = driver.compile(
        &scratch.path("no_such_file"),
        &scratch.root,
        &scratch.path("out"),
    );

    assert_eq!(status.exit_code(), 1);
    assert!(
        buffer.contents().contains("couldn't read"),
        "diagnostics: {}",
        buffer.contents()
    );
}
