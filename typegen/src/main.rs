use clap::Parser;
use std::path::PathBuf;

/// A compiler for declaratively specifying in-memory data structures
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Type definition files to compile
    #[clap(name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,
    /// Path to output the generated C++ code (without extensions)
    ///
    /// With a single input this is the artifact base path; with several it
    /// is a directory and each input's file stem names its artifact pair.
    #[clap(long = "output", short = 'o', name = "OUTPUT")]
    output: PathBuf,
    /// Directory that `@include` paths resolve against
    #[clap(long = "root", name = "ROOT", default_value = ".")]
    root: PathBuf,
}

fn main() -> ! {
    let cli = Cli::parse();
    let mut driver = typegen::Driver::new();

    let mut status = typegen::Status::Ok;
    for input in &cli.inputs {
        let output = match (cli.inputs.len() > 1, input.file_stem()) {
            (true, Some(stem)) => cli.output.join(stem),
            (true, None) | (false, _) => cli.output.clone(),
        };

        if let typegen::Status::Error = driver.compile(input, &cli.root, &output) {
            status = typegen::Status::Error;
        }
    }

    std::process::exit(status.exit_code());
}
