//! Rebuild Run - compiles one source file and reports what it found.
//!
//! The binary reads a file, runs the front-end pipeline, prints whatever
//! compile-time `say` calls produced, renders diagnostics with source
//! snippets, and exits non-zero when any finding has error severity.

use clap::Parser;
use rebuild::ast::error::{DiagnosticFormatter, Diagnostics};
use rebuild::ast::foundation::SourceFile;
use rebuild::{Compiler, Config, Source};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rebuild-run")]
#[command(about = "Compile a Rebuild source file")]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// Column width tabs expand to
    #[arg(long, default_value = "8")]
    tab_width: u32,

    /// Print the filtered token stream as JSON
    #[arg(long)]
    emit_tokens: bool,

    /// Print the grouped block tree as JSON
    #[arg(long)]
    emit_blocks: bool,

    /// Print the AST as JSON
    #[arg(long)]
    emit_ast: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rebuild_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let content = match std::fs::read_to_string(&cli.file) {
        Ok(content) => content,
        Err(err) => {
            error!("cannot read {}: {}", cli.file.display(), err);
            std::process::exit(1);
        }
    };

    let source = Source::new(cli.file.display().to_string(), content);
    let compiler = Compiler::new(Config {
        tab_width: cli.tab_width,
    });

    if cli.emit_tokens {
        let mut scratch = Diagnostics::new();
        let tokens = compiler.tokens(&source, &mut scratch);
        print_json(&tokens);
    }
    if cli.emit_blocks {
        let mut scratch = Diagnostics::new();
        let blocks = compiler.blocks(&source, &mut scratch);
        print_json(&blocks);
    }

    let output = compiler.compile(&source);

    for line in &output.output {
        println!("{}", line);
    }
    if cli.emit_ast {
        match rebuild::serialize_ast(&output.ast) {
            Ok(json) => println!("{}", json),
            Err(err) => error!("cannot serialize the AST: {}", err),
        }
    }

    if !output.diagnostics.is_empty() {
        let file = SourceFile::new(source.name.clone(), source.content.clone());
        let formatter = DiagnosticFormatter::new(&file);
        eprint!("{}", formatter.format_all(&output.diagnostics));
    }

    if output.diagnostics.has_errors() {
        std::process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => error!("cannot serialize: {}", err),
    }
}
