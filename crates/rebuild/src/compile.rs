//! High-level compile API.

use rebuild_ast::ast::Block;
use rebuild_ast::blocks::BlockLiteral;
use rebuild_ast::error::Diagnostics;
use rebuild_ast::instance::{Instances, ScopeStack};
use rebuild_ast::token::Token;
use rebuild_intrinsic::Registry;
use rebuild_parser::{grouping, parser, Context};
use tracing::debug;

/// Compiler configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Column width tabs expand to
    pub tab_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { tab_width: 8 }
    }
}

/// One in-memory source unit.
///
/// The front-end reads no files and writes no files; the caller brings
/// the content.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub content: String,
}

impl Source {
    /// Create a source unit.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Everything one compile produced.
#[derive(Debug)]
pub struct CompileOutput {
    /// The parsed file
    pub ast: Block,
    /// Arena of every declared function, variable, module and type
    pub instances: Instances,
    /// Scope chain after compile-time declarations ran
    pub scope: ScopeStack,
    /// All reported findings
    pub diagnostics: Diagnostics,
    /// Lines the `say` intrinsic printed while parsing
    pub output: Vec<String>,
}

/// The Rebuild front-end compiler.
pub struct Compiler {
    config: Config,
}

impl Compiler {
    /// Create a compiler.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scan and filter a source into its token stream.
    pub fn tokens(&self, source: &Source, diagnostics: &mut Diagnostics) -> Vec<Token> {
        rebuild_lexer::tokenize(&source.content, self.config.tab_width, diagnostics)
    }

    /// Group a source into its block tree.
    pub fn blocks(&self, source: &Source, diagnostics: &mut Diagnostics) -> BlockLiteral {
        let tokens = self.tokens(source, diagnostics);
        grouping::parse(&tokens, diagnostics)
    }

    /// Run the whole pipeline over one source.
    pub fn compile(&self, source: &Source) -> CompileOutput {
        debug!(source = %source.name, "compiling");
        let mut diagnostics = Diagnostics::new();

        let tokens = self.tokens(source, &mut diagnostics);
        let grouped = grouping::parse(&tokens, &mut diagnostics);

        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let registry = Registry::install(&mut instances, &mut scope);

        let ast = {
            let mut context =
                Context::new(&mut instances, &mut scope, &mut diagnostics, &registry);
            parser::parse(&grouped, &mut context)
        };

        debug!(
            nodes = ast.nodes.len(),
            findings = diagnostics.len(),
            "compile finished"
        );
        CompileOutput {
            ast,
            instances,
            scope,
            diagnostics,
            output: registry.take_output(),
        }
    }
}

/// Render an AST block as pretty JSON.
pub fn serialize_ast(block: &Block) -> serde_json::Result<String> {
    serde_json::to_string_pretty(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_produces_an_ast_and_no_findings_for_clean_input() {
        let compiler = Compiler::new(Config::default());
        let output = compiler.compile(&Source::new("t", "42"));
        assert_eq!(output.ast.nodes.len(), 1);
        assert!(output.diagnostics.is_empty());
        assert!(output.output.is_empty());
    }

    #[test]
    fn serialize_ast_is_stable_json() {
        let compiler = Compiler::new(Config::default());
        let output = compiler.compile(&Source::new("t", "\"hi\""));
        let json = serialize_ast(&output.ast).unwrap();
        assert!(json.contains("\"String\""));
        assert!(json.contains("hi"));
    }
}
