//! Script transforms backed by oxc.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

use super::sourcemap::origins_from_json;
use super::{Mapped, Stage};

/// Lowers modern syntax to the configured ES target.
pub struct Transpile {
    target: String,
    /// Bundle file name, used in diagnostics.
    file: String,
}

impl Transpile {
    pub fn new(target: &str, file: &str) -> Self {
        Self {
            target: target.to_string(),
            file: file.to_string(),
        }
    }

    /// Code, plus the codegen map as JSON when `map` is set.
    fn run(&self, input: &str, map: bool) -> Result<(String, Option<String>)> {
        let options = TransformOptions::from_target(&self.target).map_err(|e| anyhow!("{e}"))?;

        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, input, SourceType::mjs()).parse();
        if !ret.errors.is_empty() {
            bail!(join_diagnostics(&ret.errors));
        }

        let mut program = ret.program;
        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, Path::new(&self.file), &options)
            .build_with_scoping(scoping, &mut program);
        if !ret.errors.is_empty() {
            bail!(join_diagnostics(&ret.errors));
        }

        let ret = Codegen::new()
            .with_options(CodegenOptions {
                source_map_path: map.then(|| PathBuf::from(&self.file)),
                ..CodegenOptions::default()
            })
            .build(&program);
        Ok((ret.code, ret.map.map(|m| m.to_json_string())))
    }
}

impl Stage for Transpile {
    fn name(&self) -> &'static str {
        "transpile"
    }

    fn apply(&self, input: String) -> Result<String> {
        self.run(&input, false).map(|(code, _)| code)
    }

    fn apply_mapped(&self, input: String) -> Result<Mapped> {
        let (content, map) = self.run(&input, true)?;
        let origins = map.and_then(|json| origins_from_json(&content, &json, &input));
        Ok(Mapped { content, origins })
    }
}

/// Compresses and mangles, including top-level names.
pub struct MinifyJs;

impl Stage for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, input: String) -> Result<String> {
        minify(&input, false).map(|(code, _)| code)
    }

    fn apply_mapped(&self, input: String) -> Result<Mapped> {
        let (content, map) = minify(&input, true)?;
        let origins = map.and_then(|json| origins_from_json(&content, &json, &input));
        Ok(Mapped { content, origins })
    }
}

fn minify(input: &str, map: bool) -> Result<(String, Option<String>)> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, input, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        bail!(join_diagnostics(&ret.errors));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(true),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    let ret = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            source_map_path: map.then(|| PathBuf::from("bundle.js")),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program);
    Ok((ret.code, ret.map.map(|m| m.to_json_string())))
}

fn join_diagnostics(errors: &[OxcDiagnostic]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpile_lowers_arrow_functions() {
        let out = Transpile::new("es5", "site.js")
            .apply("const add = (a, b) => a + b;".into())
            .unwrap();
        assert!(!out.contains("=>"));
        assert!(out.contains("function"));
    }

    #[test]
    fn test_transpile_esnext_keeps_syntax() {
        let out = Transpile::new("esnext", "site.js")
            .apply("const f = (x) => x ?? 1;".into())
            .unwrap();
        assert!(out.contains("??"));
    }

    #[test]
    fn test_syntax_error() {
        let err = Transpile::new("es2015", "site.js")
            .apply("function (".into())
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_transpile_reports_line_origins() {
        let input = "const a = 1;\nconst b = () => a;\n";
        let out = Transpile::new("es5", "site.js").apply_mapped(input.into()).unwrap();
        let origins = out.origins.unwrap();
        assert_eq!(origins.len(), out.content.split('\n').count());
        assert_eq!(origins[0], Some(0));
        assert!(origins.contains(&Some(1)));
    }

    #[test]
    fn test_minify_js_reports_line_origins() {
        let input = "var first = 1;\nvar second = 2;\nvar third = 3;\nconsole.log(first, second, third);\n";
        let out = MinifyJs.apply_mapped(input.into()).unwrap();
        let origins = out.origins.unwrap();
        assert_eq!(origins.len(), out.content.split('\n').count());
        assert!(origins[0].is_some_and(|line| line < 4));
    }

    #[test]
    fn test_minify_js() {
        let source = "function greet(name) {\n  return 'hello ' + name;\n}\ngreet('x');\n";
        let out = MinifyJs.apply(source.into()).unwrap();
        assert!(out.len() < source.len());
        assert!(out.contains("hello"));
        assert!(!out.contains("greet"));
    }
}
