//! Style transforms backed by lightningcss.

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap as PrinterMap;

use super::sourcemap::origins_by_line;
use super::{Mapped, Stage};

/// Adds vendor prefixes for the configured browsers, keeping the output readable.
pub struct Autoprefix {
    targets: Option<Browsers>,
}

impl Autoprefix {
    pub const fn new(targets: Option<Browsers>) -> Self {
        Self { targets }
    }
}

impl Stage for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, input: String) -> Result<String> {
        process_css(&input, self.targets, false, false).map(|out| out.content)
    }

    fn apply_mapped(&self, input: String) -> Result<Mapped> {
        process_css(&input, self.targets, false, true)
    }
}

/// Prefixes and minifies in one pass (production builds).
pub struct MinifyCss {
    targets: Option<Browsers>,
}

impl MinifyCss {
    pub const fn new(targets: Option<Browsers>) -> Self {
        Self { targets }
    }
}

impl Stage for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, input: String) -> Result<String> {
        process_css(&input, self.targets, true, false).map(|out| out.content)
    }

    fn apply_mapped(&self, input: String) -> Result<Mapped> {
        process_css(&input, self.targets, true, true)
    }
}

/// With `mapped`, the printer records where each output line's first
/// token came from.
fn process_css(source: &str, browsers: Option<Browsers>, minify: bool, mapped: bool) -> Result<Mapped> {
    let targets = Targets {
        browsers,
        ..Targets::default()
    };

    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| anyhow!("{e}"))?;
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;

    let mut map = mapped.then(|| PrinterMap::new("/"));
    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets,
            source_map: map.as_mut(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;

    let origins = map.map(|map| {
        let pairs = map
            .get_mappings()
            .into_iter()
            .filter_map(|m| m.original.map(|o| (m.generated_line, o.original_line)));
        origins_by_line(&result.code, pairs)
    });
    Ok(Mapped { content: result.code, origins })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_safari() -> Option<Browsers> {
        Some(Browsers {
            safari: Some(8 << 16),
            ..Browsers::default()
        })
    }

    #[test]
    fn test_autoprefix_adds_prefixes() {
        let out = Autoprefix::new(old_safari())
            .apply(".a { user-select: none; }".into())
            .unwrap();
        assert!(out.contains("-webkit-user-select"));
        assert!(out.contains('\n'));
    }

    #[test]
    fn test_autoprefix_reports_line_origins() {
        let input = ".a {\n  color: red;\n}\n.b {\n  user-select: none;\n}";
        let out = Autoprefix::new(old_safari()).apply_mapped(input.into()).unwrap();
        let origins = out.origins.unwrap();
        assert_eq!(origins.len(), out.content.split('\n').count());
        assert_eq!(origins[0], Some(0));

        let b = out.content.lines().position(|l| l.starts_with(".b")).unwrap();
        assert_eq!(origins[b], Some(3));
    }

    #[test]
    fn test_minify_css() {
        let out = MinifyCss::new(None)
            .apply(".a {\n  color: #ff0000;\n}\n\n.b { margin: 0px; }".into())
            .unwrap();
        assert_eq!(out, ".a{color:red}.b{margin:0}");
    }
}
