//! Immutable build options resolved once from CLI flags.

/// Options threaded through every task and pipeline.
///
/// Built once at start-up from `--prod` and `--sm`; never mutated.
/// `--debug` only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Production build: minify styles and scripts.
    pub prod: bool,
    /// Emit source maps.
    pub source_maps: bool,
    /// Push rebuilt styles over the live channel instead of reloading.
    pub inject_styles: bool,
}

impl BuildOptions {
    /// Fold CLI flags into options.
    ///
    /// Source maps are on when forced with `--sm`, or in development builds
    /// when the project enables them (`[pipeline] source_maps`).
    pub const fn resolve(prod: bool, force_maps: bool, dev_maps: bool) -> Self {
        Self {
            prod,
            source_maps: force_maps || (!prod && dev_maps),
            inject_styles: !prod,
        }
    }

    /// Mode name, exposed to compilers as `$STITCH_MODE`.
    #[inline]
    pub const fn mode(&self) -> &'static str {
        if self.prod { "prod" } else { "dev" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_defaults() {
        let opts = BuildOptions::resolve(false, false, true);
        assert!(opts.source_maps);
        assert!(opts.inject_styles);
        assert_eq!(opts.mode(), "dev");
    }

    #[test]
    fn test_prod_disables_maps_and_injection() {
        let opts = BuildOptions::resolve(true, false, true);
        assert!(!opts.source_maps);
        assert!(!opts.inject_styles);
        assert_eq!(opts.mode(), "prod");
    }

    #[test]
    fn test_sm_forces_maps_in_prod() {
        let opts = BuildOptions::resolve(true, true, false);
        assert!(opts.source_maps);
    }

    #[test]
    fn test_dev_maps_can_be_disabled() {
        let opts = BuildOptions::resolve(false, false, false);
        assert!(!opts.source_maps);
        assert!(opts.inject_styles);
    }
}
