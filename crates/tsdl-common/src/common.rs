//! Shared option enums.

/// Emission language level. Lowering targets `ES3`/`ES5`; `ES2015` subtrees
/// flagged by the classifier only need rewriting below this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ScriptTarget {
    ES3,
    #[default]
    ES5,
    ES2015,
}

/// Module output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleKind {
    #[default]
    None,
    CommonJS,
    AMD,
    UMD,
    System,
    ES2015,
}

/// Options supplied by the host compiler for one transformation run.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
    pub module: ModuleKind,
}

impl CompilerOptions {
    pub fn language_version(&self) -> ScriptTarget {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_es5() {
        let options = CompilerOptions::default();
        assert_eq!(options.language_version(), ScriptTarget::ES5);
        assert_eq!(options.module, ModuleKind::None);
    }

    #[test]
    fn script_targets_are_ordered() {
        assert!(ScriptTarget::ES3 < ScriptTarget::ES5);
        assert!(ScriptTarget::ES5 < ScriptTarget::ES2015);
    }
}
