use crate::options::FormatOptions;

/// Mode holds the configuration of a command line run: how to format, and
/// what to do with the result.
#[derive(Debug, Clone, Default)]
pub struct Mode {
    pub format: FormatOptions,

    /// Report files that would change without writing them.
    pub check: bool,

    /// Print a diff for files that would change.
    pub diff: bool,

    /// Skip the safety equivalence check.
    pub fast: bool,

    /// Glob patterns matched against file and directory names.
    pub exclude: Vec<String>,

    pub verbose: bool,

    pub quiet: bool,
}

impl Mode {
    /// Whether safety check should be performed.
    pub fn should_safety_check(&self) -> bool {
        !self.fast && !self.check && !self.diff
    }

    /// Options used for each file, with the safety check folded in.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            safety_check: self.should_safety_check() || self.format.safety_check,
            ..self.format.clone()
        }
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "ddl", "dml"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        let mode = Mode::default();
        assert!(!mode.check);
        assert!(!mode.diff);
        assert!(!mode.fast);
        assert!(!mode.format.reindent);
    }

    #[test]
    fn test_safety_check() {
        let mut mode = Mode::default();
        assert!(mode.should_safety_check());
        assert!(mode.format_options().safety_check);

        mode.fast = true;
        assert!(!mode.should_safety_check());
        assert!(!mode.format_options().safety_check);

        mode.fast = false;
        mode.check = true;
        assert!(!mode.should_safety_check());
    }
}
