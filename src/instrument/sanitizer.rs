//! Argument sanitization: sensitive and null arguments are dropped, scalars
//! and strings keep their literal value, everything else is reduced to its
//! type name.

use std::panic::{self, AssertUnwindSafe};

use super::inspect::Inspect;
use super::sensitivity::SensitivityDescriptor;

/// Converts raw call arguments into a printable, redacted sequence.
pub struct ArgumentSanitizer;

impl ArgumentSanitizer {
    /// Sanitize `args` according to `sensitivity`.
    ///
    /// Output order follows input order with dropped positions omitted. A
    /// descriptor whose length does not match `args` is ignored.
    ///
    /// Never panics. An argument whose `Inspect` impl panics is shown by its
    /// type tag, or as [`UNPRINTABLE`] if that panics too; the other
    /// arguments are unaffected.
    pub fn sanitize(args: &[&dyn Inspect], sensitivity: &SensitivityDescriptor) -> Vec<String> {
        let flags = sensitivity.aligned(args.len());

        args.iter()
            .enumerate()
            .filter(|(i, arg)| {
                let sensitive = flags.map(|f| f[*i]).unwrap_or(false);
                !sensitive && !guarded(|| arg.is_null()).unwrap_or(false)
            })
            .map(|(_, arg)| render_argument(*arg))
            .collect()
    }
}

/// Placeholder for an argument that cannot even report its type name.
pub const UNPRINTABLE: &str = "<unprintable>";

fn render_argument(arg: &dyn Inspect) -> String {
    if let Some(Some(literal)) = guarded(|| arg.literal()) {
        return literal;
    }
    guarded(|| arg.type_tag()).unwrap_or_else(|| UNPRINTABLE.to_string())
}

fn guarded<R>(f: impl FnOnce() -> R) -> Option<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).ok()
}

/// Join sanitized arguments into the `(a, b, c)` form used in log messages.
pub fn format_args_list(args: &[String]) -> String {
    format!("({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        #[allow(dead_code)]
        number: String,
    }
    impl Inspect for Account {}

    #[test]
    fn test_sensitive_argument_is_omitted() {
        let amount = 100;
        let account = "secret-123";
        let args: [&dyn Inspect; 2] = [&amount, &account];
        let desc = SensitivityDescriptor::new(vec![false, true]);

        let out = ArgumentSanitizer::sanitize(&args, &desc);
        assert_eq!(out, vec!["100".to_string()]);
    }

    #[test]
    fn test_null_argument_is_omitted() {
        let first: Option<&str> = None;
        let second = 5u8;
        let args: [&dyn Inspect; 2] = [&first, &second];

        let out = ArgumentSanitizer::sanitize(&args, &SensitivityDescriptor::none());
        assert_eq!(out, vec!["5".to_string()]);
    }

    #[test]
    fn test_structured_argument_shows_type_name_only() {
        let account = Account {
            number: "DE00-1234".to_string(),
        };
        let args: [&dyn Inspect; 1] = [&account];

        let out = ArgumentSanitizer::sanitize(&args, &SensitivityDescriptor::none());
        assert_eq!(out, vec!["Account".to_string()]);
    }

    #[test]
    fn test_mismatched_descriptor_fails_open() {
        let a = "visible";
        let b = 3i64;
        let args: [&dyn Inspect; 2] = [&a, &b];
        let desc = SensitivityDescriptor::new(vec![true]);

        let out = ArgumentSanitizer::sanitize(&args, &desc);
        assert_eq!(out, vec!["visible".to_string(), "3".to_string()]);
    }

    struct Flaky;
    impl Inspect for Flaky {
        fn literal(&self) -> Option<String> {
            panic!("literal unavailable");
        }
    }

    struct Broken;
    impl Inspect for Broken {
        fn type_tag(&self) -> String {
            panic!("no name");
        }

        fn literal(&self) -> Option<String> {
            panic!("no literal");
        }
    }

    #[test]
    fn test_panicking_argument_degrades_alone() {
        let before = 7u8;
        let after = "tail";
        let args: [&dyn Inspect; 3] = [&before, &Flaky, &after];

        let out = ArgumentSanitizer::sanitize(&args, &SensitivityDescriptor::none());
        assert_eq!(out, vec!["7".to_string(), "Flaky".to_string(), "tail".to_string()]);
    }

    #[test]
    fn test_argument_without_type_tag_is_unprintable() {
        let args: [&dyn Inspect; 2] = [&Broken, &1i32];
        let out = ArgumentSanitizer::sanitize(&args, &SensitivityDescriptor::none());
        assert_eq!(out, vec![UNPRINTABLE.to_string(), "1".to_string()]);
    }

    #[test]
    fn test_empty_arguments() {
        let out = ArgumentSanitizer::sanitize(&[], &SensitivityDescriptor::none());
        assert!(out.is_empty());
        assert_eq!(format_args_list(&out), "()");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let x = 1.25f32;
        let y = 'q';
        let args: [&dyn Inspect; 2] = [&x, &y];
        let desc = SensitivityDescriptor::new(vec![false, false]);

        let first = ArgumentSanitizer::sanitize(&args, &desc);
        let second = ArgumentSanitizer::sanitize(&args, &desc);
        assert_eq!(first, second);
        assert_eq!(format_args_list(&first), "(1.25, q)");
    }
}
