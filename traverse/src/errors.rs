use colored::Colorize;

use workflow::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} failed due to {1} errors")]
    AggregatedErrors(String, usize),
}

/// Configuration errors found while processing a whole cycle,
/// reported together so the user can fix them in one pass.
#[derive(Debug)]
pub struct Errors {
    errors: Vec<anyhow::Error>,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            // usually stays empty:
            errors: Vec::with_capacity(0),
        }
    }
}

impl Errors {
    /// Add an error raised while handling the node at `path`.
    pub fn add_for(&mut self, path: &Path, e: anyhow::Error) {
        log::trace!("{}: {e:?}", path.to_string().cyan());
        self.errors.push(e.context(format!("In {path}")));
    }

    pub fn add(&mut self, e: anyhow::Error) {
        log::trace!("error: {e:?}");
        self.errors.push(e);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print every error to stderr, then fail with an aggregated error
    /// if there were any.
    pub fn print_recap(&self, label: &str) -> Result<(), Error> {
        if self.errors.is_empty() {
            return Ok(());
        }
        eprintln!("\nEncountered errors while {label}:\n");
        for e in &self.errors {
            eprintln!("{}: {e:#}\n", "ERROR".red());
        }
        Err(Error::AggregatedErrors(label.to_owned(), self.errors.len()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recap() {
        let mut errors = Errors::default();
        assert!(errors.print_recap("checking nothing").is_ok());

        errors.add_for(&Path::dotted("fam.a"), anyhow::anyhow!("bad trigger"));
        errors.add(anyhow::anyhow!("bad clock"));
        assert_eq!(errors.len(), 2);
        let Err(Error::AggregatedErrors(label, n)) = errors.print_recap("checking") else {
            panic!("expected an aggregated error");
        };
        assert_eq!((label.as_str(), n), ("checking", 2));
    }
}
