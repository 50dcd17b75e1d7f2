use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::{CycleOffset, Error};

/// Location of a node: a cycle offset followed by the dotted names
/// of the node within that cycle's tree.
/// A path with no names is the root of a cycle (the suite itself).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    offset: CycleOffset,
    names: Arc<[Arc<str>]>,
}

impl Path {
    pub fn new<I, S>(offset: CycleOffset, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            offset,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Root of the cycle at `offset`.
    pub fn root(offset: CycleOffset) -> Self {
        Self {
            offset,
            names: Arc::from(Vec::new()),
        }
    }

    /// Parse a dotted path like "fam.task" in the current cycle.
    pub fn dotted(path: &str) -> Self {
        Self::dotted_at(CycleOffset::zero(), path)
    }

    /// Parse a dotted path like "fam.task" in the cycle at `offset`.
    pub fn dotted_at(offset: CycleOffset, path: &str) -> Self {
        Self::new(offset, path.split('.').filter(|s| !s.is_empty()))
    }

    #[inline]
    pub fn offset(&self) -> CycleOffset {
        self.offset
    }

    #[inline]
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// Last name in the path, or None for a cycle root.
    pub fn name(&self) -> Option<&str> {
        self.names.last().map(|s| &**s)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of names below the cycle root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            offset: self.offset,
            names: self.names[..self.names.len() - 1].into(),
        })
    }

    pub fn child(&self, name: &str) -> Self {
        let mut names = Vec::with_capacity(self.names.len() + 1);
        names.extend(self.names.iter().cloned());
        names.push(Arc::from(name));
        Self {
            offset: self.offset,
            names: names.into(),
        }
    }

    /// Same names, different cycle.
    pub fn with_offset(&self, offset: CycleOffset) -> Self {
        Self {
            offset,
            names: self.names.clone(),
        }
    }

    /// Move this path `dt` further from the current cycle.
    #[inline]
    pub fn shift(&self, dt: CycleOffset) -> Self {
        self.with_offset(self.offset + dt)
    }

    /// True if `self` is `other` or lies below it in the same cycle.
    pub fn starts_with(&self, other: &Path) -> bool {
        self.offset == other.offset && self.names.starts_with(&other.names)
    }
}

/// Renders "fam.task", with a trailing "@offset" for other cycles.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<suite>")?;
        }
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        if !self.offset.is_zero() {
            write!(f, "@{}", self.offset)?;
        }
        Ok(())
    }
}

/// Express `dest` relative to `start`, both absolute lists of names.
/// Siblings become "./name", paths with nothing in common stay absolute,
/// anything else climbs with "../" from `start`'s family.
pub fn relative_path<S: AsRef<str>, T: AsRef<str>>(start: &[S], dest: &[T]) -> Result<String, Error> {
    if start.is_empty() {
        return Err(Error::EmptyRelativePath("start"));
    }
    if dest.is_empty() {
        return Err(Error::EmptyRelativePath("destination"));
    }
    let common = start
        .iter()
        .zip(dest)
        .take_while(|(s, d)| s.as_ref() == d.as_ref())
        .count();
    let last = dest[dest.len() - 1].as_ref();

    if start.len() == dest.len() && common + 1 >= start.len() {
        // sibling, or the node itself:
        return Ok(format!("./{last}"));
    }
    if common == 0 {
        return Ok(format!("/{}", join(dest, "/")));
    }
    let ups = start.len().saturating_sub(common + 1);
    let rest = join(&dest[common..], "/");
    if ups == 0 {
        Ok(format!("./{rest}"))
    } else {
        Ok(format!("{}{rest}", "../".repeat(ups)))
    }
}

fn join<S: AsRef<str>>(items: &[S], sep: &str) -> String {
    let mut buf = String::with_capacity(items.len() * 8);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_str(sep);
        }
        buf.push_str(item.as_ref());
    }
    buf
}

/// A [`Path`] whose offset has been replaced by a concrete cycle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Cycle name followed by the node names.
    pub components: Vec<String>,
    /// True if the path pointed at a cycle other than `now`'s,
    /// so it lives in a different suite definition.
    pub crosses_cycle: bool,
}

/// Replace the offset of `path` with the name of the cycle at `now + offset`,
/// formatted with the strftime-style `format`.
pub fn resolve_offset(now: NaiveDateTime, format: &str, path: &Path) -> Result<ResolvedPath, Error> {
    let then = now
        .checked_add_signed(path.offset().duration())
        .ok_or(Error::OffsetOutOfRange {
            cycle: now,
            offset: path.offset(),
        })?;
    let mut components = Vec::with_capacity(path.depth() + 1);
    components.push(then.format(format).to_string());
    components.extend(path.names().iter().map(|s| s.to_string()));
    Ok(ResolvedPath {
        components,
        crosses_cycle: !path.offset().is_zero(),
    })
}
